//! Core parser definitions: the [`Parser`] trait and [`ParseError`] type that
//! every combinator and grammar parser builds on.

use thiserror::Error;

/// A parser over a token slice. Takes the input and a position, returns the
/// new position and the parsed value, or an error.
pub trait Parser<I, O> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O>;
}

pub type ParseResult<O> = Result<(usize, O), ParseError>;

/// Parsing failure. `position` is a token index into the preprocessed stream;
/// the analyzer entry point resolves it to a source line for reporting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected end of input{}", fmt_context(.context))]
    UnexpectedEof { context: Option<String> },

    #[error("expected {expected}, found {found}{}", fmt_context(.context))]
    Unexpected {
        expected: String,
        found: String,
        position: usize,
        context: Option<String>,
    },

    #[error("no alternative matched{}", fmt_context(.context))]
    NoAlternative {
        position: usize,
        context: Option<String>,
    },

    #[error("{message}{}", fmt_context(.context))]
    Failure {
        message: String,
        position: usize,
        context: Option<String>,
    },
}

fn fmt_context(context: &Option<String>) -> String {
    match context {
        Some(ctx) => format!(" (while parsing {})", ctx),
        None => String::new(),
    }
}

impl ParseError {
    /// Appends an outer context label, keeping the innermost one first.
    pub fn with_context(self, ctx: &str) -> Self {
        let chain = |context: Option<String>| {
            Some(match context {
                Some(inner) => format!("{} in {}", inner, ctx),
                None => ctx.to_string(),
            })
        };
        match self {
            ParseError::UnexpectedEof { context } => ParseError::UnexpectedEof {
                context: chain(context),
            },
            ParseError::Unexpected {
                expected,
                found,
                position,
                context,
            } => ParseError::Unexpected {
                expected,
                found,
                position,
                context: chain(context),
            },
            ParseError::NoAlternative { position, context } => ParseError::NoAlternative {
                position,
                context: chain(context),
            },
            ParseError::Failure {
                message,
                position,
                context,
            } => ParseError::Failure {
                message,
                position,
                context: chain(context),
            },
        }
    }

    /// Token index the error occurred at, if known.
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::UnexpectedEof { .. } => None,
            ParseError::Unexpected { position, .. }
            | ParseError::NoAlternative { position, .. }
            | ParseError::Failure { position, .. } => Some(*position),
        }
    }
}
