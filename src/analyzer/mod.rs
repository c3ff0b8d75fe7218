//! # Analyzer
//!
//! Syntactic analysis: a preprocessed token stream in, a typed AST out.
//!
//! The analyzer is built on a small parser-combinator system rather than a
//! generated parser:
//!
//! * [`core`]: the [`Parser`](core::Parser) trait and error type
//! * [`combinators`]: generic building blocks (choice, repetition, tuples, ...)
//! * [`prelude`]: constructor functions for the combinators
//! * [`parsers`]: the grammar itself (expressions, statements, bot structure)
//! * [`validation`]: post-parse structural checks
//!
//! Parsing has no error recovery: the first unexpected token aborts with an
//! error naming the token and its source line.

pub mod combinators;
pub mod core;
pub mod parsers;
pub mod prelude;
pub mod validation;

use self::core::{ParseError, Parser};
use crate::ast::Program;
use crate::tokenizer::token::TokenSpan;

/// Parses a complete preprocessed token stream into a [`Program`], requiring
/// every token to be consumed.
pub fn parse_tokens(tokens: &[TokenSpan]) -> Result<Program, ParseError> {
    let (pos, program) = parsers::bot::parse_program().parse(tokens, 0)?;
    if pos < tokens.len() {
        return Err(ParseError::Unexpected {
            expected: "end of input".to_string(),
            found: tokens[pos].to_string(),
            position: pos,
            context: None,
        });
    }
    Ok(program)
}

/// Resolves a [`ParseError`] token position to a source line, when possible.
pub fn error_line(tokens: &[TokenSpan], error: &ParseError) -> Option<usize> {
    let pos = error.position()?;
    tokens
        .get(pos)
        .or_else(|| tokens.last())
        .map(|span| span.line)
}
