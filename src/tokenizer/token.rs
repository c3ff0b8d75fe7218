use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    combinator::recognize,
    error::{VerboseError, VerboseErrorKind},
    sequence::pair,
    IResult,
};
use thiserror::Error;

use super::{
    comment::parse_comment,
    keyword::Keyword,
    literal::{parse_literal, Literal},
    symbol::{parse_delimiter, parse_operator, Delimiter, Operator},
    whitespace::{parse_newline, parse_whitespace},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    Identifier(String),
    Operator(Operator),
    Delimiter(Delimiter),
    Literal(Literal),
    // Formatting tokens, filtered out by the preprocessor
    Whitespace(String),
    Newline,
    Comment(String),
}

impl Token {
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace(_) | Token::Newline | Token::Comment(_)
        )
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Keyword(k) => write!(f, "{}", k),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Operator(op) => write!(f, "{}", op),
            Token::Delimiter(d) => write!(f, "{}", d),
            Token::Literal(lit) => write!(f, "{}", lit),
            Token::Whitespace(_) => write!(f, "<whitespace>"),
            Token::Newline => write!(f, "<newline>"),
            Token::Comment(_) => write!(f, "<comment>"),
        }
    }
}

/// A token plus its byte span and 1-based source position.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
    pub token: Token,
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for TokenSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' at line {}", self.token, self.line)
    }
}

#[derive(Debug, Clone)]
pub struct Tokenizer {
    current_position: usize,
    current_line: usize,
    current_column: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            current_position: 0,
            current_line: 1,
            current_column: 1,
        }
    }

    /// Tokenizes an entire source string. Whitespace, newlines and comments
    /// are emitted as tokens so the spans cover the input without gaps.
    #[tracing::instrument(level = "debug", skip(self, input))]
    pub fn tokenize(&mut self, input: &str) -> TokenizerResult<Vec<TokenSpan>> {
        let mut tokens = Vec::new();
        let mut remaining = input;

        while !remaining.is_empty() {
            let start_position = self.current_position;
            let start_line = self.current_line;
            let start_column = self.current_column;

            let result = alt((
                parse_whitespace,
                parse_newline,
                parse_comment,
                parse_literal,
                parse_operator,
                parse_delimiter,
                parse_word,
            ))(remaining);

            match result {
                Ok((new_remaining, token)) => {
                    let consumed = &remaining[..(remaining.len() - new_remaining.len())];
                    self.update_position(consumed);

                    tokens.push(TokenSpan {
                        token,
                        start: start_position,
                        end: self.current_position,
                        line: start_line,
                        column: start_column,
                    });

                    remaining = new_remaining;
                }
                Err(e) => {
                    let error = self.classify_error(remaining, e);
                    tracing::error!("{}", error);
                    return Err(error);
                }
            }
        }

        Ok(tokens)
    }

    fn update_position(&mut self, text: &str) {
        for c in text.chars() {
            self.current_position += c.len_utf8();
            if c == '\n' {
                self.current_line += 1;
                self.current_column = 1;
            } else {
                self.current_column += 1;
            }
        }
    }

    fn classify_error(
        &self,
        remaining: &str,
        error: nom::Err<VerboseError<&str>>,
    ) -> TokenizerError {
        let context = match &error {
            nom::Err::Error(e) | nom::Err::Failure(e) => e.errors.iter().find_map(|(_, kind)| {
                if let VerboseErrorKind::Context(ctx) = kind {
                    Some(*ctx)
                } else {
                    None
                }
            }),
            nom::Err::Incomplete(_) => None,
        };

        match context {
            Some("unterminated string") => TokenizerError::UnterminatedString {
                line: self.current_line,
            },
            Some("invalid escape sequence") => TokenizerError::InvalidEscape {
                line: self.current_line,
            },
            _ => TokenizerError::UnknownCharacter {
                character: remaining.chars().next().unwrap_or('\0'),
                line: self.current_line,
                column: self.current_column,
            },
        }
    }
}

/// Parses an identifier-shaped word: a keyword, a boolean/null literal, or a
/// plain identifier. Identifiers start with a Unicode letter or `_` and
/// continue with letters, digits and `_`, which admits CJK names.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_word(input: &str) -> ParserResult<Token> {
    let (rest, word) = recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)?;

    let token = match word {
        "true" => Token::Literal(Literal::Boolean(true)),
        "false" => Token::Literal(Literal::Boolean(false)),
        "null" => Token::Literal(Literal::Null),
        _ => match Keyword::from_str(word) {
            Ok(keyword) => Token::Keyword(keyword),
            Err(_) => Token::Identifier(word.to_string()),
        },
    };

    Ok((rest, token))
}

pub type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

pub type TokenizerResult<T> = Result<T, TokenizerError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenizerError {
    #[error("unknown character '{character}' at line {line}, column {column}")]
    UnknownCharacter {
        character: char,
        line: usize,
        column: usize,
    },
    #[error("unterminated string literal starting at line {line}")]
    UnterminatedString { line: usize },
    #[error("invalid escape sequence in string literal at line {line}")]
    InvalidEscape { line: usize },
}
