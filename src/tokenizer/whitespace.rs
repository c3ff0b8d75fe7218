//! Whitespace and newline tokens.
//!
//! Whitespace is preserved as tokens rather than discarded so that the token
//! stream, stitched back together via spans, reproduces the source exactly.
//! The preprocessor filters these out before parsing.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    combinator::map,
    error::context,
};

use super::token::{ParserResult, Token};

/// Parses a run of spaces and tabs into a single token.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_whitespace(input: &str) -> ParserResult<Token> {
    context(
        "whitespace",
        map(take_while1(|c| c == ' ' || c == '\t'), |ws: &str| {
            Token::Whitespace(ws.to_string())
        }),
    )(input)
}

/// Parses a single line break, Unix or Windows style.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_newline(input: &str) -> ParserResult<Token> {
    context(
        "newline",
        map(alt((tag("\r\n"), tag("\n"))), |_| Token::Newline),
    )(input)
}
