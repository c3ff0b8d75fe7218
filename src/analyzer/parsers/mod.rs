//! Grammar parsers: token-level primitives shared by every rule, plus one
//! module per grammar area.

use super::{core::Parser, prelude::*};
use crate::tokenizer::{
    keyword::Keyword,
    literal::Literal,
    symbol::{Delimiter, Operator},
    token::{Token, TokenSpan},
};

pub mod bot;
pub mod expression;
pub mod statement;

/// An identifier token, yielding its name.
pub fn parse_identifier() -> impl Parser<TokenSpan, String> {
    satisfy(
        |span: &TokenSpan| match &span.token {
            Token::Identifier(name) => Some(name.clone()),
            _ => None,
        },
        "identifier",
    )
}

/// An identifier token, yielding its name and source line.
pub fn parse_identifier_spanned() -> impl Parser<TokenSpan, (String, usize)> {
    satisfy(
        |span: &TokenSpan| match &span.token {
            Token::Identifier(name) => Some((name.clone(), span.line)),
            _ => None,
        },
        "identifier",
    )
}

/// A string literal token, yielding its decoded value.
pub fn parse_string() -> impl Parser<TokenSpan, String> {
    satisfy(
        |span: &TokenSpan| match &span.token {
            Token::Literal(Literal::String(s)) => Some(s.clone()),
            _ => None,
        },
        "string literal",
    )
}

/// A specific keyword, yielding the line it appears on.
pub fn parse_keyword(keyword: Keyword) -> impl Parser<TokenSpan, usize> {
    let expected = keyword.to_string();
    satisfy(
        move |span: &TokenSpan| match &span.token {
            Token::Keyword(k) if *k == keyword => Some(span.line),
            _ => None,
        },
        &expected,
    )
}

/// A specific operator, yielding the line it appears on.
pub fn parse_operator(operator: Operator) -> impl Parser<TokenSpan, usize> {
    let expected = operator.to_string();
    satisfy(
        move |span: &TokenSpan| match &span.token {
            Token::Operator(op) if *op == operator => Some(span.line),
            _ => None,
        },
        &expected,
    )
}

/// A specific delimiter, yielding the line it appears on.
pub fn parse_delimiter(delimiter: Delimiter) -> impl Parser<TokenSpan, usize> {
    let expected = delimiter.to_string();
    satisfy(
        move |span: &TokenSpan| match &span.token {
            Token::Delimiter(d) if *d == delimiter => Some(span.line),
            _ => None,
        },
        &expected,
    )
}

pub fn parse_open_brace() -> impl Parser<TokenSpan, usize> {
    parse_delimiter(Delimiter::OpenBrace)
}

pub fn parse_close_brace() -> impl Parser<TokenSpan, usize> {
    parse_delimiter(Delimiter::CloseBrace)
}

pub fn parse_open_paren() -> impl Parser<TokenSpan, usize> {
    parse_delimiter(Delimiter::OpenParen)
}

pub fn parse_close_paren() -> impl Parser<TokenSpan, usize> {
    parse_delimiter(Delimiter::CloseParen)
}

pub fn parse_open_bracket() -> impl Parser<TokenSpan, usize> {
    parse_delimiter(Delimiter::OpenBracket)
}

pub fn parse_close_bracket() -> impl Parser<TokenSpan, usize> {
    parse_delimiter(Delimiter::CloseBracket)
}

pub fn parse_comma() -> impl Parser<TokenSpan, usize> {
    parse_delimiter(Delimiter::Comma)
}

pub fn parse_colon() -> impl Parser<TokenSpan, usize> {
    parse_delimiter(Delimiter::Colon)
}

pub fn parse_arrow() -> impl Parser<TokenSpan, usize> {
    parse_operator(Operator::Arrow)
}

pub fn parse_assign() -> impl Parser<TokenSpan, usize> {
    parse_operator(Operator::Assign)
}

/// A `[ "a", "b", ... ]` list of string literals (intent attributes).
pub fn parse_string_list() -> impl Parser<TokenSpan, Vec<String>> {
    with_context(
        delimited(
            as_unit(parse_open_bracket()),
            separated_list(parse_string(), as_unit(parse_comma())),
            as_unit(parse_close_bracket()),
        ),
        "string list",
    )
}
