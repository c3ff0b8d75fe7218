use std::str::FromStr;

use nom::{
    bytes::complete::{take_while, take_while1},
    combinator::{map_opt, recognize},
    error::context,
    sequence::pair,
};

use super::token::{ParserResult, Token};

/// Reserved words of the DSL. `true`, `false` and `null` are lexed as
/// literals instead (see [`super::token::parse_word`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Keyword {
    Bot,
    Intent,
    State,
    Var,
    Func,
    Say,
    Ask,
    Set,
    Goto,
    Call,
    Return,
    If,
    Elif,
    Else,
    While,
    For,
    In,
    And,
    Or,
    Not,
    Initial,
    Final,
    OnEnter,
    OnExit,
    OnMessage,
    When,
    Fallback,
    Patterns,
    Description,
    Examples,
}

/// Parses a keyword, refusing identifiers that merely start with one
/// (`state` matches, `states` does not).
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_keyword(input: &str) -> ParserResult<Token> {
    context(
        "keyword",
        map_opt(
            recognize(pair(
                take_while1(|c: char| c.is_alphabetic() || c == '_'),
                take_while(|c: char| c.is_alphanumeric() || c == '_'),
            )),
            |word: &str| Keyword::from_str(word).ok().map(Token::Keyword),
        ),
    )(input)
}
