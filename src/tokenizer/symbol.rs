use nom::{branch::alt, bytes::complete::tag, combinator::map, error::context};

use super::token::{ParserResult, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
pub enum Operator {
    // comparison
    #[strum(serialize = "==")]
    EqualEqual,
    #[strum(serialize = "!=")]
    NotEqual,
    #[strum(serialize = "<=")]
    LessEqual,
    #[strum(serialize = ">=")]
    GreaterEqual,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = ">")]
    Greater,

    // transitions and `ask` targets
    #[strum(serialize = "->")]
    Arrow,

    // assignment
    #[strum(serialize = "=")]
    Assign,

    // arithmetic
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "-")]
    Minus,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "%")]
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
pub enum Delimiter {
    #[strum(serialize = "{{")]
    OpenBrace,
    #[strum(serialize = "}}")]
    CloseBrace,
    #[strum(serialize = "(")]
    OpenParen,
    #[strum(serialize = ")")]
    CloseParen,
    #[strum(serialize = "[")]
    OpenBracket,
    #[strum(serialize = "]")]
    CloseBracket,
    #[strum(serialize = ",")]
    Comma,
    #[strum(serialize = ":")]
    Colon,
}

/// Two-character operators are matched before single-character ones so that
/// `>=` never lexes as `>` `=`.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_operator(input: &str) -> ParserResult<Token> {
    context(
        "operator",
        alt((
            map(tag("=="), |_| Token::Operator(Operator::EqualEqual)),
            map(tag("!="), |_| Token::Operator(Operator::NotEqual)),
            map(tag("<="), |_| Token::Operator(Operator::LessEqual)),
            map(tag(">="), |_| Token::Operator(Operator::GreaterEqual)),
            map(tag("->"), |_| Token::Operator(Operator::Arrow)),
            map(tag("<"), |_| Token::Operator(Operator::Less)),
            map(tag(">"), |_| Token::Operator(Operator::Greater)),
            map(tag("="), |_| Token::Operator(Operator::Assign)),
            map(tag("+"), |_| Token::Operator(Operator::Plus)),
            map(tag("-"), |_| Token::Operator(Operator::Minus)),
            map(tag("*"), |_| Token::Operator(Operator::Multiply)),
            map(tag("/"), |_| Token::Operator(Operator::Divide)),
            map(tag("%"), |_| Token::Operator(Operator::Percent)),
        )),
    )(input)
}

#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_delimiter(input: &str) -> ParserResult<Token> {
    context(
        "delimiter",
        alt((
            map(tag("{"), |_| Token::Delimiter(Delimiter::OpenBrace)),
            map(tag("}"), |_| Token::Delimiter(Delimiter::CloseBrace)),
            map(tag("("), |_| Token::Delimiter(Delimiter::OpenParen)),
            map(tag(")"), |_| Token::Delimiter(Delimiter::CloseParen)),
            map(tag("["), |_| Token::Delimiter(Delimiter::OpenBracket)),
            map(tag("]"), |_| Token::Delimiter(Delimiter::CloseBracket)),
            map(tag(","), |_| Token::Delimiter(Delimiter::Comma)),
            map(tag(":"), |_| Token::Delimiter(Delimiter::Colon)),
        )),
    )(input)
}
