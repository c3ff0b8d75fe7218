use nom::{
    branch::alt,
    character::complete::{char, digit1},
    combinator::{map_res, recognize},
    error::{context, VerboseError, VerboseErrorKind},
    sequence::pair,
};

use super::token::{ParserResult, Token};

/// Literal values as they appear in source. `Boolean` and `Null` are produced
/// by the word parser in [`super::token`], not here.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "null"),
        }
    }
}

/// Parses a string or number literal.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_literal(input: &str) -> ParserResult<Token> {
    context(
        "literal",
        alt((parse_string_literal, parse_float_literal, parse_integer_literal)),
    )(input)
}

/// String literals are delimited by matching `"` or `'`. Recognized escapes:
/// `\n \t \r \\ \" \'`. A newline or end of input before the closing quote is
/// an unterminated-string error; any other escape is invalid.
fn parse_string_literal(input: &str) -> ParserResult<Token> {
    let quote = match input.chars().next() {
        Some(c @ ('"' | '\'')) => c,
        _ => return Err(nom::Err::Error(error_at(input, "string literal"))),
    };

    let mut decoded = String::new();
    let mut rest = &input[quote.len_utf8()..];
    loop {
        let mut chars = rest.chars();
        match chars.next() {
            None | Some('\n') => {
                return Err(nom::Err::Failure(error_at(rest, "unterminated string")));
            }
            Some(c) if c == quote => {
                return Ok((&rest[c.len_utf8()..], Token::Literal(Literal::String(decoded))));
            }
            Some('\\') => match chars.next() {
                Some('n') => {
                    decoded.push('\n');
                    rest = &rest[2..];
                }
                Some('t') => {
                    decoded.push('\t');
                    rest = &rest[2..];
                }
                Some('r') => {
                    decoded.push('\r');
                    rest = &rest[2..];
                }
                Some(c @ ('\\' | '"' | '\'')) => {
                    decoded.push(c);
                    rest = &rest[1 + c.len_utf8()..];
                }
                _ => return Err(nom::Err::Failure(error_at(rest, "invalid escape sequence"))),
            },
            Some(c) => {
                decoded.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
}

fn error_at<'a>(input: &'a str, message: &'static str) -> VerboseError<&'a str> {
    VerboseError {
        errors: vec![(input, VerboseErrorKind::Context(message))],
    }
}

/// One or more digits, a dot, one or more digits. Floats are produced iff a
/// dot is present; a leading `-` belongs to unary minus, not the literal.
fn parse_float_literal(input: &str) -> ParserResult<Token> {
    context(
        "float literal",
        map_res(
            recognize(pair(digit1, pair(char('.'), digit1))),
            |s: &str| {
                s.parse::<f64>()
                    .map(|x| Token::Literal(Literal::Float(x)))
            },
        ),
    )(input)
}

fn parse_integer_literal(input: &str) -> ParserResult<Token> {
    context(
        "integer literal",
        map_res(digit1, |s: &str| {
            s.parse::<i64>().map(|i| Token::Literal(Literal::Integer(i)))
        }),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_quoted_string() {
        let (rest, token) = parse_literal("\"hello world\" x").unwrap();
        assert_eq!(token, Token::Literal(Literal::String("hello world".to_string())));
        assert_eq!(rest, " x");
    }

    #[test]
    fn test_single_quoted_string() {
        let (rest, token) = parse_literal("'你好'").unwrap();
        assert_eq!(token, Token::Literal(Literal::String("你好".to_string())));
        assert_eq!(rest, "");
    }

    #[test]
    fn test_escape_sequences() {
        let (_, token) = parse_literal(r#""a\nb\tc\\d\"e\'f""#).unwrap();
        assert_eq!(
            token,
            Token::Literal(Literal::String("a\nb\tc\\d\"e'f".to_string()))
        );
    }

    #[test]
    fn test_quote_inside_other_quote() {
        let (_, token) = parse_literal(r#"'say "hi"'"#).unwrap();
        assert_eq!(token, Token::Literal(Literal::String("say \"hi\"".to_string())));
    }

    #[test]
    fn test_unterminated_string_is_failure() {
        assert!(matches!(
            parse_literal("\"unclosed"),
            Err(nom::Err::Failure(_))
        ));
        assert!(matches!(
            parse_literal("\"broken\nline\""),
            Err(nom::Err::Failure(_))
        ));
    }

    #[test]
    fn test_invalid_escape_is_failure() {
        assert!(matches!(
            parse_literal(r#""bad \x escape""#),
            Err(nom::Err::Failure(_))
        ));
    }

    #[test]
    fn test_numbers() {
        let (_, token) = parse_literal("123").unwrap();
        assert_eq!(token, Token::Literal(Literal::Integer(123)));

        let (_, token) = parse_literal("123.45").unwrap();
        assert_eq!(token, Token::Literal(Literal::Float(123.45)));

        // the dot needs digits on both sides to make a float
        let (rest, token) = parse_literal("7.").unwrap();
        assert_eq!(token, Token::Literal(Literal::Integer(7)));
        assert_eq!(rest, ".");
    }
}
