use nom::{
    bytes::complete::tag, character::complete::not_line_ending, combinator::map, error::context,
    sequence::preceded,
};

use super::token::{ParserResult, Token};

/// Parses a `#`-to-end-of-line comment. The trailing newline is left in the
/// input and lexed as its own token.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_comment(input: &str) -> ParserResult<Token> {
    context(
        "comment",
        map(preceded(tag("#"), not_line_ending), |content: &str| {
            Token::Comment(content.to_string())
        }),
    )(input)
}
