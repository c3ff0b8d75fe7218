//! Bridge between tokenization and parsing: filters the formatting tokens
//! (whitespace, newlines, comments) out of the span stream so the parser only
//! sees significant tokens, while each surviving span keeps its position.

use crate::tokenizer::token::TokenSpan;

/// A generic preprocessing step over some input representation.
pub trait Preprocessor<T, U = T> {
    fn process(&self, input: T) -> U;
}

/// Token-stream preprocessor used in front of the analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenPreprocessor {}

impl Preprocessor<Vec<TokenSpan>> for TokenPreprocessor {
    fn process(&self, input: Vec<TokenSpan>) -> Vec<TokenSpan> {
        input
            .into_iter()
            .filter(|span| !span.token.is_trivia())
            .collect()
    }
}
