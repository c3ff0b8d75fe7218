use thiserror::Error;

use crate::analyzer::core::ParseError;
use crate::analyzer::validation::ValidationError;
use crate::eval::RuntimeError;
use crate::tokenizer::token::TokenizerError;

/// Top-level error for loading and running scripts. Lexical, syntactic and
/// structural errors are fatal before a dialogue starts; runtime errors only
/// abort the turn they occur in.
#[derive(Error, Debug)]
pub enum Error {
    #[error("lex error: {0}")]
    Tokenize(#[from] TokenizerError),

    #[error("parse error at line {line}: {source}")]
    Parse { source: ParseError, line: usize },

    #[error("invalid program: {0}")]
    Validation(#[from] ValidationError),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Internal(String),
}
