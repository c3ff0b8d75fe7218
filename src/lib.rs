//! # botscript
//!
//! A small domain-specific language and tree-walking interpreter for
//! authoring conversational customer-service bots. A source script declares
//! named bots; each bot is a finite state machine whose transitions are
//! driven by intents recognized from free-form user utterances.
//!
//! ## Processing pipeline
//!
//! ```text
//! Source text → Tokenizer → Preprocessor → Analyzer → AST → Dialogue Engine
//! ```
//!
//! ### Stage 1: Tokenization
//!
//! The [`tokenizer`] turns UTF-8 source (identifiers may be CJK) into a span
//! stream, preserving whitespace and comments so positions are exact.
//!
//! ### Stage 2: Preprocessing
//!
//! The [`preprocessor`] filters formatting tokens out before parsing.
//!
//! ### Stage 3: Parsing
//!
//! The [`analyzer`] builds the typed [`ast`] with a parser-combinator
//! system, then validates structure (unique names, one initial state,
//! transitions referencing declared intents and states).
//!
//! ### Stage 4: Execution
//!
//! The [`engine`] drives the dialogue: each user turn is classified by an
//! [`recognizer::IntentRecognizer`], and the [`eval`] walker executes the
//! script blocks attached to the active state, reaching the outside world
//! only through an [`io::IoHandler`].
//!
//! The AST is immutable once parsed and can be shared across sessions; all
//! mutable state lives in the per-session environment and engine.

pub mod analyzer;
pub mod ast;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod io;
pub mod preprocessor;
pub mod recognizer;
pub mod tokenizer;

pub use error::Error;

use preprocessor::Preprocessor;

/// Tokenizes, preprocesses, parses and validates a source script.
///
/// This is the whole front half of the pipeline; the first error is fatal
/// and reported with its source line.
pub fn compile(source: &str) -> Result<ast::Program, Error> {
    let spans = tokenizer::token::Tokenizer::new().tokenize(source)?;
    let tokens = preprocessor::TokenPreprocessor::default().process(spans);
    let program = analyzer::parse_tokens(&tokens).map_err(|e| {
        let line = analyzer::error_line(&tokens, &e).unwrap_or(0);
        Error::Parse { source: e, line }
    })?;
    analyzer::validation::validate(&program)?;
    Ok(program)
}
