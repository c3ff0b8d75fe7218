//! # Tokenizer
//!
//! Lexical analysis for bot DSL source: raw UTF-8 text in, a stream of
//! [`token::TokenSpan`] out. Every token carries its byte span and 1-based
//! line/column so later stages can report precise positions, and formatting
//! tokens (whitespace, newlines, comments) are preserved so the spans cover
//! the source exactly; the [`preprocessor`](crate::preprocessor) strips them
//! before parsing.
//!
//! Module layout, one file per token family:
//!
//! * [`token`]: token type, span, tokenizer driver and identifier/word parsing
//! * [`keyword`]: reserved words
//! * [`symbol`]: operators and delimiters
//! * [`literal`]: string and number literals
//! * [`whitespace`]: spaces, tabs and newlines
//! * [`comment`]: `#` line comments

pub mod comment;
pub mod keyword;
pub mod literal;
pub mod symbol;
pub mod token;
pub mod whitespace;
