//! # Intent recognition
//!
//! The engine classifies each user turn through an [`IntentRecognizer`]; the
//! contract is deliberately small so implementations can range from a local
//! rule matcher to a network-backed language model:
//!
//! * [`rule`]: deterministic pattern/example scoring, the default and the
//!   fallback when the LLM is unreachable
//! * [`llm`]: OpenAI-compatible chat-completions client
//!
//! The engine never interprets `confidence` or `entities` itself — scripts
//! read them through the `_confidence` and `_entities` special variables.

pub mod llm;
pub mod rule;

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::ast::IntentDef;

/// The name reported when no declared intent matches.
pub const UNKNOWN_INTENT: &str = "unknown";

/// Outcome of classifying one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentResult {
    /// A declared intent name, or [`UNKNOWN_INTENT`].
    pub intent: String,
    /// In `[0, 1]`.
    pub confidence: f64,
    /// Key entities extracted from the utterance (order numbers, phones, ...).
    pub entities: HashMap<String, String>,
}

impl IntentResult {
    pub fn unknown() -> Self {
        Self {
            intent: UNKNOWN_INTENT.to_string(),
            confidence: 0.0,
            entities: HashMap::new(),
        }
    }
}

/// Dialogue context handed to the recognizer: the current state name and a
/// read-only JSON view of the bot's user-visible global variables.
#[derive(Debug, Clone, Default)]
pub struct RecognizerContext {
    pub current_state: String,
    pub variables: HashMap<String, serde_json::Value>,
}

#[derive(Error, Debug, Clone)]
pub enum RecognizerError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("api error: {0}")]
    Api(String),
    #[error("unparseable response: {0}")]
    Parse(String),
}

/// Maps `(utterance, intent catalogue, context)` to an [`IntentResult`].
/// A failure is surfaced to the script as the `unknown` intent by the engine.
#[async_trait]
pub trait IntentRecognizer: Send + Sync {
    async fn recognize(
        &self,
        utterance: &str,
        intents: &[IntentDef],
        context: &RecognizerContext,
    ) -> Result<IntentResult, RecognizerError>;
}
