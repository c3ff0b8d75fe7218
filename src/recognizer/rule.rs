//! Deterministic rule-based recognition: pattern substring hits plus word
//! overlap with the declared examples. No network, no state.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::ast::IntentDef;

use super::{IntentRecognizer, IntentResult, RecognizerContext, RecognizerError};

/// Scoring: each pattern contained in the utterance counts 1 point, each
/// word shared with an example counts 0.5; the best-scoring intent wins with
/// confidence `min(score / 5, 1)`. Declaration order breaks ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleRecognizer {}

impl RuleRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&self, utterance: &str, intents: &[IntentDef]) -> IntentResult {
        let utterance = utterance.to_lowercase();
        let input_words: HashSet<&str> = utterance.split_whitespace().collect();

        let mut best: Option<(&IntentDef, f64)> = None;
        for intent in intents {
            let mut score = 0.0;
            for pattern in &intent.patterns {
                if utterance.contains(&pattern.to_lowercase()) {
                    score += 1.0;
                }
            }
            for example in &intent.examples {
                let example = example.to_lowercase();
                let overlap = example
                    .split_whitespace()
                    .filter(|word| input_words.contains(word))
                    .count();
                score += overlap as f64 * 0.5;
            }
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((intent, score));
            }
        }

        match best {
            Some((intent, score)) => IntentResult {
                intent: intent.name.clone(),
                confidence: (score / 5.0).min(1.0),
                entities: std::collections::HashMap::new(),
            },
            None => IntentResult::unknown(),
        }
    }
}

#[async_trait]
impl IntentRecognizer for RuleRecognizer {
    async fn recognize(
        &self,
        utterance: &str,
        intents: &[IntentDef],
        _context: &RecognizerContext,
    ) -> Result<IntentResult, RecognizerError> {
        Ok(self.classify(utterance, intents))
    }
}
