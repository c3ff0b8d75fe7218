//! Network-backed recognition through an OpenAI-compatible chat-completions
//! endpoint. Transport or parse failures fall back to the rule matcher, so a
//! dead network degrades to deterministic behavior instead of dead turns.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, warn};

use crate::ast::IntentDef;
use crate::config::LlmConfig;

use super::rule::RuleRecognizer;
use super::{IntentRecognizer, IntentResult, RecognizerContext, RecognizerError, UNKNOWN_INTENT};

const SYSTEM_PROMPT: &str = "You are an intent classifier for a customer-service bot. \
Analyze the user's message and reply with JSON only, in the form:\n\
{\"intent\": \"<name>\", \"confidence\": 0.95, \"entities\": {\"key\": \"value\"}}\n\
Rules:\n\
1. \"intent\" must be one of the listed intent names, or \"unknown\" if none match.\n\
2. \"confidence\" is a score between 0 and 1.\n\
3. \"entities\" holds key facts extracted from the message (order numbers, phone numbers, ...).\n\
4. Reply with the JSON object and nothing else.";

pub struct LlmRecognizer {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: SecretString,
    fallback: RuleRecognizer,
}

impl LlmRecognizer {
    pub fn new(config: LlmConfig, api_key: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            api_key,
            fallback: RuleRecognizer::new(),
        }
    }

    async fn request(
        &self,
        utterance: &str,
        intents: &[IntentDef],
        context: &RecognizerContext,
    ) -> Result<IntentResult, RecognizerError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_user_prompt(utterance, intents, context)},
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| RecognizerError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RecognizerError::Api(format!("{}: {}", status, detail)));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RecognizerError::Parse(e.to_string()))?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| RecognizerError::Parse("missing message content".to_string()))?;
        debug!(content, "llm classification response");

        parse_intent_response(content, intents)
    }
}

#[async_trait]
impl IntentRecognizer for LlmRecognizer {
    async fn recognize(
        &self,
        utterance: &str,
        intents: &[IntentDef],
        context: &RecognizerContext,
    ) -> Result<IntentResult, RecognizerError> {
        match self.request(utterance, intents, context).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!(error = %e, "llm recognition failed, using rule matcher");
                Ok(self.fallback.classify(utterance, intents))
            }
        }
    }
}

fn build_user_prompt(
    utterance: &str,
    intents: &[IntentDef],
    context: &RecognizerContext,
) -> String {
    let mut catalogue = String::new();
    for intent in intents {
        catalogue.push_str(&format!("- **{}**", intent.name));
        if let Some(description) = &intent.description {
            catalogue.push_str(&format!(": {}", description));
        }
        if !intent.patterns.is_empty() {
            catalogue.push_str(&format!("\n  keywords: {}", intent.patterns.join(", ")));
        }
        if !intent.examples.is_empty() {
            let examples: Vec<&str> = intent.examples.iter().take(3).map(String::as_str).collect();
            catalogue.push_str(&format!("\n  examples: {}", examples.join(", ")));
        }
        catalogue.push('\n');
    }

    let context_json = json!({
        "current_state": context.current_state,
        "variables": context.variables,
    });

    format!(
        "Available intents:\n{}\nDialogue context:\n```json\n{}\n```\n\nUser message: \"{}\"\n\nClassify the intent.",
        catalogue, context_json, utterance
    )
}

/// Parses the model's reply: tolerates markdown code fences and surrounding
/// prose, validates the intent name against the catalogue with a fuzzy
/// containment match, and maps anything unrecognized to `unknown`.
fn parse_intent_response(
    content: &str,
    intents: &[IntentDef],
) -> Result<IntentResult, RecognizerError> {
    let mut text = content.trim();
    if let Some(stripped) = text.strip_prefix("```") {
        let stripped = stripped.strip_prefix("json").unwrap_or(stripped);
        text = stripped.strip_suffix("```").unwrap_or(stripped).trim();
    }

    let json_str = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    };
    let parsed: serde_json::Value = serde_json::from_str(json_str).map_err(|e| {
        let preview: String = content.chars().take(100).collect();
        RecognizerError::Parse(format!("{}: {}", e, preview))
    })?;

    let raw_name = parsed["intent"].as_str().unwrap_or(UNKNOWN_INTENT);
    let intent = validate_intent_name(raw_name, intents);

    let confidence = parsed["confidence"].as_f64().unwrap_or(0.5).clamp(0.0, 1.0);

    let mut entities = HashMap::new();
    if let Some(object) = parsed["entities"].as_object() {
        for (key, value) in object {
            let value = match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            };
            entities.insert(key.clone(), value);
        }
    }

    Ok(IntentResult {
        intent,
        confidence,
        entities,
    })
}

fn validate_intent_name(name: &str, intents: &[IntentDef]) -> String {
    if name == UNKNOWN_INTENT {
        return UNKNOWN_INTENT.to_string();
    }
    if intents.iter().any(|i| i.name == name) {
        return name.to_string();
    }
    let lowered = name.to_lowercase();
    for intent in intents {
        let candidate = intent.name.to_lowercase();
        if candidate.contains(&lowered) || lowered.contains(&candidate) {
            return intent.name.clone();
        }
    }
    UNKNOWN_INTENT.to_string()
}
