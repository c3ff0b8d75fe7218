//! JSON configuration for the recognizer stack. Missing files and missing
//! fields fall back to defaults; the API key lives in a separate secret file
//! (or the environment) and is wrapped in [`SecretString`] so it never ends
//! up in logs or debug output.

use std::path::Path;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: 200,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SecretConfig {
    pub api_key: SecretString,
}

impl Default for SecretConfig {
    fn default() -> Self {
        Self {
            api_key: SecretString::new(String::new()),
        }
    }
}

/// Loads a JSON config file into any deserializable type.
pub fn from_file<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, Error> {
    let content = std::fs::read_to_string(path.as_ref())
        .map_err(|e| Error::Config(format!("{}: {}", path.as_ref().display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.as_ref().display(), e)))
}
