//! Generation configuration parameters

use serde::{Deserialize, Serialize};

/// Default output budget for a single model turn
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Default sampling temperature; low because answers should be factual
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Parameters for controlling text generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum number of tokens to generate
    pub max_tokens: u32,
    /// Randomness (0.0-2.0 for Gemini, higher = more random)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Top-k sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Stop generation when these sequences are encountered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

impl GenerationConfig {
    /// Create a new configuration with the specified max tokens
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            temperature: None,
            top_p: None,
            top_k: None,
            stop_sequences: None,
        }
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOKENS).with_temperature(DEFAULT_TEMPERATURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_is_factual() {
        let config = GenerationConfig::default();
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.temperature, Some(0.1));
        assert!(config.top_k.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = GenerationConfig::new(512).with_temperature(0.7);

        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.temperature, Some(0.7));
        assert!(config.stop_sequences.is_none());
    }

    #[test]
    fn test_unset_fields_are_not_serialized() {
        let json = serde_json::to_string(&GenerationConfig::new(1024)).unwrap();
        assert_eq!(json, r#"{"max_tokens":1024}"#);
    }
}
