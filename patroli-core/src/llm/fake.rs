//! Fake LLM provider for testing.
//!
//! Returns deterministic responses based on prompt matching, so tests and
//! keyless deployments run without network access or API costs.

use super::{LlmError, LlmProvider};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

const DEFAULT_EXPLANATION: &str = "Produk ini adalah perlengkapan yang umum digunakan \
untuk menunjang kebutuhan perkantoran atau bisnis sehari-hari.";

/// A fake LLM provider for testing.
///
/// Responses are matched by checking if the prompt contains a registered
/// substring. If no match is found, returns a default response or error.
#[derive(Debug)]
pub struct FakeProvider {
    /// Map of prompt substring -> response
    responses: RwLock<HashMap<String, String>>,
    /// Default response if no match found
    default_response: Option<String>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            responses: RwLock::new(HashMap::new()),
            default_response: Some(DEFAULT_EXPLANATION.to_string()),
        }
    }
}

#[allow(dead_code)]
impl FakeProvider {
    /// Create a new FakeProvider with no registered responses.
    pub fn new() -> Self {
        Self {
            responses: RwLock::new(HashMap::new()),
            default_response: None,
        }
    }

    /// Create a FakeProvider that returns a specific response for prompts
    /// containing a substring.
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let mut provider = Self::new();
        provider.add_response(prompt_contains, response);
        provider
    }

    /// Add a response for prompts containing a specific substring.
    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses
            .write()
            .unwrap()
            .insert(prompt_contains.to_string(), response.to_string());
    }

    /// Set the default response when no pattern matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let responses = self.responses.read().unwrap();

        // Find first matching pattern (case-insensitive)
        let prompt_lower = prompt.to_lowercase();
        for (pattern, response) in responses.iter() {
            if prompt_lower.contains(&pattern.to_lowercase()) {
                return Ok(response.clone());
            }
        }

        match &self.default_response {
            Some(response) => Ok(response.clone()),
            None => Err(LlmError::RequestFailed(format!(
                "FakeProvider: No response configured for prompt (first 100 chars): {}",
                &prompt[..prompt.len().min(100)]
            ))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_provider_matching() {
        let provider = FakeProvider::with_response("Pulpen", "Alat tulis untuk menulis.");
        let result = provider
            .complete("Jelaskan secara singkat apa itu produk \"Pulpen\"")
            .await
            .unwrap();
        assert_eq!(result, "Alat tulis untuk menulis.");
    }

    #[tokio::test]
    async fn test_fake_provider_case_insensitive() {
        let provider = FakeProvider::with_response("PULPEN", "Alat tulis.");
        let result = provider.complete("produk pulpen gel").await.unwrap();
        assert_eq!(result, "Alat tulis.");
    }

    #[tokio::test]
    async fn test_fake_provider_no_match() {
        let provider = FakeProvider::new();
        let result = provider.complete("random prompt").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_default_provider_always_answers() {
        let provider = FakeProvider::default();
        let result = provider.complete("Jelaskan produk misterius").await.unwrap();
        assert!(!result.is_empty());
    }

    #[tokio::test]
    async fn test_fake_provider_custom_default() {
        let provider = FakeProvider::new().with_default_response("jawaban standar");
        let result = provider.complete("apapun").await.unwrap();
        assert_eq!(result, "jawaban standar");
    }
}
