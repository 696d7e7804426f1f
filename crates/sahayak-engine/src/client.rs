//! Generative text service clients.
//!
//! `GenerativeClient` is the seam between the pipeline and the external
//! model. The production implementation talks to the Google Generative
//! Language API over HTTP; `StaticClient` is a scripted double for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use sahayak_core::config::GenerativeConfig;
use sahayak_core::error::SahayakError;

/// A text-completion service: one prompt in, one completion out.
///
/// Implementations are invoked exactly once per request with no internal
/// retry; any failure surfaces as `SahayakError::Generation`.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, SahayakError>;
}

/// Client for the Google Generative Language (Gemini) API.
pub struct GeminiClient {
    client: Client,
    api_base: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// Build a client from config and an API key.
    pub fn new(config: &GenerativeConfig, api_key: String) -> Result<Self, SahayakError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SahayakError::Generation(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, SahayakError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }],
            }))
            .send()
            .await
            .map_err(|e| SahayakError::Generation(format!("Request failed: {}", e)))?;

        let data = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| SahayakError::Generation(format!("Non-JSON response: {}", e)))?;

        if let Some(error) = data.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error");
            return Err(SahayakError::Generation(format!("API error: {}", message)));
        }

        let text = data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                SahayakError::Generation("Response missing candidate text".to_string())
            })?;

        Ok(text.trim().to_string())
    }
}

/// Scripted client for tests: returns queued responses in order, repeating
/// the last one when the queue runs dry, or always failing.
pub struct StaticClient {
    responses: Mutex<VecDeque<String>>,
    fallback: String,
    error: Option<String>,
}

impl StaticClient {
    /// Always return the same completion.
    pub fn new(response: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: response.to_string(),
            error: None,
        }
    }

    /// Return the given completions in order, then repeat the last.
    pub fn with_responses(responses: Vec<String>) -> Self {
        let fallback = responses.last().cloned().unwrap_or_default();
        Self {
            responses: Mutex::new(responses.into()),
            fallback,
            error: None,
        }
    }

    /// Always fail with a generation error.
    pub fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: String::new(),
            error: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl GenerativeClient for StaticClient {
    async fn generate(&self, _prompt: &str) -> Result<String, SahayakError> {
        if let Some(ref message) = self.error {
            return Err(SahayakError::Generation(message.clone()));
        }
        let mut queue = self
            .responses
            .lock()
            .map_err(|e| SahayakError::Generation(format!("response lock poisoned: {}", e)))?;
        Ok(queue.pop_front().unwrap_or_else(|| self.fallback.clone()))
    }
}
