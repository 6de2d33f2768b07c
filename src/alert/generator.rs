//! External text generation
//!
//! The alert text comes from a remote model behind the [`TextGenerator`]
//! trait. [`ChatCompletionsGenerator`] speaks the OpenAI-compatible
//! chat-completions protocol, which most hosted and local model servers
//! expose (`POST {base_url}/chat/completions`).

use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use super::{AlertConfig, AlertError};

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce text for the prompt. Empty output is an error.
    async fn generate(&self, prompt: &str) -> Result<String, AlertError>;

    fn name(&self) -> &str;
}

/// OpenAI-compatible chat-completions client
pub struct ChatCompletionsGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionsGenerator {
    pub fn new(config: &AlertConfig) -> Result<Self, AlertError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AlertError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        })
    }
}

/// Pull the reply text out of a chat-completions response
pub(crate) fn extract_content(json: &serde_json::Value) -> Result<String, AlertError> {
    let content = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| AlertError::InvalidResponse("Missing content in response".to_string()))?;

    let content = content.trim();
    if content.is_empty() {
        return Err(AlertError::EmptyResponse);
    }
    Ok(content.to_string())
}

#[async_trait]
impl TextGenerator for ChatCompletionsGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, AlertError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Requesting alert text from {} ({})", url, self.model);

        let mut request = self.client.post(&url).json(&self.request_body(prompt));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AlertError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AlertError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AlertError::InvalidResponse(e.to_string()))?;

        extract_content(&json)
    }

    fn name(&self) -> &str {
        "chat-completions"
    }
}
