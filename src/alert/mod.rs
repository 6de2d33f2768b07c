//! Alerting for critical vitals.
//!
//! When a session first sees a critical reading (or the user asks for it),
//! the [`AlertGenerator`] composes an emergency message through an external
//! text generator and hands the result to the configured notifiers.

mod error;
mod generator;
mod locale;
mod notifier;
mod pipeline;
mod prompt;

pub use error::AlertError;
pub use generator::{ChatCompletionsGenerator, TextGenerator};
pub use locale::Language;
pub use notifier::{LogNotifier, Notifier, WebhookNotifier};
pub use pipeline::{AlertGenerator, AlertMessage, AlertTrigger};
pub use prompt::compose_prompt;

use serde::{Deserialize, Serialize};

pub const API_KEY_ENV: &str = "VITALWATCH_API_KEY";

/// Configuration for alert generation and delivery
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,
    pub model: String,
    /// Bearer key; omitted from requests when absent
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    /// Language the alert and static messages are written in
    pub language: Language,
    /// Raise a local notification for each generated alert
    pub notifications: bool,
    /// POST each generated alert here as JSON
    pub webhook_url: Option<String>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            temperature: 0.4,
            max_tokens: 256,
            timeout_ms: 15_000,
            language: Language::default(),
            notifications: true,
            webhook_url: None,
        }
    }
}
