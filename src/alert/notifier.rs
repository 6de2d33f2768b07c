//! Delivery of generated alerts

use std::time::Duration;

use async_trait::async_trait;
use log::{info, warn};

use super::{AlertError, AlertMessage};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, alert: &AlertMessage) -> Result<(), AlertError>;
}

/// Raises the alert as a warning-level log record
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, alert: &AlertMessage) -> Result<(), AlertError> {
        warn!("[{}] {} ({})", title, alert.text, alert.reading);
        Ok(())
    }
}

/// POSTs the alert as JSON to an HTTP endpoint. Sent once, never retried.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AlertError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AlertError::Notification(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, title: &str, alert: &AlertMessage) -> Result<(), AlertError> {
        let body = serde_json::json!({
            "title": title,
            "alert": alert,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AlertError::Notification(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AlertError::Notification(format!(
                "webhook returned HTTP {}",
                response.status()
            )));
        }

        info!("Alert {} delivered to webhook", alert.id);
        Ok(())
    }
}
