//! Outbound answer webhook.

use std::time::Duration;

use catalog_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Request timeout for webhook deliveries.
const DELIVERY_TIMEOUT_SECS: u64 = 10;

/// Body POSTed to the callback URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerNotification {
    pub session_id: String,
    pub answer: String,
}

/// Posts finished answers to a configured callback URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DELIVERY_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create webhook client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST the notification as JSON.
    ///
    /// # Errors
    /// `AppError::DeliveryFailed` on connection errors and non-success statuses.
    pub async fn deliver(&self, notification: &AnswerNotification) -> AppResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| AppError::DeliveryFailed(format!("POST {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::DeliveryFailed(format!(
                "Callback {} answered {}",
                self.url, status
            )));
        }

        tracing::debug!(
            session_id = %notification.session_id,
            url = %self.url,
            "Delivered answer"
        );
        Ok(())
    }
}
