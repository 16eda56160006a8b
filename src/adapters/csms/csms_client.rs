//! HTTP CSMS notifier adapter.
//!
//! Posts payment lifecycle events to the CSMS notification endpoint as JSON.
//! Deliveries are fire-and-forget from the callers' perspective: the returned
//! `Result` is informational and the application layer discards it after
//! logging.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::payment::CsmsEvent;
use crate::ports::{CsmsNotifier, NotifyError};

/// CSMS notifier posting events over HTTP.
pub struct HttpCsmsNotifier {
    notification_url: String,
    http_client: reqwest::Client,
}

impl HttpCsmsNotifier {
    /// Create a notifier for the given endpoint with a per-request timeout.
    pub fn new(notification_url: impl Into<String>, timeout: Duration) -> Self {
        // Same panic-on-TLS-init behavior as `reqwest::Client::new()`.
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("HTTP client construction");

        Self {
            notification_url: notification_url.into(),
            http_client,
        }
    }
}

#[async_trait]
impl CsmsNotifier for HttpCsmsNotifier {
    async fn notify(&self, event: &CsmsEvent) -> Result<(), NotifyError> {
        let response = self
            .http_client
            .post(&self.notification_url)
            .json(&event.to_body())
            .send()
            .await
            .map_err(|e| NotifyError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                event_type = event.event_type(),
                status = status.as_u16(),
                "CSMS returned non-success status"
            );
            return Err(NotifyError::BadStatus {
                status: status.as_u16(),
            });
        }

        tracing::info!(
            event_type = event.event_type(),
            "CSMS notification delivered"
        );
        Ok(())
    }
}
