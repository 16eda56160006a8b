//! CSMS configuration

use serde::Deserialize;

use super::error::ValidationError;

/// CSMS notification endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CsmsConfig {
    /// URL the CSMS receives event notifications on
    #[serde(default = "default_notification_url")]
    pub notification_url: String,

    /// Per-notification request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CsmsConfig {
    /// Validate CSMS configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.notification_url.starts_with("http://")
            && !self.notification_url.starts_with("https://")
        {
            return Err(ValidationError::InvalidCsmsUrl);
        }
        if self.timeout_secs == 0 || self.timeout_secs > 60 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for CsmsConfig {
    fn default() -> Self {
        Self {
            notification_url: default_notification_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_notification_url() -> String {
    "http://localhost:8000/csms-notification".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}
