//! CSMS notifier port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::payment::CsmsEvent;

/// Port for delivering payment lifecycle events to the CSMS.
///
/// Delivery is best-effort by contract: implementations log failures and
/// callers are expected to discard the returned `Result` rather than let a
/// notification failure change their own outcome. The `Result` exists so the
/// non-propagation is an explicit decision at each call site, not a swallowed
/// exception.
#[async_trait]
pub trait CsmsNotifier: Send + Sync {
    /// Send one event. A non-200 response or connection failure is an error;
    /// there is no retry.
    async fn notify(&self, event: &CsmsEvent) -> Result<(), NotifyError>;
}

/// Errors from CSMS notification delivery. Never propagated past the caller
/// that triggered the notification.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// The CSMS could not be reached (connection error or timeout).
    #[error("CSMS unreachable: {0}")]
    Unreachable(String),

    /// The CSMS answered with a non-200 status.
    #[error("CSMS responded with status {status}")]
    BadStatus { status: u16 },
}
