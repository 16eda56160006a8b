//! Payment flow error taxonomy.

use thiserror::Error;

/// Errors surfaced by the payment orchestration flows.
///
/// The variants are grouped by who has to act on them: the 400-class errors
/// point at the caller's input or an untrusted webhook, the 500-class errors
/// at the processor or this service itself. CSMS notification failures are
/// not represented here - they never cross the notifier boundary upward.
#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    /// Client input is malformed or missing a required field.
    #[error("{0}")]
    InvalidRequest(String),

    /// Webhook signature verification failed.
    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),

    /// Webhook payload could not be parsed into a known shape.
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),

    /// The processor declined the card.
    #[error("card error: {0}")]
    Card(String),

    /// The processor rejected a caller-driven request (bad token, unknown
    /// intent id, re-confirmation). Surfaced to the caller as their problem.
    #[error("{0}")]
    Rejected(String),

    /// The processor failed the call for reasons outside the caller's
    /// control.
    #[error("payment processor error: {0}")]
    Processor(String),

    /// Anything unexpected.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PaymentFlowError {
    /// Whether the error is attributable to the caller (maps to a 400).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PaymentFlowError::InvalidRequest(_)
                | PaymentFlowError::InvalidSignature(_)
                | PaymentFlowError::InvalidPayload(_)
                | PaymentFlowError::Card(_)
                | PaymentFlowError::Rejected(_)
        )
    }

    /// Machine-readable error code for API responses and logs.
    pub fn code(&self) -> &'static str {
        match self {
            PaymentFlowError::InvalidRequest(_) => "invalid_request",
            PaymentFlowError::InvalidSignature(_) => "invalid_signature",
            PaymentFlowError::InvalidPayload(_) => "invalid_payload",
            PaymentFlowError::Card(_) => "card_error",
            PaymentFlowError::Rejected(_) => "processor_rejected",
            PaymentFlowError::Processor(_) => "processor_error",
            PaymentFlowError::Internal(_) => "internal_error",
        }
    }
}
