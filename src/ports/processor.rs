//! Payment processor port.
//!
//! Contract for the external card-payment processor (Stripe in production).
//! The processor owns all session/intent state; this service never persists
//! any of it, so repeated retrieves are always safe.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::payment::{CheckoutMode, PaymentFlowError};

/// Port for the card-payment processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a hosted checkout session (payment or setup mode).
    async fn create_checkout_session(
        &self,
        spec: CheckoutSessionSpec,
    ) -> Result<CheckoutSession, ProcessorError>;

    /// Retrieve an existing checkout session by id.
    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, ProcessorError>;

    /// Create a card payment method from a card token.
    async fn create_payment_method(&self, card_token: &str)
        -> Result<PaymentMethod, ProcessorError>;

    /// Attach a payment method to a customer.
    async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<(), ProcessorError>;

    /// Create a setup intent pre-authorizing a payment method for a later
    /// charge. `client_id` is stored in the intent metadata.
    async fn create_setup_intent(
        &self,
        customer_id: &str,
        payment_method_id: &str,
        client_id: &str,
    ) -> Result<SetupIntent, ProcessorError>;

    /// Retrieve a setup intent by id.
    async fn retrieve_setup_intent(
        &self,
        setup_intent_id: &str,
    ) -> Result<SetupIntent, ProcessorError>;

    /// Create and confirm a payment intent in one call.
    async fn create_payment_intent(
        &self,
        spec: PaymentIntentSpec,
    ) -> Result<PaymentIntent, ProcessorError>;

    /// Verify a webhook signature and parse the event.
    ///
    /// Must fail before any event data is trusted.
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, ProcessorError>;
}

/// Parameters for creating a checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSessionSpec {
    /// ISO currency code, lowercase.
    pub currency: String,
    /// Product name shown on the hosted page.
    pub description: String,
    /// Line-item amount in minor units.
    pub amount_minor: i64,
    /// Payment or setup mode.
    pub mode: CheckoutMode,
    /// Redirect after completion; carries the processor's session-id
    /// placeholder.
    pub success_url: String,
    /// Redirect after abandonment.
    pub cancel_url: String,
    /// Caller's client identifier, stored as the session reference.
    pub client_reference_id: String,
    /// Declared payment type, stored in the session metadata.
    pub payment_type: String,
}

/// A processor-hosted checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted page URL.
    pub url: Option<String>,
    /// "payment" or "setup".
    pub mode: String,
    pub client_reference_id: Option<String>,
    /// Present on completed setup-mode sessions.
    pub setup_intent: Option<String>,
    /// Total in minor units; absent for setup-mode sessions.
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    /// Declared payment type from the session metadata, if recorded.
    pub fn payment_type(&self) -> Option<&str> {
        self.metadata.get("payment_type").map(String::as_str)
    }
}

/// A card payment method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
}

/// A pre-authorized, not-yet-charged payment method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupIntent {
    pub id: String,
    pub customer: Option<String>,
    pub payment_method: Option<String>,
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl SetupIntent {
    /// Client id recorded in the intent metadata at session start.
    pub fn client_id(&self) -> Option<&str> {
        self.metadata.get("client_id").map(String::as_str)
    }
}

/// Parameters for creating and confirming a payment intent.
#[derive(Debug, Clone)]
pub struct PaymentIntentSpec {
    /// Amount in minor units.
    pub amount_minor: i64,
    /// ISO currency code, lowercase.
    pub currency: String,
    pub customer: Option<String>,
    pub payment_method: Option<String>,
    /// Charge without the cardholder present.
    pub off_session: bool,
}

/// One actual charge attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub customer: Option<String>,
    pub payment_method: Option<String>,
    pub status: PaymentIntentStatus,
}

/// Payment intent status reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    RequiresConfirmation,
    Succeeded,
    Failed,
    #[serde(untagged)]
    Other(String),
}

/// Verified, normalized webhook event.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub id: String,
    pub event_type: WebhookEventType,
    pub data: WebhookEventData,
    pub created_at: i64,
}

/// Webhook event types this service reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventType {
    CheckoutSessionCompleted,
    PaymentIntentSucceeded,
    Unknown(String),
}

/// Normalized webhook payload, parsed and validated at the trust boundary.
#[derive(Debug, Clone)]
pub enum WebhookEventData {
    Checkout {
        session_id: String,
        client_reference_id: Option<String>,
        setup_intent_id: Option<String>,
    },
    PaymentIntent {
        payment_intent_id: String,
        amount_minor: i64,
        customer_id: Option<String>,
    },
    Raw {
        json: String,
    },
}

/// Errors from processor operations.
#[derive(Debug, Clone)]
pub struct ProcessorError {
    pub code: ProcessorErrorCode,
    pub message: String,
}

impl ProcessorError {
    pub fn new(code: ProcessorErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProcessorErrorCode::Network, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(ProcessorErrorCode::Provider, message)
    }

    pub fn card_declined(message: impl Into<String>) -> Self {
        Self::new(ProcessorErrorCode::CardDeclined, message)
    }

    pub fn invalid_signature(message: impl Into<String>) -> Self {
        Self::new(ProcessorErrorCode::InvalidSignature, message)
    }

    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::new(ProcessorErrorCode::InvalidPayload, message)
    }

    /// Whether the processor declined the card itself, as opposed to failing
    /// the call.
    pub fn is_card_error(&self) -> bool {
        self.code == ProcessorErrorCode::CardDeclined
    }
}

impl std::fmt::Display for ProcessorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ProcessorError {}

/// Processor error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorErrorCode {
    /// Connectivity failure before a processor response.
    Network,
    /// The processor declined the card.
    CardDeclined,
    /// Webhook signature did not verify.
    InvalidSignature,
    /// Webhook payload did not parse.
    InvalidPayload,
    /// The processor rejected or failed the call.
    Provider,
}

impl std::fmt::Display for ProcessorErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProcessorErrorCode::Network => "network_error",
            ProcessorErrorCode::CardDeclined => "card_declined",
            ProcessorErrorCode::InvalidSignature => "invalid_signature",
            ProcessorErrorCode::InvalidPayload => "invalid_payload",
            ProcessorErrorCode::Provider => "provider_error",
        };
        f.write_str(s)
    }
}

impl From<ProcessorError> for PaymentFlowError {
    /// Default mapping for flows where the processor acts on our behalf:
    /// a card decline belongs to the cardholder, everything else is a
    /// processor-side failure. Caller-driven flows (start/end) remap to
    /// `Rejected` explicitly.
    fn from(err: ProcessorError) -> Self {
        match err.code {
            ProcessorErrorCode::CardDeclined => PaymentFlowError::Card(err.message),
            ProcessorErrorCode::InvalidSignature => PaymentFlowError::InvalidSignature(err.message),
            ProcessorErrorCode::InvalidPayload => PaymentFlowError::InvalidPayload(err.message),
            ProcessorErrorCode::Network | ProcessorErrorCode::Provider => {
                PaymentFlowError::Processor(err.message)
            }
        }
    }
}
