//! HTTP DTOs (Data Transfer Objects) for payment endpoints.
//!
//! These types define the JSON request/response structure for the payment API.
//! They serve as the boundary between HTTP and the application layer.

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create a checkout session.
///
/// `payment_type` stays a string here so unknown values reach the application
/// layer and come back as a structured 400 instead of a serde rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    /// Declared payment type ("estimated", "fixed" or "dynamic").
    pub payment_type: String,
    /// Amount in major units; required iff the type is fixed.
    #[serde(default)]
    pub amount: Option<f64>,
    /// ISO currency code, lowercase.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Caller's client identifier.
    pub client_id: String,
    /// Product description shown on the hosted checkout page.
    #[serde(default = "default_description")]
    pub description: String,
}

fn default_currency() -> String {
    "eur".to_string()
}

fn default_description() -> String {
    "EV charging session".to_string()
}

/// Request to start a dynamic charging session.
#[derive(Debug, Clone, Deserialize)]
pub struct StartSessionRequest {
    /// Processor customer id.
    pub client_id: String,
    /// One-time card token from the payment page.
    pub payment_token: String,
}

/// Request to end a dynamic charging session with a metered amount.
#[derive(Debug, Clone, Deserialize)]
pub struct EndSessionRequest {
    /// Setup intent handle returned by the start endpoint.
    pub setup_intent_id: String,
    /// Final amount in minor units.
    pub final_amount: i64,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response for checkout creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentResponse {
    /// The checkout session ID.
    pub session_id: String,
    /// The hosted checkout page URL.
    pub url: String,
}

/// Response for webhook acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub success: bool,
}

/// Response for the CSMS notification sink.
#[derive(Debug, Clone, Serialize)]
pub struct CsmsNotificationResponse {
    pub status: &'static str,
}

/// Response for starting a dynamic session.
#[derive(Debug, Clone, Serialize)]
pub struct StartSessionResponse {
    pub setup_intent_id: String,
    /// Client secret for browser-side confirmation, if the processor
    /// issued one.
    pub client_secret: Option<String>,
}

/// Response for finalizing a dynamic charge.
#[derive(Debug, Clone, Serialize)]
pub struct FinishChargeResponse {
    pub status: &'static str,
    /// Amount charged, in major units.
    pub amount_paid: f64,
    pub payment_intent_id: String,
}

/// Response for ending a dynamic session.
#[derive(Debug, Clone, Serialize)]
pub struct EndSessionResponse {
    pub status: &'static str,
    pub payment_intent_id: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Response DTO
// ════════════════════════════════════════════════════════════════════════════════

/// Standard error response for API errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
