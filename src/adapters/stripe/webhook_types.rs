//! Stripe-specific wire types.
//!
//! These types represent Stripe API objects as they arrive in API responses
//! and webhook payloads. They are designed to:
//! - Parse actual Stripe JSON accurately
//! - Map to domain types for further processing
//! - Support idempotency via event IDs

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════════
// Signature Parsing
// ════════════════════════════════════════════════════════════════════════════════

/// Error parsing the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureParseError {
    /// Header is empty or missing.
    MissingHeader,
    /// Missing timestamp component (t=...).
    MissingTimestamp,
    /// Missing v1 signature component.
    MissingV1Signature,
    /// Invalid timestamp format.
    InvalidTimestamp,
    /// Invalid signature format (not valid hex).
    InvalidSignatureFormat,
}

impl std::fmt::Display for SignatureParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "Missing Stripe-Signature header"),
            Self::MissingTimestamp => write!(f, "Missing timestamp (t=) in signature"),
            Self::MissingV1Signature => write!(f, "Missing v1 signature in header"),
            Self::InvalidTimestamp => write!(f, "Invalid timestamp format"),
            Self::InvalidSignatureFormat => write!(f, "Invalid signature format (not valid hex)"),
        }
    }
}

impl std::error::Error for SignatureParseError {}

/// Parsed Stripe-Signature header components.
///
/// The header format is: `t=timestamp,v1=signature[,v0=legacy_signature]`
#[derive(Debug, Clone)]
pub struct SignatureHeader {
    /// Unix timestamp when Stripe generated the event.
    pub timestamp: i64,

    /// Primary v1 signature (HMAC-SHA256, hex-encoded).
    pub v1_signature: Vec<u8>,

    /// Legacy v0 signature (deprecated, may be absent).
    pub v0_signature: Option<Vec<u8>>,
}

impl SignatureHeader {
    /// Parse a Stripe-Signature header into components.
    ///
    /// # Format
    ///
    /// ```text
    /// t=<timestamp>,v1=<signature>[,v0=<legacy_signature>]
    /// ```
    pub fn parse(header: &str) -> Result<Self, SignatureParseError> {
        if header.is_empty() {
            return Err(SignatureParseError::MissingHeader);
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;
        let mut v0_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or(SignatureParseError::MissingTimestamp)?;

            match key.trim() {
                "t" => {
                    timestamp = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| SignatureParseError::InvalidTimestamp)?,
                    );
                }
                "v1" => {
                    v1_signature = Some(
                        hex_decode(value.trim())
                            .ok_or(SignatureParseError::InvalidSignatureFormat)?,
                    );
                }
                "v0" => {
                    v0_signature = Some(
                        hex_decode(value.trim())
                            .ok_or(SignatureParseError::InvalidSignatureFormat)?,
                    );
                }
                _ => {
                    // Ignore unknown fields for forward compatibility
                }
            }
        }

        Ok(Self {
            timestamp: timestamp.ok_or(SignatureParseError::MissingTimestamp)?,
            v1_signature: v1_signature.ok_or(SignatureParseError::MissingV1Signature)?,
            v0_signature,
        })
    }
}

/// Decode a hex string to bytes.
fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    // The header is attacker-controlled; multi-byte characters must fail the
    // parse, not the slicing.
    if !hex.is_ascii() || hex.len() % 2 != 0 {
        return None;
    }

    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        let byte = u8::from_str_radix(&hex[i..i + 2], 16).ok()?;
        bytes.push(byte);
    }
    Some(bytes)
}

/// Encode bytes to hex string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// ════════════════════════════════════════════════════════════════════════════════
// Stripe Event Types
// ════════════════════════════════════════════════════════════════════════════════

/// Raw Stripe webhook event as received from the API.
///
/// This represents the full event envelope containing metadata and payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeWebhookEvent {
    /// Unique event identifier (evt_...).
    pub id: String,

    /// Event type (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix timestamp when the event was created.
    pub created: i64,

    /// Event payload containing the affected object.
    pub data: StripeEventData,

    /// Whether this is a live or test event.
    pub livemode: bool,

    /// Stripe API version used for this event.
    pub api_version: Option<String>,

    /// Number of retries for this webhook delivery.
    #[serde(default)]
    pub pending_webhooks: i32,
}

/// Event data container.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object affected by this event.
    pub object: serde_json::Value,

    /// Previous values for updated fields (on update events).
    pub previous_attributes: Option<serde_json::Value>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Stripe Object Types
// ════════════════════════════════════════════════════════════════════════════════

/// Stripe Checkout Session object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCheckoutSession {
    /// Unique session identifier (cs_...).
    pub id: String,

    /// Object type (always "checkout.session").
    pub object: String,

    /// Payment mode (payment, setup, subscription).
    pub mode: String,

    /// Hosted checkout page URL; present while the session is open.
    pub url: Option<String>,

    /// Caller-supplied reference attached at creation.
    pub client_reference_id: Option<String>,

    /// Setup intent ID; present on completed setup-mode sessions.
    pub setup_intent: Option<String>,

    /// Total in minor units; absent for setup-mode sessions.
    pub amount_total: Option<i64>,

    /// Session payment status (paid, unpaid, no_payment_required).
    pub payment_status: Option<String>,

    /// Session status (open, complete, expired).
    pub status: Option<String>,

    /// Custom metadata attached to the session.
    #[serde(default)]
    pub metadata: std::collections::HashMap<String, String>,
}

/// Stripe PaymentMethod object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePaymentMethod {
    /// Unique payment method identifier (pm_...).
    pub id: String,

    /// Object type (always "payment_method").
    pub object: String,

    /// Payment method kind ("card").
    #[serde(rename = "type")]
    pub method_type: Option<String>,

    /// Customer the method is attached to.
    pub customer: Option<String>,
}

/// Stripe SetupIntent object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSetupIntent {
    /// Unique setup intent identifier (seti_...).
    pub id: String,

    /// Object type (always "setup_intent").
    pub object: String,

    /// Customer the intent belongs to.
    pub customer: Option<String>,

    /// Payment method being set up.
    pub payment_method: Option<String>,

    /// Client secret for browser-side confirmation.
    pub client_secret: Option<String>,

    /// Intent status (requires_confirmation, succeeded, ...).
    pub status: Option<String>,

    /// Custom metadata attached to the intent.
    #[serde(default)]
    pub metadata: std::collections::HashMap<String, String>,
}

/// Stripe PaymentIntent object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePaymentIntent {
    /// Unique payment intent identifier (pi_...).
    pub id: String,

    /// Object type (always "payment_intent").
    pub object: String,

    /// Amount in minor units.
    pub amount: i64,

    /// Currency (lowercase, e.g., "eur").
    pub currency: String,

    /// Customer being charged.
    pub customer: Option<String>,

    /// Payment method used for the charge.
    pub payment_method: Option<String>,

    /// Intent status (succeeded, requires_confirmation, canceled, ...).
    pub status: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// API Error Envelope
// ════════════════════════════════════════════════════════════════════════════════

/// Stripe API error envelope returned on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeApiError,
}

/// The error body inside a Stripe error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeApiError {
    /// Error category ("card_error", "invalid_request_error", ...).
    #[serde(rename = "type")]
    pub error_type: Option<String>,

    /// Human-readable error message.
    pub message: Option<String>,

    /// Machine-readable error code ("card_declined", ...).
    pub code: Option<String>,
}

impl StripeApiError {
    /// Whether the card itself was declined, as opposed to a bad API call.
    pub fn is_card_error(&self) -> bool {
        self.error_type.as_deref() == Some("card_error")
    }
}
