//! Stripe payment processor adapter.
//!
//! Implements the `PaymentProcessor` trait for Stripe API integration.
//! Handles checkout sessions, payment methods, setup/payment intents, and
//! webhook verification.
//!
//! # Security
//!
//! - HMAC-SHA256 signature verification with constant-time comparison
//! - Timestamp validation (5-minute window) for replay attack prevention
//! - Secrets handled via `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(secret_key, webhook_secret);
//! let gateway = StripeGateway::new(config);
//! ```

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::domain::payment::CheckoutMode;
use crate::ports::{
    CheckoutSession, CheckoutSessionSpec, PaymentIntent, PaymentIntentSpec, PaymentIntentStatus,
    PaymentMethod, PaymentProcessor, ProcessorError, SetupIntent, WebhookEvent, WebhookEventData,
    WebhookEventType,
};

use super::webhook_types::{
    hex_encode, SignatureHeader, StripeCheckoutSession, StripeErrorResponse, StripePaymentIntent,
    StripePaymentMethod, StripeSetupIntent, StripeWebhookEvent,
};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook events (5 minutes).
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    secret_key: SecretString,

    /// Webhook signing secret (whsec_...).
    webhook_secret: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Whether to require livemode events in production.
    require_livemode: bool,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(secret_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            secret_key: SecretString::new(secret_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: "https://api.stripe.com".to_string(),
            require_livemode: false,
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Require livemode events in production.
    pub fn with_require_livemode(mut self, require: bool) -> Self {
        self.require_livemode = require;
        self
    }
}

/// Stripe payment processor adapter.
///
/// Implements `PaymentProcessor` for Stripe API integration.
pub struct StripeGateway {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeGateway {
    /// Create a new Stripe gateway with the given configuration.
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Turn a non-2xx Stripe response into a `ProcessorError`.
    ///
    /// Card declines are distinguished from API failures via the error
    /// envelope's `type` field.
    async fn error_from_response(&self, response: reqwest::Response) -> ProcessorError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if let Ok(envelope) = serde_json::from_str::<StripeErrorResponse>(&body) {
            return map_error_envelope(status, envelope);
        }

        tracing::error!(status = %status, body = %body, "Stripe API call failed");
        ProcessorError::provider(format!("Stripe API error (status {}): {}", status, body))
    }

    /// Decode a successful Stripe response body.
    async fn decode<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ProcessorError> {
        response.json().await.map_err(|e| {
            ProcessorError::provider(format!("Failed to parse Stripe response: {}", e))
        })
    }

    /// POST a form-encoded request to the Stripe API.
    async fn post_form(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<reqwest::Response, ProcessorError> {
        let url = format!("{}{}", self.config.api_base_url, path);
        self.http_client
            .post(&url)
            .basic_auth(self.config.secret_key.expose_secret(), Option::<&str>::None)
            .form(params)
            .send()
            .await
            .map_err(|e| ProcessorError::network(e.to_string()))
    }

    /// GET a resource from the Stripe API.
    async fn get(&self, path: &str) -> Result<reqwest::Response, ProcessorError> {
        let url = format!("{}{}", self.config.api_base_url, path);
        self.http_client
            .get(&url)
            .basic_auth(self.config.secret_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| ProcessorError::network(e.to_string()))
    }

    /// Verify webhook signature using HMAC-SHA256.
    ///
    /// # Security
    ///
    /// - Uses constant-time comparison to prevent timing attacks
    /// - Validates timestamp to prevent replay attacks
    fn verify_signature(
        &self,
        payload: &[u8],
        header: &SignatureHeader,
    ) -> Result<(), ProcessorError> {
        // 1. Validate timestamp (prevent replay attacks)
        let now = chrono::Utc::now().timestamp();
        let age = now - header.timestamp;

        if age > MAX_TIMESTAMP_AGE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                age_secs = age,
                "Webhook event too old - possible replay attack"
            );
            return Err(ProcessorError::invalid_signature(format!(
                "Event too old ({} seconds)",
                age
            )));
        }

        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                "Webhook event from future - clock skew or manipulation"
            );
            return Err(ProcessorError::invalid_signature(
                "Event timestamp in future",
            ));
        }

        // 2. Compute expected signature
        let signed_payload = format!(
            "{}.{}",
            header.timestamp,
            String::from_utf8_lossy(payload)
        );

        let mut mac = HmacSha256::new_from_slice(
            self.config.webhook_secret.expose_secret().as_bytes(),
        )
        .expect("HMAC can take key of any size");

        mac.update(signed_payload.as_bytes());
        let expected = mac.finalize().into_bytes();

        // 3. Constant-time comparison
        let expected_bytes: &[u8] = expected.as_slice();
        let provided_bytes: &[u8] = &header.v1_signature;

        if expected_bytes.ct_eq(provided_bytes).unwrap_u8() != 1 {
            tracing::warn!(
                expected_signature = %hex_encode(expected_bytes),
                "Invalid webhook signature"
            );
            return Err(ProcessorError::invalid_signature("Invalid signature"));
        }

        Ok(())
    }

    /// Parse a Stripe event and convert to domain types.
    fn parse_event(&self, payload: &[u8]) -> Result<WebhookEvent, ProcessorError> {
        let stripe_event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse webhook payload");
            ProcessorError::invalid_payload(format!("Invalid JSON: {}", e))
        })?;

        // Check livemode if required
        if self.config.require_livemode && !stripe_event.livemode {
            tracing::warn!(
                event_id = %stripe_event.id,
                "Rejected test mode event in production"
            );
            return Err(ProcessorError::invalid_payload(
                "Test mode events not allowed in production",
            ));
        }

        // Convert event type
        let event_type = match stripe_event.event_type.as_str() {
            "checkout.session.completed" => WebhookEventType::CheckoutSessionCompleted,
            "payment_intent.succeeded" => WebhookEventType::PaymentIntentSucceeded,
            other => WebhookEventType::Unknown(other.to_string()),
        };

        // Convert event data based on type
        let data = self.extract_event_data(&stripe_event)?;

        Ok(WebhookEvent {
            id: stripe_event.id,
            event_type,
            data,
            created_at: stripe_event.created,
        })
    }

    /// Extract event data from Stripe event into domain format.
    fn extract_event_data(
        &self,
        event: &StripeWebhookEvent,
    ) -> Result<WebhookEventData, ProcessorError> {
        match event.event_type.as_str() {
            "checkout.session.completed" => {
                let session: StripeCheckoutSession =
                    serde_json::from_value(event.data.object.clone()).map_err(|e| {
                        ProcessorError::invalid_payload(format!("Invalid checkout session: {}", e))
                    })?;

                Ok(WebhookEventData::Checkout {
                    session_id: session.id,
                    client_reference_id: session.client_reference_id,
                    setup_intent_id: session.setup_intent,
                })
            }

            "payment_intent.succeeded" => {
                let intent: StripePaymentIntent =
                    serde_json::from_value(event.data.object.clone()).map_err(|e| {
                        ProcessorError::invalid_payload(format!("Invalid payment intent: {}", e))
                    })?;

                Ok(WebhookEventData::PaymentIntent {
                    payment_intent_id: intent.id,
                    amount_minor: intent.amount,
                    customer_id: intent.customer,
                })
            }

            _ => {
                // Return raw JSON for unknown event types
                Ok(WebhookEventData::Raw {
                    json: serde_json::to_string(&event.data.object).unwrap_or_default(),
                })
            }
        }
    }
}

/// Map a decoded Stripe error envelope to a `ProcessorError`.
fn map_error_envelope(
    status: reqwest::StatusCode,
    envelope: StripeErrorResponse,
) -> ProcessorError {
    let is_card = envelope.error.is_card_error();
    let message = envelope
        .error
        .message
        .unwrap_or_else(|| format!("Stripe API error (status {})", status));

    if is_card {
        tracing::warn!(status = %status, error = %message, "Stripe declined the card");
        ProcessorError::card_declined(message)
    } else {
        tracing::error!(status = %status, error = %message, "Stripe API call failed");
        ProcessorError::provider(message)
    }
}

/// Map a Stripe checkout session wire object to the port type.
fn map_checkout_session(session: StripeCheckoutSession) -> CheckoutSession {
    CheckoutSession {
        id: session.id,
        url: session.url,
        mode: session.mode,
        client_reference_id: session.client_reference_id,
        setup_intent: session.setup_intent,
        amount_total: session.amount_total,
        metadata: session.metadata,
    }
}

/// Map a Stripe setup intent wire object to the port type.
fn map_setup_intent(intent: StripeSetupIntent) -> SetupIntent {
    SetupIntent {
        id: intent.id,
        customer: intent.customer,
        payment_method: intent.payment_method,
        client_secret: intent.client_secret,
        metadata: intent.metadata,
    }
}

/// Map a Stripe payment intent wire object to the port type.
fn map_payment_intent(intent: StripePaymentIntent) -> PaymentIntent {
    let status = match intent.status.as_str() {
        "succeeded" => PaymentIntentStatus::Succeeded,
        "requires_confirmation" => PaymentIntentStatus::RequiresConfirmation,
        "canceled" => PaymentIntentStatus::Failed,
        other => PaymentIntentStatus::Other(other.to_string()),
    };

    PaymentIntent {
        id: intent.id,
        amount: intent.amount,
        currency: intent.currency,
        customer: intent.customer,
        payment_method: intent.payment_method,
        status,
    }
}

#[async_trait]
impl PaymentProcessor for StripeGateway {
    async fn create_checkout_session(
        &self,
        spec: CheckoutSessionSpec,
    ) -> Result<CheckoutSession, ProcessorError> {
        let mut params = vec![
            ("mode", spec.mode.as_str().to_string()),
            ("success_url", spec.success_url),
            ("cancel_url", spec.cancel_url),
            ("client_reference_id", spec.client_reference_id),
            ("metadata[payment_type]", spec.payment_type),
        ];

        // Setup-mode sessions carry no line items; the charge comes later.
        if spec.mode == CheckoutMode::Payment {
            params.extend([
                ("line_items[0][price_data][currency]", spec.currency),
                (
                    "line_items[0][price_data][product_data][name]",
                    spec.description,
                ),
                (
                    "line_items[0][price_data][unit_amount]",
                    spec.amount_minor.to_string(),
                ),
                ("line_items[0][quantity]", "1".to_string()),
            ]);
        }

        let response = self.post_form("/v1/checkout/sessions", &params).await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        let session: StripeCheckoutSession = self.decode(response).await?;
        Ok(map_checkout_session(session))
    }

    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, ProcessorError> {
        let response = self
            .get(&format!("/v1/checkout/sessions/{}", session_id))
            .await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        let session: StripeCheckoutSession = self.decode(response).await?;
        Ok(map_checkout_session(session))
    }

    async fn create_payment_method(
        &self,
        card_token: &str,
    ) -> Result<PaymentMethod, ProcessorError> {
        let params = [
            ("type", "card".to_string()),
            ("card[token]", card_token.to_string()),
        ];

        let response = self.post_form("/v1/payment_methods", &params).await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        let method: StripePaymentMethod = self.decode(response).await?;
        Ok(PaymentMethod { id: method.id })
    }

    async fn attach_payment_method(
        &self,
        payment_method_id: &str,
        customer_id: &str,
    ) -> Result<(), ProcessorError> {
        let params = [("customer", customer_id.to_string())];

        let response = self
            .post_form(
                &format!("/v1/payment_methods/{}/attach", payment_method_id),
                &params,
            )
            .await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        Ok(())
    }

    async fn create_setup_intent(
        &self,
        customer_id: &str,
        payment_method_id: &str,
        client_id: &str,
    ) -> Result<SetupIntent, ProcessorError> {
        let params = [
            ("customer", customer_id.to_string()),
            ("payment_method", payment_method_id.to_string()),
            ("confirm", "true".to_string()),
            ("metadata[client_id]", client_id.to_string()),
        ];

        let response = self.post_form("/v1/setup_intents", &params).await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        let intent: StripeSetupIntent = self.decode(response).await?;
        Ok(map_setup_intent(intent))
    }

    async fn retrieve_setup_intent(
        &self,
        setup_intent_id: &str,
    ) -> Result<SetupIntent, ProcessorError> {
        let response = self
            .get(&format!("/v1/setup_intents/{}", setup_intent_id))
            .await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        let intent: StripeSetupIntent = self.decode(response).await?;
        Ok(map_setup_intent(intent))
    }

    async fn create_payment_intent(
        &self,
        spec: PaymentIntentSpec,
    ) -> Result<PaymentIntent, ProcessorError> {
        let mut params = vec![
            ("amount", spec.amount_minor.to_string()),
            ("currency", spec.currency),
            ("confirm", "true".to_string()),
        ];

        if spec.off_session {
            params.push(("off_session", "true".to_string()));
        }
        if let Some(customer) = spec.customer {
            params.push(("customer", customer));
        }
        if let Some(payment_method) = spec.payment_method {
            params.push(("payment_method", payment_method));
        }

        let response = self.post_form("/v1/payment_intents", &params).await?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        let intent: StripePaymentIntent = self.decode(response).await?;
        Ok(map_payment_intent(intent))
    }

    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, ProcessorError> {
        // 1. Parse signature header
        let header = SignatureHeader::parse(signature).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse Stripe-Signature header");
            ProcessorError::invalid_signature(e.to_string())
        })?;

        // 2. Verify signature (includes timestamp validation)
        self.verify_signature(payload, &header)?;

        // 3. Parse and convert event
        let webhook_event = self.parse_event(payload)?;

        tracing::info!(
            event_id = %webhook_event.id,
            event_type = ?webhook_event.event_type,
            "Webhook signature verified"
        );

        Ok(webhook_event)
    }
}
