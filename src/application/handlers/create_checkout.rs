//! CreateCheckoutHandler - creates a processor checkout session from a
//! payment request.

use std::sync::Arc;

use crate::domain::payment::{PaymentFlowError, PaymentType};
use crate::ports::{CheckoutSessionSpec, PaymentProcessor};

/// Command to create a checkout session.
#[derive(Debug, Clone)]
pub struct CreateCheckoutCommand {
    /// Declared payment type ("estimated", "fixed" or "dynamic").
    pub payment_type: String,
    /// Amount in major units; required iff the type is fixed.
    pub amount: Option<f64>,
    /// ISO currency code, lowercase.
    pub currency: String,
    /// Caller's client identifier.
    pub client_id: String,
    /// Product description shown on the hosted page.
    pub description: String,
}

/// Result of checkout creation.
#[derive(Debug, Clone)]
pub struct CreateCheckoutResult {
    pub session_id: String,
    pub url: String,
}

/// Handler creating checkout sessions via the payment processor.
pub struct CreateCheckoutHandler {
    processor: Arc<dyn PaymentProcessor>,
    /// Public base URL used to build the success/cancel redirects.
    base_url: String,
}

impl CreateCheckoutHandler {
    pub fn new(processor: Arc<dyn PaymentProcessor>, base_url: impl Into<String>) -> Self {
        Self {
            processor,
            base_url: base_url.into(),
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutCommand,
    ) -> Result<CreateCheckoutResult, PaymentFlowError> {
        // Reject unsupported types and missing amounts before touching the
        // processor.
        let payment_type = PaymentType::parse(&cmd.payment_type)?;
        let plan = payment_type.resolve(cmd.amount)?;

        tracing::info!(
            payment_type = %payment_type,
            amount_minor = plan.amount_minor,
            mode = plan.mode.as_str(),
            client_id = %cmd.client_id,
            "Creating checkout session"
        );

        // The {CHECKOUT_SESSION_ID} placeholder is substituted by the
        // processor at redirect time.
        let spec = CheckoutSessionSpec {
            currency: cmd.currency,
            description: cmd.description,
            amount_minor: plan.amount_minor,
            mode: plan.mode,
            success_url: format!(
                "{}/success?session_id={{CHECKOUT_SESSION_ID}}",
                self.base_url
            ),
            cancel_url: format!("{}/cancel", self.base_url),
            client_reference_id: cmd.client_id,
            payment_type: payment_type.as_str().to_string(),
        };

        let session = self.processor.create_checkout_session(spec).await?;

        let url = session.url.ok_or_else(|| {
            PaymentFlowError::Internal("checkout session created without a URL".to_string())
        })?;

        tracing::info!(session_id = %session.id, "Checkout session created");

        Ok(CreateCheckoutResult {
            session_id: session.id,
            url,
        })
    }
}
