//! ProcessWebhookHandler - verifies processor webhooks and relays normalized
//! events to the CSMS.

use std::sync::Arc;

use crate::domain::payment::{CsmsEvent, PaymentFlowError};
use crate::ports::{CsmsNotifier, PaymentProcessor, WebhookEventData, WebhookEventType};

use super::notify_best_effort;

/// Command carrying a raw webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    /// Raw request body, exactly as signed by the processor.
    pub payload: Vec<u8>,
    /// Signature header value.
    pub signature: String,
}

/// Acknowledgement returned to the webhook sender.
#[derive(Debug, Clone)]
pub struct WebhookAck {
    pub success: bool,
}

/// Handler for inbound processor webhooks.
///
/// Signature verification happens before any event data is trusted. Once an
/// event verifies, it is always acknowledged: a CSMS delivery failure must
/// not make the processor re-deliver the webhook.
pub struct ProcessWebhookHandler {
    processor: Arc<dyn PaymentProcessor>,
    notifier: Arc<dyn CsmsNotifier>,
}

impl ProcessWebhookHandler {
    pub fn new(processor: Arc<dyn PaymentProcessor>, notifier: Arc<dyn CsmsNotifier>) -> Self {
        Self {
            processor,
            notifier,
        }
    }

    pub async fn handle(&self, cmd: ProcessWebhookCommand) -> Result<WebhookAck, PaymentFlowError> {
        let event = self
            .processor
            .verify_webhook(&cmd.payload, &cmd.signature)
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "Webhook rejected");
                PaymentFlowError::from(err)
            })?;

        tracing::info!(
            event_id = %event.id,
            event_type = ?event.event_type,
            "Webhook verified"
        );

        match (&event.event_type, &event.data) {
            (
                WebhookEventType::CheckoutSessionCompleted,
                WebhookEventData::Checkout {
                    session_id,
                    client_reference_id,
                    setup_intent_id,
                },
            ) => {
                notify_best_effort(
                    self.notifier.as_ref(),
                    &CsmsEvent::SessionCompleted {
                        session_id: session_id.clone(),
                        client_id: client_reference_id.clone(),
                        setup_intent_id: setup_intent_id.clone(),
                    },
                )
                .await;
            }
            (
                WebhookEventType::PaymentIntentSucceeded,
                WebhookEventData::PaymentIntent {
                    payment_intent_id,
                    amount_minor,
                    customer_id,
                },
            ) => {
                notify_best_effort(
                    self.notifier.as_ref(),
                    &CsmsEvent::PaymentSucceeded {
                        payment_intent_id: payment_intent_id.clone(),
                        amount_minor: *amount_minor,
                        client_id: customer_id.clone(),
                    },
                )
                .await;
            }
            (WebhookEventType::Unknown(other), _) => {
                tracing::debug!(event_type = %other, "Ignoring unhandled webhook event");
            }
            // A known type whose payload did not normalize as expected is the
            // gateway's bug, not the sender's; acknowledge and log.
            (event_type, _) => {
                tracing::error!(
                    event_type = ?event_type,
                    "Webhook event data did not match its type"
                );
            }
        }

        Ok(WebhookAck { success: true })
    }
}
