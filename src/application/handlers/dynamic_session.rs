//! DynamicSessionHandler - the dynamic charging session lifecycle.
//!
//! A dynamic payment runs in two phases: `start` pre-authorizes a payment
//! method with a setup intent, then either `finalize` (keyed by the checkout
//! session id) or `end` (keyed by the setup intent id, with a metered final
//! amount) creates and confirms the actual charge.
//!
//! Conceptual states: NotStarted -> Authorized -> Finalized | Failed. None of
//! it is persisted here; the processor's intents are the source of truth.
//! Repeated finalize/end calls are not deduplicated by this service - the
//! processor rejects re-confirmation of an already-confirmed intent.

use std::sync::Arc;

use crate::domain::payment::{CsmsEvent, PaymentFlowError};
use crate::ports::{CsmsNotifier, PaymentIntentSpec, PaymentProcessor, ProcessorError, SetupIntent};

use super::notify_best_effort;

/// Amount charged by `finalize`, in minor units (15.00 EUR).
pub const FINALIZE_AMOUNT_MINOR: i64 = 1500;

/// Currency for dynamic charges.
const CHARGE_CURRENCY: &str = "eur";

/// Command to start a dynamic charging session.
#[derive(Debug, Clone)]
pub struct StartSessionCommand {
    /// Processor customer id the payment method is attached to.
    pub client_id: String,
    /// One-time card token from the payment page.
    pub payment_token: String,
}

/// Pre-authorization handle returned by `start`.
#[derive(Debug, Clone)]
pub struct SessionAuthorization {
    pub setup_intent_id: String,
    pub client_secret: Option<String>,
}

/// Result of `finalize`.
#[derive(Debug, Clone)]
pub struct FinalizeResult {
    /// Amount charged, in major units.
    pub amount_paid: f64,
    pub payment_intent_id: String,
}

/// Command to end a session with a metered final amount.
#[derive(Debug, Clone)]
pub struct EndSessionCommand {
    pub setup_intent_id: String,
    /// Final amount in minor units, e.g. from a meter reading.
    pub final_amount_minor: i64,
}

/// Result of `end`.
#[derive(Debug, Clone)]
pub struct EndSessionResult {
    pub payment_intent_id: String,
}

/// Handler owning the dynamic session flows.
pub struct DynamicSessionHandler {
    processor: Arc<dyn PaymentProcessor>,
    notifier: Arc<dyn CsmsNotifier>,
}

impl DynamicSessionHandler {
    pub fn new(processor: Arc<dyn PaymentProcessor>, notifier: Arc<dyn CsmsNotifier>) -> Self {
        Self {
            processor,
            notifier,
        }
    }

    /// Authorize a payment method for a later charge.
    ///
    /// Any processor failure is the caller's to fix (bad token, unknown
    /// customer). A retried call may find the payment method already
    /// attached; that side effect is accepted.
    pub async fn start(
        &self,
        cmd: StartSessionCommand,
    ) -> Result<SessionAuthorization, PaymentFlowError> {
        tracing::info!(client_id = %cmd.client_id, "Starting dynamic charging session");

        let rejected = |err: ProcessorError| PaymentFlowError::Rejected(err.message);

        let payment_method = self
            .processor
            .create_payment_method(&cmd.payment_token)
            .await
            .map_err(rejected)?;

        self.processor
            .attach_payment_method(&payment_method.id, &cmd.client_id)
            .await
            .map_err(rejected)?;

        let setup_intent = self
            .processor
            .create_setup_intent(&cmd.client_id, &payment_method.id, &cmd.client_id)
            .await
            .map_err(rejected)?;

        tracing::info!(
            setup_intent_id = %setup_intent.id,
            client_id = %cmd.client_id,
            "Dynamic session authorized"
        );

        Ok(SessionAuthorization {
            setup_intent_id: setup_intent.id,
            client_secret: setup_intent.client_secret,
        })
    }

    /// Charge the fixed finalize amount against a completed checkout
    /// session's setup intent.
    ///
    /// Exactly one CSMS notification is attempted per terminal outcome,
    /// before the result is returned; its failure never changes the result.
    pub async fn finalize(&self, session_id: &str) -> Result<FinalizeResult, PaymentFlowError> {
        tracing::info!(session_id = %session_id, "Finalizing dynamic charge");

        match self.finalize_inner(session_id).await {
            Ok((payment_intent_id, client_id)) => {
                let amount_paid = FINALIZE_AMOUNT_MINOR as f64 / 100.0;
                notify_best_effort(
                    self.notifier.as_ref(),
                    &CsmsEvent::ChargeCompleted {
                        session_id: Some(session_id.to_string()),
                        setup_intent_id: None,
                        payment_intent_id: payment_intent_id.clone(),
                        amount_paid,
                        client_id,
                    },
                )
                .await;

                tracing::info!(
                    session_id = %session_id,
                    payment_intent_id = %payment_intent_id,
                    "Dynamic charge finalized"
                );

                Ok(FinalizeResult {
                    amount_paid,
                    payment_intent_id,
                })
            }
            Err(err) => {
                tracing::error!(session_id = %session_id, error = %err, "Dynamic charge failed");
                notify_best_effort(
                    self.notifier.as_ref(),
                    &CsmsEvent::ChargeFailed {
                        session_id: Some(session_id.to_string()),
                        setup_intent_id: None,
                        error: err.to_string(),
                    },
                )
                .await;
                Err(err)
            }
        }
    }

    async fn finalize_inner(
        &self,
        session_id: &str,
    ) -> Result<(String, Option<String>), PaymentFlowError> {
        let session = self.processor.retrieve_checkout_session(session_id).await?;

        let setup_intent_id = session.setup_intent.ok_or_else(|| {
            PaymentFlowError::InvalidRequest(format!(
                "checkout session {session_id} has no setup intent"
            ))
        })?;

        let setup_intent = self.processor.retrieve_setup_intent(&setup_intent_id).await?;

        let payment_intent = self
            .confirm_charge(&setup_intent, FINALIZE_AMOUNT_MINOR)
            .await?;

        Ok((
            payment_intent.id,
            setup_intent.client_id().map(str::to_string),
        ))
    }

    /// Charge a caller-supplied metered amount against a setup intent.
    ///
    /// Per the API contract all processor failures on this path answer 400:
    /// the caller supplied both the intent id and the amount.
    pub async fn end(&self, cmd: EndSessionCommand) -> Result<EndSessionResult, PaymentFlowError> {
        tracing::info!(
            setup_intent_id = %cmd.setup_intent_id,
            final_amount_minor = cmd.final_amount_minor,
            "Ending dynamic charging session"
        );

        if cmd.final_amount_minor <= 0 {
            return Err(PaymentFlowError::InvalidRequest(
                "final_amount must be positive".to_string(),
            ));
        }

        match self.end_inner(&cmd).await {
            Ok((payment_intent_id, client_id)) => {
                notify_best_effort(
                    self.notifier.as_ref(),
                    &CsmsEvent::ChargeCompleted {
                        session_id: None,
                        setup_intent_id: Some(cmd.setup_intent_id.clone()),
                        payment_intent_id: payment_intent_id.clone(),
                        amount_paid: cmd.final_amount_minor as f64 / 100.0,
                        client_id,
                    },
                )
                .await;

                Ok(EndSessionResult { payment_intent_id })
            }
            Err(err) => {
                tracing::error!(
                    setup_intent_id = %cmd.setup_intent_id,
                    error = %err,
                    "Ending dynamic session failed"
                );
                notify_best_effort(
                    self.notifier.as_ref(),
                    &CsmsEvent::ChargeFailed {
                        session_id: None,
                        setup_intent_id: Some(cmd.setup_intent_id.clone()),
                        error: err.to_string(),
                    },
                )
                .await;
                Err(err)
            }
        }
    }

    async fn end_inner(
        &self,
        cmd: &EndSessionCommand,
    ) -> Result<(String, Option<String>), PaymentFlowError> {
        let rejected = |err: ProcessorError| {
            if err.is_card_error() {
                PaymentFlowError::Card(err.message)
            } else {
                PaymentFlowError::Rejected(err.message)
            }
        };

        let setup_intent = self
            .processor
            .retrieve_setup_intent(&cmd.setup_intent_id)
            .await
            .map_err(rejected)?;

        let payment_intent = self
            .confirm_charge(&setup_intent, cmd.final_amount_minor)
            .await
            .map_err(|err| match err {
                // Downgrade processor-side failures: this path answers 400.
                PaymentFlowError::Processor(msg) => PaymentFlowError::Rejected(msg),
                other => other,
            })?;

        Ok((
            payment_intent.id,
            setup_intent.client_id().map(str::to_string),
        ))
    }

    /// Create and confirm an off-session payment intent against the setup
    /// intent's saved payment method.
    async fn confirm_charge(
        &self,
        setup_intent: &SetupIntent,
        amount_minor: i64,
    ) -> Result<crate::ports::PaymentIntent, PaymentFlowError> {
        let spec = PaymentIntentSpec {
            amount_minor,
            currency: CHARGE_CURRENCY.to_string(),
            // The customer recorded in the intent metadata at session start.
            customer: setup_intent.client_id().map(str::to_string),
            payment_method: setup_intent.payment_method.clone(),
            off_session: true,
        };

        let payment_intent = self.processor.create_payment_intent(spec).await?;

        tracing::info!(
            payment_intent_id = %payment_intent.id,
            amount_minor,
            "Payment intent created and confirmed"
        );

        Ok(payment_intent)
    }
}
