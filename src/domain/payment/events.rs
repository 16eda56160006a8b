//! Events relayed to the CSMS (charging session management system).
//!
//! These are ephemeral, fire-and-forget notifications: no delivery tracking,
//! no retry. Two distinct flows both report `payment_succeeded` with
//! different payloads (the processor webhook and the checkout success
//! redirect), so the wire shape is built per variant rather than derived.

use serde_json::{json, Value};

use super::PaymentType;

/// A payment lifecycle event for the CSMS.
#[derive(Debug, Clone, PartialEq)]
pub enum CsmsEvent {
    /// A checkout session completed (reported by the processor webhook).
    SessionCompleted {
        session_id: String,
        client_id: Option<String>,
        setup_intent_id: Option<String>,
    },
    /// A payment intent succeeded (reported by the processor webhook).
    /// Amount is in minor units, as delivered by the processor.
    PaymentSucceeded {
        payment_intent_id: String,
        amount_minor: i64,
        client_id: Option<String>,
    },
    /// A non-dynamic checkout settled (reported on the success redirect).
    /// Amount is in major units. Shares the `payment_succeeded` event type.
    CheckoutSettled {
        session_id: String,
        amount: f64,
        payment_type: PaymentType,
        client_id: Option<String>,
    },
    /// A dynamic charge was captured for its final amount.
    ChargeCompleted {
        session_id: Option<String>,
        setup_intent_id: Option<String>,
        payment_intent_id: String,
        amount_paid: f64,
        client_id: Option<String>,
    },
    /// A dynamic charge could not be captured.
    ChargeFailed {
        session_id: Option<String>,
        setup_intent_id: Option<String>,
        error: String,
    },
}

impl CsmsEvent {
    /// Wire-level event type string.
    pub fn event_type(&self) -> &'static str {
        match self {
            CsmsEvent::SessionCompleted { .. } => "session_completed",
            CsmsEvent::PaymentSucceeded { .. } | CsmsEvent::CheckoutSettled { .. } => {
                "payment_succeeded"
            }
            CsmsEvent::ChargeCompleted { .. } => "charge_completed",
            CsmsEvent::ChargeFailed { .. } => "charge_failed",
        }
    }

    /// Event payload as sent in the notification body's `data` field.
    pub fn payload(&self) -> Value {
        match self {
            CsmsEvent::SessionCompleted {
                session_id,
                client_id,
                setup_intent_id,
            } => json!({
                "session_id": session_id,
                "client_id": client_id,
                "setup_intent_id": setup_intent_id,
            }),
            CsmsEvent::PaymentSucceeded {
                payment_intent_id,
                amount_minor,
                client_id,
            } => json!({
                "payment_intent_id": payment_intent_id,
                "amount": amount_minor,
                "client_id": client_id,
            }),
            CsmsEvent::CheckoutSettled {
                session_id,
                amount,
                payment_type,
                client_id,
            } => json!({
                "session_id": session_id,
                "amount": amount,
                "payment_type": payment_type.as_str(),
                "client_id": client_id,
            }),
            CsmsEvent::ChargeCompleted {
                session_id,
                setup_intent_id,
                payment_intent_id,
                amount_paid,
                client_id,
            } => {
                let mut data = json!({
                    "payment_intent_id": payment_intent_id,
                    "amount_paid": amount_paid,
                    "client_id": client_id,
                });
                // Identify the charge by whichever handle the flow holds.
                if let Some(id) = session_id {
                    data["session_id"] = json!(id);
                }
                if let Some(id) = setup_intent_id {
                    data["setup_intent_id"] = json!(id);
                }
                data
            }
            CsmsEvent::ChargeFailed {
                session_id,
                setup_intent_id,
                error,
            } => {
                let mut data = json!({ "error": error });
                if let Some(id) = session_id {
                    data["session_id"] = json!(id);
                }
                if let Some(id) = setup_intent_id {
                    data["setup_intent_id"] = json!(id);
                }
                data
            }
        }
    }

    /// Full notification body: `{event_type, data}`.
    pub fn to_body(&self) -> Value {
        json!({
            "event_type": self.event_type(),
            "data": self.payload(),
        })
    }
}
