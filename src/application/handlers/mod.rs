//! Command handlers for the payment orchestration flows.

mod create_checkout;
mod dynamic_session;
mod process_webhook;

pub use create_checkout::{CreateCheckoutCommand, CreateCheckoutHandler, CreateCheckoutResult};
pub use dynamic_session::{
    DynamicSessionHandler, EndSessionCommand, EndSessionResult, FinalizeResult,
    SessionAuthorization, StartSessionCommand, FINALIZE_AMOUNT_MINOR,
};
pub use process_webhook::{ProcessWebhookCommand, ProcessWebhookHandler, WebhookAck};

use crate::domain::payment::CsmsEvent;
use crate::ports::CsmsNotifier;

/// Deliver one event to the CSMS, logging and discarding any failure.
///
/// The caller's outcome must never depend on the CSMS being reachable.
pub(crate) async fn notify_best_effort(notifier: &dyn CsmsNotifier, event: &CsmsEvent) {
    if let Err(err) = notifier.notify(event).await {
        tracing::warn!(
            event_type = event.event_type(),
            error = %err,
            "CSMS notification failed; continuing"
        );
    }
}
