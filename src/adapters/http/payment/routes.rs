//! Route definitions for the payment API.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, PaymentAppState};

/// Build the payment router.
///
/// Pages, webhook and API endpoints share one state; the server layers
/// tracing and timeouts on top.
pub fn payment_router() -> Router<PaymentAppState> {
    Router::new()
        // Pages
        .route("/", get(handlers::index))
        .route("/success", get(handlers::success))
        .route("/cancel", get(handlers::cancel))
        .route(
            "/finish-dynamic-charge/:session_id",
            get(handlers::finish_dynamic_charge),
        )
        // Processor callbacks
        .route("/webhook", post(handlers::handle_webhook))
        // Local CSMS notification sink
        .route("/csms-notification", post(handlers::csms_notification))
        // API
        .route("/api/create-payment", post(handlers::create_payment))
        .route(
            "/api/start-charging-session",
            post(handlers::start_charging_session),
        )
        .route(
            "/api/end-charging-session",
            post(handlers::end_charging_session),
        )
}
