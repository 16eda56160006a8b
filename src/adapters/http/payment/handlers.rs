//! HTTP handlers for payment endpoints.
//!
//! These handlers connect Axum routes to application layer command handlers.

use std::sync::Arc;

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use serde::Deserialize;

use crate::application::handlers::{
    notify_best_effort, CreateCheckoutCommand, CreateCheckoutHandler, DynamicSessionHandler,
    EndSessionCommand, ProcessWebhookCommand, ProcessWebhookHandler, StartSessionCommand,
};
use crate::domain::payment::{CsmsEvent, PaymentFlowError, PaymentType};
use crate::ports::{CsmsNotifier, PaymentProcessor};

use super::dto::{
    CreatePaymentRequest, CreatePaymentResponse, CsmsNotificationResponse, EndSessionRequest,
    EndSessionResponse, ErrorResponse, FinishChargeResponse, StartSessionRequest,
    StartSessionResponse, WebhookAckResponse,
};
use super::pages;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped
/// dependencies for efficient sharing across handlers.
#[derive(Clone)]
pub struct PaymentAppState {
    pub processor: Arc<dyn PaymentProcessor>,
    pub notifier: Arc<dyn CsmsNotifier>,
    /// Public base URL used for checkout redirects.
    pub base_url: String,
    /// Stripe publishable key, embedded in the landing page.
    pub publishable_key: String,
}

impl PaymentAppState {
    /// Create handlers on demand from the shared state.
    pub fn create_checkout_handler(&self) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(self.processor.clone(), self.base_url.clone())
    }

    pub fn webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(self.processor.clone(), self.notifier.clone())
    }

    pub fn dynamic_session_handler(&self) -> DynamicSessionHandler {
        DynamicSessionHandler::new(self.processor.clone(), self.notifier.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Page Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET / - Landing page with the publishable key embedded
pub async fn index(State(state): State<PaymentAppState>) -> Html<String> {
    Html(pages::index_page(&state.publishable_key))
}

/// Query parameters for the success redirect.
#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub session_id: Option<String>,
}

/// GET /success - Redirect target after a completed checkout
///
/// Dynamic sessions render the charging page; anything else reports the
/// settled payment to the CSMS (best effort) and renders the success page.
/// This endpoint never fails: a session that cannot be retrieved is logged
/// and falls back to the plain success page.
pub async fn success(
    State(state): State<PaymentAppState>,
    Query(query): Query<SuccessQuery>,
) -> Html<String> {
    let Some(session_id) = query.session_id else {
        return Html(pages::success_page());
    };

    let session = match state.processor.retrieve_checkout_session(&session_id).await {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!(
                session_id = %session_id,
                error = %err,
                "Could not retrieve checkout session on success redirect"
            );
            return Html(pages::success_page());
        }
    };

    let payment_type = session
        .payment_type()
        .and_then(|s| PaymentType::parse(s).ok())
        .unwrap_or(PaymentType::Estimated);

    if payment_type == PaymentType::Dynamic {
        return Html(pages::charging_page(&session.id));
    }

    let amount = session.amount_total.unwrap_or(0) as f64 / 100.0;
    notify_best_effort(
        state.notifier.as_ref(),
        &CsmsEvent::CheckoutSettled {
            session_id: session.id,
            amount,
            payment_type,
            client_id: session.client_reference_id,
        },
    )
    .await;

    Html(pages::success_page())
}

/// GET /cancel - Redirect target after an abandoned checkout
pub async fn cancel() -> Html<String> {
    Html(pages::cancel_page())
}

// ════════════════════════════════════════════════════════════════════════════════
// API Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/create-payment - Create a checkout session
pub async fn create_payment(
    State(state): State<PaymentAppState>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let handler = state.create_checkout_handler();
    let cmd = CreateCheckoutCommand {
        payment_type: request.payment_type,
        amount: request.amount,
        currency: request.currency,
        client_id: request.client_id,
        description: request.description,
    };

    let result = handler.handle(cmd).await?;

    Ok(Json(CreatePaymentResponse {
        session_id: result.session_id,
        url: result.url,
    }))
}

/// POST /webhook - Handle Stripe webhook events
pub async fn handle_webhook(
    State(state): State<PaymentAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, PaymentApiError> {
    // Extract Stripe signature header
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            PaymentFlowError::InvalidRequest("Missing Stripe-Signature header".to_string())
        })?;

    let handler = state.webhook_handler();
    let cmd = ProcessWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    let ack = handler.handle(cmd).await?;

    Ok(Json(WebhookAckResponse {
        success: ack.success,
    }))
}

/// POST /csms-notification - Local CSMS notification sink
///
/// Stand-in endpoint for a co-located CSMS: logs the event and acknowledges.
pub async fn csms_notification(
    Json(body): Json<serde_json::Value>,
) -> Json<CsmsNotificationResponse> {
    tracing::info!(
        event_type = body.get("event_type").and_then(|v| v.as_str()).unwrap_or("unknown"),
        payload = %body,
        "CSMS notification received"
    );
    Json(CsmsNotificationResponse { status: "success" })
}

/// GET /finish-dynamic-charge/{session_id} - Settle a dynamic charge
pub async fn finish_dynamic_charge(
    State(state): State<PaymentAppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let handler = state.dynamic_session_handler();
    let result = handler.finalize(&session_id).await?;

    Ok(Json(FinishChargeResponse {
        status: "success",
        amount_paid: result.amount_paid,
        payment_intent_id: result.payment_intent_id,
    }))
}

/// POST /api/start-charging-session - Pre-authorize a payment method
pub async fn start_charging_session(
    State(state): State<PaymentAppState>,
    Json(request): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let handler = state.dynamic_session_handler();
    let cmd = StartSessionCommand {
        client_id: request.client_id,
        payment_token: request.payment_token,
    };

    let result = handler.start(cmd).await?;

    Ok(Json(StartSessionResponse {
        setup_intent_id: result.setup_intent_id,
        client_secret: result.client_secret,
    }))
}

/// POST /api/end-charging-session - Charge the metered final amount
pub async fn end_charging_session(
    State(state): State<PaymentAppState>,
    Json(request): Json<EndSessionRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let handler = state.dynamic_session_handler();
    let cmd = EndSessionCommand {
        setup_intent_id: request.setup_intent_id,
        final_amount_minor: request.final_amount,
    };

    let result = handler.end(cmd).await?;

    Ok(Json(EndSessionResponse {
        status: "success",
        payment_intent_id: result.payment_intent_id,
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
pub struct PaymentApiError(PaymentFlowError);

impl From<PaymentFlowError> for PaymentApiError {
    fn from(err: PaymentFlowError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PaymentApiError {
    fn into_response(self) -> axum::response::Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = ErrorResponse::new(self.0.code(), self.0.to_string());
        (status, Json(body)).into_response()
    }
}
