//! Integration tests for the payment HTTP endpoints.
//!
//! These tests drive the full Axum router against in-memory processor and
//! notifier implementations, verifying the end-to-end flows:
//! 1. Checkout creation for all three payment types
//! 2. Webhook verification and CSMS relay
//! 3. The dynamic session lifecycle (finalize and metered end)
//! 4. Error mapping to HTTP status codes

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use charge_bridge::adapters::http::payment::{payment_router, PaymentAppState};
use charge_bridge::domain::payment::CsmsEvent;
use charge_bridge::ports::{
    CheckoutSession, CheckoutSessionSpec, CsmsNotifier, NotifyError, PaymentIntent,
    PaymentIntentSpec, PaymentIntentStatus, PaymentMethod, PaymentProcessor, ProcessorError,
    SetupIntent, WebhookEvent, WebhookEventData, WebhookEventType,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// In-memory processor with scriptable outcomes.
struct TestProcessor {
    specs: Mutex<Vec<CheckoutSessionSpec>>,
    sessions: Mutex<HashMap<String, CheckoutSession>>,
    intent_specs: Mutex<Vec<PaymentIntentSpec>>,
    webhook_result: Mutex<Option<Result<WebhookEvent, ProcessorError>>>,
    decline_charges: bool,
}

impl TestProcessor {
    fn new() -> Self {
        Self {
            specs: Mutex::new(Vec::new()),
            sessions: Mutex::new(HashMap::new()),
            intent_specs: Mutex::new(Vec::new()),
            webhook_result: Mutex::new(None),
            decline_charges: false,
        }
    }

    fn with_session(self, session: CheckoutSession) -> Self {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
        self
    }

    fn with_webhook_result(self, result: Result<WebhookEvent, ProcessorError>) -> Self {
        *self.webhook_result.lock().unwrap() = Some(result);
        self
    }

    fn declining_charges(mut self) -> Self {
        self.decline_charges = true;
        self
    }

    fn checkout_call_count(&self) -> usize {
        self.specs.lock().unwrap().len()
    }

    fn last_checkout_spec(&self) -> CheckoutSessionSpec {
        self.specs.lock().unwrap().last().unwrap().clone()
    }

    fn charged_amounts(&self) -> Vec<i64> {
        self.intent_specs
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.amount_minor)
            .collect()
    }
}

#[async_trait]
impl PaymentProcessor for TestProcessor {
    async fn create_checkout_session(
        &self,
        spec: CheckoutSessionSpec,
    ) -> Result<CheckoutSession, ProcessorError> {
        self.specs.lock().unwrap().push(spec.clone());
        Ok(CheckoutSession {
            id: "cs_test123".to_string(),
            url: Some("https://checkout.example.com/cs_test123".to_string()),
            mode: spec.mode.as_str().to_string(),
            client_reference_id: Some(spec.client_reference_id),
            setup_intent: None,
            amount_total: Some(spec.amount_minor),
            metadata: HashMap::from([("payment_type".to_string(), spec.payment_type)]),
        })
    }

    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, ProcessorError> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| ProcessorError::provider(format!("no such session: {session_id}")))
    }

    async fn create_payment_method(
        &self,
        _card_token: &str,
    ) -> Result<PaymentMethod, ProcessorError> {
        Ok(PaymentMethod {
            id: "pm_1".to_string(),
        })
    }

    async fn attach_payment_method(
        &self,
        _payment_method_id: &str,
        _customer_id: &str,
    ) -> Result<(), ProcessorError> {
        Ok(())
    }

    async fn create_setup_intent(
        &self,
        customer_id: &str,
        payment_method_id: &str,
        client_id: &str,
    ) -> Result<SetupIntent, ProcessorError> {
        Ok(SetupIntent {
            id: "seti_789".to_string(),
            customer: Some(customer_id.to_string()),
            payment_method: Some(payment_method_id.to_string()),
            client_secret: Some("seti_789_secret".to_string()),
            metadata: HashMap::from([("client_id".to_string(), client_id.to_string())]),
        })
    }

    async fn retrieve_setup_intent(
        &self,
        setup_intent_id: &str,
    ) -> Result<SetupIntent, ProcessorError> {
        Ok(SetupIntent {
            id: setup_intent_id.to_string(),
            customer: Some("cus_42".to_string()),
            payment_method: Some("pm_1".to_string()),
            client_secret: None,
            metadata: HashMap::from([("client_id".to_string(), "cus_42".to_string())]),
        })
    }

    async fn create_payment_intent(
        &self,
        spec: PaymentIntentSpec,
    ) -> Result<PaymentIntent, ProcessorError> {
        if self.decline_charges {
            return Err(ProcessorError::card_declined("Your card was declined."));
        }
        self.intent_specs.lock().unwrap().push(spec.clone());
        Ok(PaymentIntent {
            id: "pi_55".to_string(),
            amount: spec.amount_minor,
            currency: spec.currency,
            customer: spec.customer,
            payment_method: spec.payment_method,
            status: PaymentIntentStatus::Succeeded,
        })
    }

    async fn verify_webhook(
        &self,
        _payload: &[u8],
        _signature: &str,
    ) -> Result<WebhookEvent, ProcessorError> {
        self.webhook_result
            .lock()
            .unwrap()
            .clone()
            .expect("webhook result not scripted")
    }
}

/// In-memory notifier recording delivered events.
struct TestNotifier {
    events: Mutex<Vec<CsmsEvent>>,
    fail: bool,
}

impl TestNotifier {
    fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn events(&self) -> Vec<CsmsEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl CsmsNotifier for TestNotifier {
    async fn notify(&self, event: &CsmsEvent) -> Result<(), NotifyError> {
        self.events.lock().unwrap().push(event.clone());
        if self.fail {
            Err(NotifyError::Unreachable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

fn app(processor: Arc<TestProcessor>, notifier: Arc<TestNotifier>) -> axum::Router {
    let state = PaymentAppState {
        processor,
        notifier,
        base_url: "https://pay.example.com".to_string(),
        publishable_key: "pk_test_abc".to_string(),
    };
    payment_router().with_state(state)
}

async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

fn checkout_completed_event() -> WebhookEvent {
    WebhookEvent {
        id: "evt_1".to_string(),
        event_type: WebhookEventType::CheckoutSessionCompleted,
        data: WebhookEventData::Checkout {
            session_id: "cs_123".to_string(),
            client_reference_id: Some("cus_42".to_string()),
            setup_intent_id: Some("seti_789".to_string()),
        },
        created_at: 1704067200,
    }
}

// =============================================================================
// Checkout Creation
// =============================================================================

#[tokio::test]
async fn estimated_payment_charges_the_estimate() {
    let processor = Arc::new(TestProcessor::new());
    let notifier = Arc::new(TestNotifier::new());

    let (status, body) = post_json(
        app(processor.clone(), notifier),
        "/api/create-payment",
        json!({"payment_type": "estimated", "client_id": "cus_42"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session_id"], "cs_test123");
    assert_eq!(body["url"], "https://checkout.example.com/cs_test123");

    let spec = processor.last_checkout_spec();
    assert_eq!(spec.amount_minor, 1000);
    assert_eq!(spec.mode.as_str(), "payment");
}

#[tokio::test]
async fn fixed_payment_without_amount_is_rejected_before_processor() {
    let processor = Arc::new(TestProcessor::new());
    let notifier = Arc::new(TestNotifier::new());

    let (status, body) = post_json(
        app(processor.clone(), notifier),
        "/api/create-payment",
        json!({"payment_type": "fixed", "client_id": "cus_42"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
    assert_eq!(processor.checkout_call_count(), 0);
}

#[tokio::test]
async fn dynamic_payment_opens_a_setup_session() {
    let processor = Arc::new(TestProcessor::new());
    let notifier = Arc::new(TestNotifier::new());

    let (status, _) = post_json(
        app(processor.clone(), notifier),
        "/api/create-payment",
        json!({"payment_type": "dynamic", "client_id": "cus_42"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let spec = processor.last_checkout_spec();
    assert_eq!(spec.mode.as_str(), "setup");
    assert_eq!(spec.payment_type, "dynamic");
}

#[tokio::test]
async fn unsupported_payment_type_is_rejected_before_processor() {
    let processor = Arc::new(TestProcessor::new());
    let notifier = Arc::new(TestNotifier::new());

    let (status, body) = post_json(
        app(processor.clone(), notifier),
        "/api/create-payment",
        json!({"payment_type": "subscription", "client_id": "cus_42"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
    assert_eq!(processor.checkout_call_count(), 0);
}

// =============================================================================
// Webhooks
// =============================================================================

#[tokio::test]
async fn webhook_with_invalid_signature_is_rejected_without_dispatch() {
    let processor = Arc::new(
        TestProcessor::new()
            .with_webhook_result(Err(ProcessorError::invalid_signature("no match"))),
    );
    let notifier = Arc::new(TestNotifier::new());
    let router = app(processor, notifier.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("Stripe-Signature", "t=1,v1=deadbeef")
        .body(Body::from("{}"))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(notifier.events().is_empty());
}

#[tokio::test]
async fn webhook_without_signature_header_is_rejected() {
    let processor = Arc::new(TestProcessor::new());
    let notifier = Arc::new(TestNotifier::new());
    let router = app(processor, notifier);

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn checkout_completed_webhook_relays_one_session_completed() {
    let processor =
        Arc::new(TestProcessor::new().with_webhook_result(Ok(checkout_completed_event())));
    let notifier = Arc::new(TestNotifier::new());
    let router = app(processor, notifier.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("Stripe-Signature", "t=1,v1=deadbeef")
        .body(Body::from("{}"))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], true);

    let events = notifier.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], CsmsEvent::SessionCompleted { session_id, .. } if session_id == "cs_123"));
}

#[tokio::test]
async fn csms_outage_does_not_change_the_webhook_ack() {
    let processor =
        Arc::new(TestProcessor::new().with_webhook_result(Ok(checkout_completed_event())));
    let notifier = Arc::new(TestNotifier::failing());
    let router = app(processor, notifier.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header("Stripe-Signature", "t=1,v1=deadbeef")
        .body(Body::from("{}"))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    // Delivery was attempted exactly once.
    assert_eq!(notifier.events().len(), 1);
}

// =============================================================================
// Dynamic Session Lifecycle
// =============================================================================

fn dynamic_session() -> CheckoutSession {
    CheckoutSession {
        id: "cs_dyn".to_string(),
        url: None,
        mode: "setup".to_string(),
        client_reference_id: Some("cus_42".to_string()),
        setup_intent: Some("seti_789".to_string()),
        amount_total: None,
        metadata: HashMap::from([("payment_type".to_string(), "dynamic".to_string())]),
    }
}

#[tokio::test]
async fn start_charging_session_returns_setup_intent() {
    let processor = Arc::new(TestProcessor::new());
    let notifier = Arc::new(TestNotifier::new());

    let (status, body) = post_json(
        app(processor, notifier),
        "/api/start-charging-session",
        json!({"client_id": "cus_42", "payment_token": "tok_visa"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["setup_intent_id"], "seti_789");
    assert_eq!(body["client_secret"], "seti_789_secret");
}

#[tokio::test]
async fn finish_dynamic_charge_settles_the_fixed_session_price() {
    let processor = Arc::new(TestProcessor::new().with_session(dynamic_session()));
    let notifier = Arc::new(TestNotifier::new());

    let (status, bytes) = get(
        app(processor.clone(), notifier.clone()),
        "/finish-dynamic-charge/cs_dyn",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["amount_paid"], 15.0);
    assert_eq!(body["payment_intent_id"], "pi_55");

    assert_eq!(processor.charged_amounts(), vec![1500]);
    let events = notifier.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        CsmsEvent::ChargeCompleted { amount_paid, .. } if *amount_paid == 15.0
    ));
}

#[tokio::test]
async fn finish_dynamic_charge_decline_reports_charge_failed() {
    let processor = Arc::new(
        TestProcessor::new()
            .with_session(dynamic_session())
            .declining_charges(),
    );
    let notifier = Arc::new(TestNotifier::new());

    let (status, bytes) = get(
        app(processor, notifier.clone()),
        "/finish-dynamic-charge/cs_dyn",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "card_error");

    let events = notifier.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], CsmsEvent::ChargeFailed { .. }));
}

#[tokio::test]
async fn end_charging_session_charges_the_metered_amount() {
    let processor = Arc::new(TestProcessor::new());
    let notifier = Arc::new(TestNotifier::new());

    let (status, body) = post_json(
        app(processor.clone(), notifier.clone()),
        "/api/end-charging-session",
        json!({"setup_intent_id": "seti_789", "final_amount": 3500}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["payment_intent_id"], "pi_55");

    assert_eq!(processor.charged_amounts(), vec![3500]);
    let events = notifier.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        CsmsEvent::ChargeCompleted { amount_paid, .. } if *amount_paid == 35.0
    ));
}

#[tokio::test]
async fn end_charging_session_rejects_non_positive_amount() {
    let processor = Arc::new(TestProcessor::new());
    let notifier = Arc::new(TestNotifier::new());

    let (status, body) = post_json(
        app(processor, notifier.clone()),
        "/api/end-charging-session",
        json!({"setup_intent_id": "seti_789", "final_amount": 0}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
    // Validation failures are not lifecycle outcomes.
    assert!(notifier.events().is_empty());
}

// =============================================================================
// Pages
// =============================================================================

#[tokio::test]
async fn index_serves_the_landing_page() {
    let processor = Arc::new(TestProcessor::new());
    let notifier = Arc::new(TestNotifier::new());

    let (status, bytes) = get(app(processor, notifier), "/").await;

    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(bytes).unwrap();
    assert!(html.contains("pk_test_abc"));
}

#[tokio::test]
async fn success_redirect_for_dynamic_serves_charging_page() {
    let processor = Arc::new(TestProcessor::new().with_session(dynamic_session()));
    let notifier = Arc::new(TestNotifier::new());

    let (status, bytes) = get(
        app(processor, notifier.clone()),
        "/success?session_id=cs_dyn",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(bytes).unwrap();
    assert!(html.contains("/finish-dynamic-charge/cs_dyn"));
    assert!(notifier.events().is_empty());
}

#[tokio::test]
async fn success_redirect_for_estimated_reports_settlement() {
    let session = CheckoutSession {
        id: "cs_est".to_string(),
        url: None,
        mode: "payment".to_string(),
        client_reference_id: Some("cus_42".to_string()),
        setup_intent: None,
        amount_total: Some(1000),
        metadata: HashMap::from([("payment_type".to_string(), "estimated".to_string())]),
    };
    let processor = Arc::new(TestProcessor::new().with_session(session));
    let notifier = Arc::new(TestNotifier::new());

    let (status, _) = get(
        app(processor, notifier.clone()),
        "/success?session_id=cs_est",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let events = notifier.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        CsmsEvent::CheckoutSettled { amount, .. } if *amount == 10.0
    ));
}

#[tokio::test]
async fn cancel_serves_the_cancel_page() {
    let processor = Arc::new(TestProcessor::new());
    let notifier = Arc::new(TestNotifier::new());

    let (status, bytes) = get(app(processor, notifier), "/cancel").await;

    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(bytes).unwrap();
    assert!(html.contains("cancelled"));
}
