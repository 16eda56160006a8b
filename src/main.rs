//! Charge Bridge server binary.
//!
//! Loads configuration, wires the Stripe and CSMS adapters into the payment
//! router, and serves it over HTTP.

use std::sync::Arc;
use std::time::Duration;

use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use charge_bridge::adapters::csms::HttpCsmsNotifier;
use charge_bridge::adapters::http::payment::{payment_router, PaymentAppState};
use charge_bridge::adapters::stripe::{StripeConfig, StripeGateway};
use charge_bridge::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    config.validate()?;

    tracing::info!(
        environment = ?config.server.environment,
        base_url = %config.server.base_url,
        test_mode = config.payment.is_test_mode(),
        "Starting charge-bridge"
    );

    let stripe_config = StripeConfig::new(
        config.payment.stripe_secret_key.clone(),
        config.payment.stripe_webhook_secret.clone(),
    )
    .with_require_livemode(config.server.is_production());

    let state = PaymentAppState {
        processor: Arc::new(StripeGateway::new(stripe_config)),
        notifier: Arc::new(HttpCsmsNotifier::new(
            config.csms.notification_url.clone(),
            Duration::from_secs(config.csms.timeout_secs),
        )),
        base_url: config.server.base_url.clone(),
        publishable_key: config.payment.stripe_publishable_key.clone(),
    };

    let app = payment_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app).await?;

    Ok(())
}
