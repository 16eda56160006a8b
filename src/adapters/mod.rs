//! Adapters - implementations of the ports against concrete infrastructure.
//!
//! - `stripe`: payment processor adapter over the Stripe REST API
//! - `csms`: CSMS notifier posting events over HTTP
//! - `http`: inbound HTTP surface (Axum)

pub mod csms;
pub mod http;
pub mod stripe;
