//! Stripe adapter - `PaymentProcessor` implementation backed by the Stripe
//! HTTP API.

mod stripe_adapter;
mod webhook_types;

pub use stripe_adapter::{StripeConfig, StripeGateway};
pub use webhook_types::{SignatureHeader, SignatureParseError};
