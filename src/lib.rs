//! Charge Bridge - Payment Orchestration for EV Charging
//!
//! This crate bridges a card payment processor (Stripe) with a charging
//! session management system (CSMS): checkout creation, webhook handling,
//! and the dynamic metered-charge session lifecycle.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
