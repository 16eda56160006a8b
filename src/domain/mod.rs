//! Domain layer - payment orchestration rules with no infrastructure concerns.

pub mod payment;
