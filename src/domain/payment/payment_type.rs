//! Payment types and the charge-plan resolution rules.
//!
//! Every inbound checkout request declares one of three payment types. The
//! resolution from declared type to a concrete charge plan is a pure function
//! so it can be tested without any processor involvement.

use serde::{Deserialize, Serialize};

use super::PaymentFlowError;

/// Amount charged for an `estimated` payment, in minor units (10.00 EUR).
pub const ESTIMATED_AMOUNT_MINOR: i64 = 1000;

/// Authorization-hold ceiling used when setting up a `dynamic` payment, in
/// minor units (50.00 EUR). This is a hint to the processor only: no money
/// moves at setup time, and the final charge amount is not validated against
/// it.
pub const DYNAMIC_CEILING_MINOR: i64 = 5000;

/// How a payment is priced and settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    /// Flat up-front charge at a fixed estimate.
    Estimated,
    /// Charge of a caller-declared amount.
    Fixed,
    /// Two-phase flow: payment method authorized now, charged a metered
    /// amount when the charging session ends.
    Dynamic,
}

/// Checkout session mode sent to the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    /// Immediate charge.
    Payment,
    /// Save a payment method for a later charge; no money movement.
    Setup,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutMode::Payment => "payment",
            CheckoutMode::Setup => "setup",
        }
    }
}

/// Resolved charge plan for a checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargePlan {
    /// Line-item amount in minor currency units.
    pub amount_minor: i64,
    /// Checkout session mode.
    pub mode: CheckoutMode,
}

impl PaymentType {
    /// Parse a declared payment type string.
    ///
    /// Rejection happens here, before any processor call is made.
    pub fn parse(value: &str) -> Result<Self, PaymentFlowError> {
        match value {
            "estimated" => Ok(PaymentType::Estimated),
            "fixed" => Ok(PaymentType::Fixed),
            "dynamic" => Ok(PaymentType::Dynamic),
            other => Err(PaymentFlowError::InvalidRequest(format!(
                "unsupported payment type: {other}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Estimated => "estimated",
            PaymentType::Fixed => "fixed",
            PaymentType::Dynamic => "dynamic",
        }
    }

    /// Resolve the declared type and optional amount into a charge plan.
    ///
    /// - `estimated` charges a fixed estimate regardless of any supplied
    ///   amount.
    /// - `fixed` requires a positive amount in major units, converted to
    ///   minor units with `round(amount * 100)`.
    /// - `dynamic` opens a setup-mode session with the ceiling amount as an
    ///   authorization hint.
    pub fn resolve(&self, declared_amount: Option<f64>) -> Result<ChargePlan, PaymentFlowError> {
        match self {
            PaymentType::Estimated => Ok(ChargePlan {
                amount_minor: ESTIMATED_AMOUNT_MINOR,
                mode: CheckoutMode::Payment,
            }),
            PaymentType::Fixed => {
                let amount = declared_amount.ok_or_else(|| {
                    PaymentFlowError::InvalidRequest(
                        "amount is required for a fixed payment".to_string(),
                    )
                })?;
                if !amount.is_finite() || amount <= 0.0 {
                    return Err(PaymentFlowError::InvalidRequest(
                        "amount must be positive for a fixed payment".to_string(),
                    ));
                }
                Ok(ChargePlan {
                    amount_minor: (amount * 100.0).round() as i64,
                    mode: CheckoutMode::Payment,
                })
            }
            PaymentType::Dynamic => Ok(ChargePlan {
                amount_minor: DYNAMIC_CEILING_MINOR,
                mode: CheckoutMode::Setup,
            }),
        }
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_types() {
        assert_eq!(PaymentType::parse("estimated").unwrap(), PaymentType::Estimated);
        assert_eq!(PaymentType::parse("fixed").unwrap(), PaymentType::Fixed);
        assert_eq!(PaymentType::parse("dynamic").unwrap(), PaymentType::Dynamic);
    }

    #[test]
    fn parse_rejects_unknown_type() {
        let err = PaymentType::parse("subscription").unwrap_err();
        assert!(matches!(err, PaymentFlowError::InvalidRequest(_)));
        assert!(err.to_string().contains("unsupported payment type"));
    }

    #[test]
    fn estimated_resolves_to_fixed_estimate() {
        let plan = PaymentType::Estimated.resolve(None).unwrap();
        assert_eq!(plan.amount_minor, 1000);
        assert_eq!(plan.mode, CheckoutMode::Payment);
    }

    #[test]
    fn estimated_ignores_supplied_amount() {
        let plan = PaymentType::Estimated.resolve(Some(99.99)).unwrap();
        assert_eq!(plan.amount_minor, 1000);
    }

    #[test]
    fn fixed_converts_to_minor_units() {
        let plan = PaymentType::Fixed.resolve(Some(10.00)).unwrap();
        assert_eq!(plan.amount_minor, 1000);
        assert_eq!(plan.mode, CheckoutMode::Payment);
    }

    #[test]
    fn fixed_rounds_fractional_cents() {
        let plan = PaymentType::Fixed.resolve(Some(12.345)).unwrap();
        assert_eq!(plan.amount_minor, 1235);
    }

    #[test]
    fn fixed_requires_amount() {
        let err = PaymentType::Fixed.resolve(None).unwrap_err();
        assert!(matches!(err, PaymentFlowError::InvalidRequest(_)));
    }

    #[test]
    fn fixed_rejects_non_positive_amount() {
        assert!(PaymentType::Fixed.resolve(Some(0.0)).is_err());
        assert!(PaymentType::Fixed.resolve(Some(-5.0)).is_err());
    }

    #[test]
    fn dynamic_resolves_to_setup_mode() {
        let plan = PaymentType::Dynamic.resolve(None).unwrap();
        assert_eq!(plan.amount_minor, 5000);
        assert_eq!(plan.mode, CheckoutMode::Setup);
    }

    #[test]
    fn payment_type_round_trips_through_str() {
        for t in [PaymentType::Estimated, PaymentType::Fixed, PaymentType::Dynamic] {
            assert_eq!(PaymentType::parse(t.as_str()).unwrap(), t);
        }
    }
}
