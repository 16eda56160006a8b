//! Payment domain - payment types, charge plans, notification events and errors.

mod errors;
mod events;
mod payment_type;

pub use errors::PaymentFlowError;
pub use events::CsmsEvent;
pub use payment_type::{ChargePlan, CheckoutMode, PaymentType};
