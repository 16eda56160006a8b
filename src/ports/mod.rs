//! Ports - trait contracts between the application core and the outside
//! world.

mod notifier;
mod processor;

pub use notifier::{CsmsNotifier, NotifyError};
pub use processor::{
    CheckoutSession, CheckoutSessionSpec, PaymentIntent, PaymentIntentSpec, PaymentIntentStatus,
    PaymentMethod, PaymentProcessor, ProcessorError, ProcessorErrorCode, SetupIntent, WebhookEvent,
    WebhookEventData, WebhookEventType,
};
