//! Payment HTTP adapter - routes, handlers and DTOs for the payment API.

pub mod dto;
pub mod handlers;
pub mod pages;
pub mod routes;

pub use handlers::PaymentAppState;
pub use routes::payment_router;
