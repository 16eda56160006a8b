//! CSMS adapter - `CsmsNotifier` implementation posting events over HTTP.

mod csms_client;

pub use csms_client::HttpCsmsNotifier;
