//! Minimal HTML pages served around the hosted checkout flow.
//!
//! These are deliberately tiny: the hosted checkout page itself lives with
//! the processor, so all this service renders is the landing page, the two
//! redirect targets, and the in-progress charging page for dynamic sessions.

/// Landing page embedding the publishable key for browser-side tokenization.
pub fn index_page(publishable_key: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>EV Charging Payments</title>
    <script src="https://js.stripe.com/v3/"></script>
</head>
<body>
    <h1>EV Charging Payments</h1>
    <p>Select a payment type and start a session.</p>
    <script>
        const stripe = Stripe("{publishable_key}");
    </script>
</body>
</html>
"#
    )
}

/// Page shown after a non-dynamic checkout settles.
pub fn success_page() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>Payment successful</title></head>
<body>
    <h1>Payment successful</h1>
    <p>Thank you. Your charging session is ready.</p>
</body>
</html>
"#
    .to_string()
}

/// In-progress page for a dynamic session; links to the finalize endpoint.
pub fn charging_page(session_id: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Charging in progress</title></head>
<body>
    <h1>Charging in progress</h1>
    <p>Your payment method is authorized. Finish charging to settle the session.</p>
    <a href="/finish-dynamic-charge/{session_id}">Finish charging</a>
</body>
</html>
"#
    )
}

/// Page shown when checkout is abandoned.
pub fn cancel_page() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>Payment cancelled</title></head>
<body>
    <h1>Payment cancelled</h1>
    <p>No charge was made. You can start over at any time.</p>
</body>
</html>
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_page_embeds_publishable_key() {
        let html = index_page("pk_test_abc");
        assert!(html.contains("pk_test_abc"));
        assert!(html.contains("js.stripe.com"));
    }

    #[test]
    fn charging_page_links_to_finalize_endpoint() {
        let html = charging_page("cs_123");
        assert!(html.contains("/finish-dynamic-charge/cs_123"));
    }
}
