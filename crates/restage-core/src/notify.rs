//! Best-effort notification boundary.
//!
//! Progress and error text goes to a notification sink (Slack, the
//! console, both). Delivery is best effort: implementations log their
//! own failures and never raise. A dropped status message must not
//! take down a half-finished provisioning run.

/// A sink for human-readable status text.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn notify(&self, text: &str);
}

/// Discards every message. Useful as a default and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    async fn notify(&self, _text: &str) {}
}
