//! Notification sender interface.
//!
//! Notifications are fire-and-forget: a failure here must never roll
//! back the transaction that triggered it.

use async_trait::async_trait;

use crate::result::AppResult;

/// An outbound notification event.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Notification {
    /// Recipient email address.
    pub recipient: String,
    /// Short event name (e.g. "permission_granted", "upload_received").
    pub event: String,
    /// Event payload.
    pub payload: serde_json::Value,
}

/// Trait for notification/email senders.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug + 'static {
    /// Deliver a notification. Errors are logged by the dispatcher and
    /// never propagated to the caller.
    async fn send(&self, notification: Notification) -> AppResult<()>;
}
