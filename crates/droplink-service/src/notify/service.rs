//! Fire-and-forget notification dispatch.
//!
//! Delivery runs on a spawned task so a slow or failing sender can never
//! hold up (or roll back) the operation that triggered it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use droplink_core::result::AppResult;
use droplink_core::traits::{Notification, Notifier};

/// Dispatches notifications to the configured sender without blocking
/// the caller.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    sender: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    /// Create a dispatcher over a sender.
    pub fn new(sender: Arc<dyn Notifier>) -> Self {
        Self { sender }
    }

    /// Queue a notification for delivery and return immediately.
    pub fn fire_and_forget(&self, notification: Notification) {
        let sender = Arc::clone(&self.sender);
        tokio::spawn(async move {
            let recipient = notification.recipient.clone();
            let event = notification.event.clone();
            if let Err(e) = sender.send(notification).await {
                warn!(recipient, event, error = %e, "Notification delivery failed");
            }
        });
    }
}

/// Sender that only records the notification in the log stream. Stands
/// in for a real email sender in development and tests.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    /// Create a new tracing-only sender.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(&self, notification: Notification) -> AppResult<()> {
        info!(
            recipient = %notification.recipient,
            event = %notification.event,
            payload = %notification.payload,
            "Notification sent"
        );
        Ok(())
    }
}
