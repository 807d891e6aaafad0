//! Notifications
//!
//! Customer-facing messages sent when an order is placed or reaches an announced status.
//! Delivery is an external concern; the core only needs a single send call.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use tracing::info;

/// Errors reported by a notifier.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The message could not be delivered.
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// A message to a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Recipient address
    pub recipient: String,
    /// Subject line
    pub subject: String,
    /// Message body
    pub body: String,
}

/// Sends notifications.
#[automock]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification.
    async fn send(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Notifier that writes each message to the log instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        info!(
            recipient = notification.recipient.as_str(),
            subject = notification.subject.as_str(),
            "notification"
        );

        Ok(())
    }
}
