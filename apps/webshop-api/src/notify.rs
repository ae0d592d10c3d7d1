//! # Order Notifications
//!
//! Delivers order status emails without blocking the request that caused
//! them.
//!
//! ```text
//! POST /api/order ──► insert ──► 201 Created
//!                        │
//!                        └──spawn──► load items ──► compose ──► Mailer::send
//!                                                                  │
//!                                                   failure: warn! and drop
//! ```
//!
//! A failed or skipped notification never fails or rolls back the order
//! mutation that triggered it.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use webshop_core::notification::{order_status_email, EmailMessage};
use webshop_core::Order;
use webshop_db::Database;

/// Delivery failure reported by a [`Mailer`].
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Outgoing email transport.
pub trait Mailer: Send + Sync + 'static {
    /// Sends one message. Recipients are already filtered.
    fn send(&self, from: &str, message: &EmailMessage) -> Result<(), NotifyError>;
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, from: &str, message: &EmailMessage) -> Result<(), NotifyError> {
        info!(
            from,
            to = ?message.recipients,
            subject = %message.subject,
            "Order email"
        );
        Ok(())
    }
}

/// Keeps every sent message in memory.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, _from: &str, message: &EmailMessage) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .map_err(|e| NotifyError::Delivery(e.to_string()))?
            .push(message.clone());
        Ok(())
    }
}

/// Sends a composed message on a background task.
///
/// Blank recipients are dropped. Returns `None` (and sends nothing) when no
/// recipient remains.
pub fn dispatch(
    mailer: Arc<dyn Mailer>,
    from: String,
    message: EmailMessage,
) -> Option<JoinHandle<()>> {
    let recipients: Vec<String> = message
        .deliverable_recipients()
        .into_iter()
        .map(str::to_string)
        .collect();
    if recipients.is_empty() {
        debug!(subject = %message.subject, "No recipients, skipping email");
        return None;
    }

    let message = EmailMessage {
        recipients,
        ..message
    };
    Some(tokio::spawn(async move {
        if let Err(e) = mailer.send(&from, &message) {
            warn!(error = %e, subject = %message.subject, "Failed to send order email");
        }
    }))
}

/// Sends the status email for an order on a background task.
///
/// Line items are loaded on the task. Lookup failures are logged and the
/// email is dropped.
pub fn order_status_changed(
    db: Database,
    mailer: Arc<dyn Mailer>,
    from: String,
    order: Order,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let items = match db.orders().items(order.id).await {
            Ok(items) => items,
            Err(e) => {
                warn!(order_id = order.id, error = %e, "Could not load items for order email");
                return;
            }
        };

        let message = order_status_email(&order, &items);
        if let Some(handle) = dispatch(mailer, from, message) {
            if let Err(e) = handle.await {
                warn!(order_id = order.id, error = %e, "Order email task failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingMailer;

    impl Mailer for FailingMailer {
        fn send(&self, _from: &str, _message: &EmailMessage) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery("smtp down".to_string()))
        }
    }

    fn message(recipients: &[&str]) -> EmailMessage {
        EmailMessage {
            subject: "Order #1".to_string(),
            text_body: "Thank you for your order.".to_string(),
            recipients: recipients.iter().map(|r| r.to_string()).collect(),
            html_body: None,
        }
    }

    #[tokio::test]
    async fn test_dispatch_filters_blank_recipients() {
        let mailer = Arc::new(MemoryMailer::new());
        let handle = dispatch(
            mailer.clone(),
            "no-reply@localhost".to_string(),
            message(&["  ", "jane@example.com"]),
        )
        .expect("one recipient left");
        handle.await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipients, vec!["jane@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_dispatch_skips_without_recipients() {
        let mailer = Arc::new(MemoryMailer::new());
        assert!(dispatch(mailer.clone(), String::new(), message(&["", " "])).is_none());
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let handle = dispatch(
            Arc::new(FailingMailer),
            "no-reply@localhost".to_string(),
            message(&["jane@example.com"]),
        )
        .unwrap();
        assert!(handle.await.is_ok());
    }
}
