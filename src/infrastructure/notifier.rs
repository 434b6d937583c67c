use crate::domain::ports::{Notification, Notifier};
use async_trait::async_trait;
use tracing::info;

/// Delivers notifications to the log instead of a mail server.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) -> Result<(), String> {
        info!(
            to = %notification.to,
            subject = %notification.subject,
            body = %notification.body,
            "notification sent"
        );
        Ok(())
    }
}
