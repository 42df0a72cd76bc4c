//! Notification transport abstract Trait

use async_trait::async_trait;

/// Best-effort operator notification.
///
/// Delivery failures are the sink's concern; they are never surfaced to the
/// lifecycle engine.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, title: &str, message: &str, priority: u8);
}

/// Sink that only writes the notification to the log.
///
/// Default when no transport is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn notify(&self, title: &str, message: &str, priority: u8) {
        log::info!("[notify p={priority}] {title}: {message}");
    }
}
