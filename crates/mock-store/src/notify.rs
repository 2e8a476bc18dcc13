//! Notification sink that records what it was asked to present.

use async_trait::async_trait;
use content_core::{NotificationRequest, NotificationSink, NotifyError};
use tokio::sync::Mutex;

/// A [`NotificationSink`] that collects every request.
#[derive(Debug, Default)]
pub struct RecordingNotifications {
    sent: Mutex<Vec<NotificationRequest>>,
}

impl RecordingNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything notified so far, in order.
    pub async fn sent(&self) -> Vec<NotificationRequest> {
        self.sent.lock().await.clone()
    }

    /// Number of notifications so far.
    pub async fn count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifications {
    async fn notify(&self, request: NotificationRequest) -> Result<(), NotifyError> {
        self.sent.lock().await.push(request);
        Ok(())
    }
}
