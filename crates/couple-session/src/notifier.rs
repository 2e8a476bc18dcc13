//! Decides when observed deltas should surface a local notification.

use content_core::{ContentResponse, DailyContent, NotificationKind, NotificationRequest};

/// Longest message preview included in a notification body.
const PREVIEW_LIMIT: usize = 80;

/// Tracks what has already been notified within this session.
///
/// De-duplication is session-memory only: a fresh process restart may
/// re-surface one already-seen message notification. Known trade-off,
/// kept as-is.
#[derive(Debug, Default)]
pub struct NotificationDispatcher {
    last_seen_response: Option<String>,
    last_content: Option<String>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat this content id as already announced, e.g. because it came
    /// from the warm cache and is already on screen.
    pub fn seed_content(&mut self, content_id: &str) {
        self.last_content = Some(content_id.to_string());
    }

    /// Inspect a freshly published transcript (ascending by timestamp) and
    /// return a new-message notification for the most recent response
    /// authored by someone other than the acting user, unless it was
    /// already notified.
    pub fn observe_responses(
        &mut self,
        responses: &[ContentResponse],
        acting_user_id: &str,
    ) -> Option<NotificationRequest> {
        let latest = responses.iter().rev().find(|r| r.user_id != acting_user_id)?;
        if self.last_seen_response.as_deref() == Some(latest.id.as_str()) {
            return None;
        }
        self.last_seen_response = Some(latest.id.clone());
        Some(NotificationRequest {
            kind: NotificationKind::NewMessage,
            title: latest.user_name.clone(),
            body: preview(&latest.text),
            correlation_id: latest.id.clone(),
        })
    }

    /// Return a new-content notification the first time a given day's
    /// document is observed.
    pub fn observe_content(&mut self, content: &DailyContent) -> Option<NotificationRequest> {
        if self.last_content.as_deref() == Some(content.id.as_str()) {
            return None;
        }
        self.last_content = Some(content.id.clone());
        Some(NotificationRequest {
            kind: NotificationKind::NewContent,
            title: "Today's content is ready".to_string(),
            body: content.content_key.clone(),
            correlation_id: content.id.clone(),
        })
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_LIMIT {
        return text.to_string();
    }
    let mut preview: String = text.chars().take(PREVIEW_LIMIT).collect();
    preview.push('…');
    preview
}
