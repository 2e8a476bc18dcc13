//! Document and wire types shared across the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-couple settings document.
///
/// Created once on the first content request and mutated only through
/// server-timestamped writes. Both partners' devices may race to create it;
/// last-writer-wins is acceptable because both writers compute identical
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupleSettings {
    /// Identifier of the couple this document belongs to.
    pub couple_id: String,
    /// The day counting begins here (day 1 is the start date itself).
    pub start_date: DateTime<Utc>,
    /// IANA timezone name, e.g. "Europe/Paris".
    pub timezone: String,
    /// Last known day pointer.
    pub current_day: u32,
    /// Whether the couple is connected and active.
    pub is_active: bool,
}

/// One day's question or challenge instance.
///
/// Exactly one instance exists per `(couple_id, scheduled_date)` pair; the
/// generation callable is the sole writer. Clients only toggle the
/// completion/save flags. Superseded, never deleted, by the next day's
/// document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyContent {
    pub id: String,
    pub couple_id: String,
    /// Calendar-day string ("YYYY-MM-DD"), used for locale-stable "today"
    /// comparisons.
    pub scheduled_date: String,
    /// Full timestamp, used for ordering.
    pub scheduled_date_time: DateTime<Utc>,
    /// Selects localized text from the static catalog.
    pub content_key: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_saved: bool,
}

/// A chat message tied to one day's content. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    pub id: String,
    /// Id of the parent [`DailyContent`].
    pub content_id: String,
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    /// Server-assigned timestamp; the sole ordering key for the transcript.
    /// Client clocks are not trusted.
    pub responded_at: DateTime<Utc>,
}

/// The acting user, resolved through an [`IdentityProvider`].
///
/// [`IdentityProvider`]: crate::IdentityProvider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: String,
    pub display_name: String,
    /// True when this is a local guest identity rather than an
    /// authenticated account.
    pub is_guest: bool,
}

impl UserIdentity {
    /// Create an authenticated identity.
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            is_guest: false,
        }
    }

    /// Create a local guest identity.
    pub fn guest(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            is_guest: true,
        }
    }
}

/// Request payload for the content generation callable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub couple_id: String,
    pub user_id: String,
    pub day: u32,
    pub timezone: String,
}

/// Typed result of the generation callable, decoded once at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Request payload for the response submission callable. The text is
/// trimmed and validated before this is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub content_id: String,
    pub text: String,
    pub user_name: String,
    pub user_id: String,
}

/// Typed result of the submission callable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub success: bool,
}

/// Kind of a local notification surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewContent,
    NewMessage,
}

/// A fire-and-forget notification request. The engine only decides whether
/// and with what payload to notify; channels and permissions live elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// Id of the document that triggered the notification.
    pub correlation_id: String,
}
