//! Ensures exactly one content document exists for the couple for today.

use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use content_core::{
    date_key, expected_day, BackendError, ContentBackend, CoupleSettings, CoupleStore,
    DailyContent, GenerationRequest, UserIdentity,
};
use tracing::{debug, info};

use crate::error::SessionError;

/// Result of an [`ensure_today_content`] call.
///
/// [`ensure_today_content`]: ContentGenerator::ensure_today_content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// Today's document is already live; nothing was requested.
    AlreadyCurrent { day: u32 },
    /// Generation was requested; the content listener will observe the new
    /// document.
    Requested { day: u32 },
}

impl EnsureOutcome {
    /// The expected content day computed during the call.
    pub fn day(&self) -> u32 {
        match self {
            Self::AlreadyCurrent { day } | Self::Requested { day } => *day,
        }
    }
}

/// Idempotent per-day content generation.
///
/// The backend callable is the sole writer of content documents and is
/// idempotent server-side, so the partner's device racing the same call
/// cannot create duplicates. The client only suppresses its own redundant
/// call once today's document has been observed.
pub struct ContentGenerator {
    store: Arc<dyn CoupleStore>,
    backend: Arc<dyn ContentBackend>,
}

impl ContentGenerator {
    pub fn new(store: Arc<dyn CoupleStore>, backend: Arc<dyn ContentBackend>) -> Self {
        Self { store, backend }
    }

    /// Make sure a content document for today exists (or is being created)
    /// for the couple.
    ///
    /// Settings are created with day-1 defaults when absent. Both partner
    /// devices may race that creation; the payloads are identical, so
    /// last-writer-wins on the settings document is safe.
    pub async fn ensure_today_content(
        &self,
        couple_id: &str,
        user: &UserIdentity,
        timezone: &str,
        current: Option<&DailyContent>,
        now: DateTime<Utc>,
    ) -> Result<EnsureOutcome, SessionError> {
        let settings = match self.store.get_settings(couple_id).await? {
            Some(settings) => settings,
            None => {
                let defaults = CoupleSettings {
                    couple_id: couple_id.to_string(),
                    start_date: midnight_utc(now),
                    timezone: timezone.to_string(),
                    current_day: 1,
                    is_active: true,
                };
                info!(couple_id, "creating couple settings with day-1 defaults");
                self.store.create_settings(&defaults).await?;
                defaults
            }
        };

        let day = expected_day(&settings, now);
        let today = date_key(now, timezone);

        if current.is_some_and(|c| c.scheduled_date == today) {
            debug!(couple_id, day, "today's content already live, skipping generation");
            return Ok(EnsureOutcome::AlreadyCurrent { day });
        }

        info!(couple_id, day, "requesting content generation");
        let outcome = self
            .backend
            .generate_content(GenerationRequest {
                couple_id: couple_id.to_string(),
                user_id: user.user_id.clone(),
                day,
                timezone: timezone.to_string(),
            })
            .await?;

        if !outcome.success {
            return Err(SessionError::Backend(BackendError::Rejected(
                outcome.message,
            )));
        }

        // The content listener, not the callable's return payload, delivers
        // the canonical document.
        Ok(EnsureOutcome::Requested { day })
    }
}

fn midnight_utc(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}
