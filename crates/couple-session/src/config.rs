//! Configuration for a couple session.

use content_core::FREE_DAY_LIMIT;

/// Default bounded window for the content subscription.
const DEFAULT_CONTENT_WINDOW: usize = 7;

/// Key prefix for the per-user intro-seen flag.
const INTRO_FLAG_PREFIX: &str = "intro_seen_";

/// Configuration for the session engine.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Content days visible without a subscription.
    pub free_day_limit: u32,

    /// How many recent content documents the live query keeps in view.
    pub content_window: usize,

    /// The device's IANA timezone, used for all "today" comparisons and
    /// passed to the generation callable.
    pub timezone: String,

    /// Prefix for the locally persisted intro-seen flag key.
    pub intro_flag_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            free_day_limit: FREE_DAY_LIMIT,
            content_window: DEFAULT_CONTENT_WINDOW,
            timezone: "UTC".to_string(),
            intro_flag_prefix: INTRO_FLAG_PREFIX.to_string(),
        }
    }
}

impl SessionConfig {
    /// Create a config for the given device timezone.
    pub fn with_timezone(timezone: impl Into<String>) -> Self {
        Self {
            timezone: timezone.into(),
            ..Default::default()
        }
    }
}
