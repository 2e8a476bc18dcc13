//! Ports implemented by concrete adapters.
//!
//! The engine only ever talks to its collaborators through these traits, so
//! the store, backend callables, identity, local flags and notification
//! surface can all be swapped for mocks in tests.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::{BackendError, FlagError, NotifyError, StoreError};
use crate::model::{
    ContentResponse, CoupleSettings, DailyContent, GenerationOutcome, GenerationRequest,
    NotificationRequest, SubmissionOutcome, SubmissionRequest, UserIdentity,
};

/// Live content query results: most recent documents for a couple, ordered
/// by `scheduled_date_time` descending, bounded to the requested window.
pub type ContentStream = Pin<Box<dyn Stream<Item = Result<Vec<DailyContent>, StoreError>> + Send>>;

/// Single-document settings watch; republishes on every remote change.
pub type SettingsStream =
    Pin<Box<dyn Stream<Item = Result<Option<CoupleSettings>, StoreError>> + Send>>;

/// Responses for one content document. Delivery order is not guaranteed;
/// consumers re-sort by `responded_at`.
pub type ResponseStream =
    Pin<Box<dyn Stream<Item = Result<Vec<ContentResponse>, StoreError>> + Send>>;

/// The document store holding couple settings, daily content and response
/// sub-collections.
#[async_trait]
pub trait CoupleStore: Send + Sync {
    /// Point read of a couple's settings document.
    async fn get_settings(&self, couple_id: &str) -> Result<Option<CoupleSettings>, StoreError>;

    /// Create (or overwrite) a couple's settings document with a
    /// server-assigned write timestamp. Two partner devices may race this
    /// call with identical payloads; last-writer-wins.
    async fn create_settings(&self, settings: &CoupleSettings) -> Result<(), StoreError>;

    /// Subscribe to the couple's most recent content documents.
    async fn watch_content(&self, couple_id: &str, limit: usize)
        -> Result<ContentStream, StoreError>;

    /// Subscribe to the couple's settings document.
    async fn watch_settings(&self, couple_id: &str) -> Result<SettingsStream, StoreError>;

    /// Subscribe to the responses of one content document.
    async fn watch_responses(&self, content_id: &str) -> Result<ResponseStream, StoreError>;
}

/// The remote callables. Both are authoritative and idempotent server-side:
/// duplicate generation calls for the same `(couple_id, day)` must not
/// create duplicate documents, and `responded_at` is always
/// server-assigned.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    /// Ask the backend to create today's content document for a couple.
    async fn generate_content(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationOutcome, BackendError>;

    /// Submit a chat response. The client never writes the response
    /// document directly.
    async fn submit_response(
        &self,
        request: SubmissionRequest,
    ) -> Result<SubmissionOutcome, BackendError>;
}

/// Yields the acting user, authenticated or local guest. Injected
/// explicitly; the engine performs no ambient lookup.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<UserIdentity>;
}

/// Local key-value persistence for per-user booleans such as the
/// intro-seen flag.
#[async_trait]
pub trait FlagStore: Send + Sync {
    async fn get_flag(&self, key: &str) -> Result<bool, FlagError>;
    async fn set_flag(&self, key: &str, value: bool) -> Result<(), FlagError>;
}

/// Fire-and-forget notification presentation. Channel and permission setup
/// live outside the engine.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, request: NotificationRequest) -> Result<(), NotifyError>;
}
