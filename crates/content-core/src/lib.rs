//! Core types and pure logic for the daily shared-content engine.
//!
//! This crate provides the shared interface for everything that powers a
//! couple's daily content session. It defines:
//!
//! - [`CoupleSettings`] / [`DailyContent`] / [`ContentResponse`] - the
//!   documents exchanged with the backing store
//! - [`CoupleStore`] / [`ContentBackend`] / [`IdentityProvider`] /
//!   [`FlagStore`] / [`NotificationSink`] - the ports implemented by
//!   concrete adapters (and by `mock-store` for tests)
//! - [`expected_day`] / [`date_key`] - the day-counting rules
//! - [`ContentCache`] - the warm-relaunch cache
//! - [`route`] / [`RoutingState`] - the freemium routing state machine
//!
//! # Example
//!
//! ```rust
//! use content_core::{route, RouteInputs, RoutingState, FREE_DAY_LIMIT};
//!
//! let inputs = RouteInputs {
//!     has_seen_intro: true,
//!     current_day: 2,
//!     free_day_limit: FREE_DAY_LIMIT,
//!     ..Default::default()
//! };
//! assert_eq!(route(&inputs), RoutingState::Main);
//! ```

mod cache;
mod day;
mod error;
mod model;
mod ports;
mod routing;

pub use cache::ContentCache;
pub use day::{date_key, expected_day, resolve_zone};
pub use error::{BackendError, FlagError, NotifyError, StoreError};
pub use model::{
    ContentResponse, CoupleSettings, DailyContent, GenerationOutcome, GenerationRequest,
    NotificationKind, NotificationRequest, SubmissionOutcome, SubmissionRequest, UserIdentity,
};
pub use ports::{
    ContentBackend, ContentStream, CoupleStore, FlagStore, IdentityProvider, NotificationSink,
    ResponseStream, SettingsStream,
};
pub use routing::{route, RouteInputs, RoutingState, FREE_DAY_LIMIT};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
