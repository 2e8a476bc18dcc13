//! The couple session engine.
//!
//! Keeps both partners' devices converged on the same daily content and
//! decides which screen the user should see. A session is attached per
//! couple; its actor task owns the live store subscriptions, ensures
//! today's content exists, publishes a [`SessionSnapshot`] on every change
//! and answers commands (submit, retry, intro dismissal, entitlement
//! updates).
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use content_core::ContentCache;
//! use couple_session::{CoupleSession, SessionConfig, SessionDeps};
//! use mock_store::{
//!     MemoryFlags, MemoryStore, MockBackend, RecordingNotifications, StaticIdentity,
//! };
//!
//! # async fn run() -> Result<(), couple_session::SessionError> {
//! let store = Arc::new(MemoryStore::new());
//! let deps = SessionDeps {
//!     store: store.clone(),
//!     backend: Arc::new(MockBackend::linked(store)),
//!     identity: Arc::new(StaticIdentity::signed_in("user-a", "Alex")),
//!     flags: Arc::new(MemoryFlags::new()),
//!     notifications: Arc::new(RecordingNotifications::new()),
//!     cache: Arc::new(ContentCache::new()),
//! };
//!
//! let session = CoupleSession::attach(deps, "couple-1", SessionConfig::default()).await?;
//! println!("routing: {:?}", session.routing());
//! session.detach().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod generator;
mod manager;
mod notifier;
mod session;
mod state;
mod submitter;

pub use config::SessionConfig;
pub use error::SessionError;
pub use generator::{ContentGenerator, EnsureOutcome};
pub use manager::SessionManager;
pub use notifier::NotificationDispatcher;
pub use session::{CoupleSession, SessionDeps, SessionHandle};
pub use state::{select_today, sort_responses, SessionSnapshot};
pub use submitter::ResponseSubmitter;
