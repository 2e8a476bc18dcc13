//! In-memory implementations of the engine's ports.
//!
//! Useful for testing the session engine without a real document store or
//! backend. Every implementation records what it was asked to do so tests
//! can assert call counts and payloads:
//!
//! - [`MemoryStore`] - document store with working live subscriptions
//! - [`MockBackend`] - callable backend, optionally linked to a
//!   [`MemoryStore`] so generated documents are observed by listeners
//! - [`StaticIdentity`] - fixed or absent acting user
//! - [`MemoryFlags`] - key-value flag store
//! - [`RecordingNotifications`] - collects notification requests

mod backend;
mod flags;
mod identity;
mod notify;
mod store;

pub use backend::MockBackend;
pub use flags::MemoryFlags;
pub use identity::StaticIdentity;
pub use notify::RecordingNotifications;
pub use store::MemoryStore;
