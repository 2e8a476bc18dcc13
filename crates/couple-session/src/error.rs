//! Error types for session operations.

use content_core::{BackendError, FlagError, StoreError};
use thiserror::Error;

/// Errors that can occur while running a couple session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Response text was blank after trimming. Resolved locally; never
    /// reaches the network.
    #[error("response text is empty")]
    EmptyInput,

    /// No current content document to respond to. Resolved locally.
    #[error("no active content to respond to")]
    NoActiveContent,

    /// No resolvable acting user, neither authenticated nor guest. Fatal
    /// to initialization; nothing is attached.
    #[error("no resolvable user")]
    NoUser,

    /// The session has been torn down; re-attach to recover.
    #[error("session detached")]
    Detached,

    /// Store error (read, write or subscription).
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Backend callable error.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Local flag store error.
    #[error("flag store error: {0}")]
    Flag(#[from] FlagError),
}
