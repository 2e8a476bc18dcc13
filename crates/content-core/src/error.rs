//! Error types for the engine's ports.

use thiserror::Error;

/// Errors surfaced by the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A point read failed.
    #[error("store read failed: {0}")]
    Read(String),

    /// A write failed.
    #[error("store write failed: {0}")]
    Write(String),

    /// A live subscription could not be opened or broke mid-flight.
    #[error("subscription failed: {0}")]
    Subscription(String),
}

/// Errors surfaced by the backend callables.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The call itself failed (network, timeout, auth).
    #[error("callable failed: {0}")]
    Call(String),

    /// The backend answered but rejected the request.
    #[error("backend rejected request: {0}")]
    Rejected(String),
}

/// Errors surfaced by the local key-value flag store.
#[derive(Debug, Error)]
pub enum FlagError {
    #[error("flag store error: {0}")]
    Storage(String),
}

/// Errors surfaced by the notification presentation layer.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification failed: {0}")]
    Present(String),
}
