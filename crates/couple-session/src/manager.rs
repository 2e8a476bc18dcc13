//! Owns at most one live session per process.

use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::session::{CoupleSession, SessionDeps, SessionHandle};

/// Serializes attach and detach so at most one session is live at a time.
///
/// Attaching while a session is already running detaches the old one first,
/// even for the same couple id. Re-attach is the reconnection path after
/// sign-out, couple switch or an unrecoverable error, so "already attached"
/// always means "tear down and start fresh".
pub struct SessionManager {
    deps: SessionDeps,
    config: SessionConfig,
    active: Option<SessionHandle>,
}

impl SessionManager {
    pub fn new(deps: SessionDeps, config: SessionConfig) -> Self {
        Self {
            deps,
            config,
            active: None,
        }
    }

    /// The currently attached session, if any.
    pub fn active(&self) -> Option<&SessionHandle> {
        self.active.as_ref()
    }

    /// Attach a session for `couple_id`, detaching any previous session
    /// first.
    pub async fn attach(&mut self, couple_id: &str) -> Result<&SessionHandle, SessionError> {
        if let Some(previous) = self.active.take() {
            debug!(couple_id = previous.couple_id(), "replacing active session");
            previous.detach().await;
        }

        let handle =
            CoupleSession::attach(self.deps.clone(), couple_id, self.config.clone()).await?;
        self.active = Some(handle);
        // The Option was just filled.
        self.active.as_ref().ok_or(SessionError::Detached)
    }

    /// Detach the active session, if any. Idempotent.
    pub async fn detach(&mut self) {
        if let Some(handle) = self.active.take() {
            info!(couple_id = handle.couple_id(), "detaching active session");
            handle.detach().await;
        }
    }
}
