//! End-to-end walkthrough of a couple session against the in-memory
//! adapters.
//!
//! Run with: `cargo run --example session_demo`

use std::sync::Arc;

use content_core::ContentCache;
use couple_session::{SessionConfig, SessionDeps, SessionError, SessionManager};
use mock_store::{
    MemoryFlags, MemoryStore, MockBackend, RecordingNotifications, StaticIdentity,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), SessionError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = Arc::new(MemoryStore::new());
    let backend = Arc::new(MockBackend::linked(Arc::clone(&store)));
    let notifications = Arc::new(RecordingNotifications::new());
    let deps = SessionDeps {
        store: Arc::clone(&store) as _,
        backend: backend as _,
        identity: Arc::new(StaticIdentity::signed_in("user-a", "Alex")),
        flags: Arc::new(MemoryFlags::new()),
        notifications: Arc::clone(&notifications) as _,
        cache: Arc::new(ContentCache::new()),
    };

    let mut manager = SessionManager::new(deps, SessionConfig::default());
    let session = manager.attach("couple-1").await?;

    let mut state = session.subscribe();
    state
        .wait_for(|s| s.content.is_some())
        .await
        .map_err(|_| SessionError::Detached)?;
    info!(routing = ?session.routing(), "first routing decision");

    session.mark_intro_seen().await?;
    state
        .wait_for(|s| s.intro_seen)
        .await
        .map_err(|_| SessionError::Detached)?;
    info!(routing = ?session.routing(), "after intro dismissal");

    session.submit_response("Cooking together tonight?").await?;
    state
        .wait_for(|s| !s.responses.is_empty())
        .await
        .map_err(|_| SessionError::Detached)?;

    let snapshot = session.snapshot();
    info!(
        day = snapshot.current_day,
        content = ?snapshot.content_id(),
        responses = snapshot.responses.len(),
        "session settled"
    );

    manager.detach().await;
    info!(notifications = notifications.count().await, "done");
    Ok(())
}
