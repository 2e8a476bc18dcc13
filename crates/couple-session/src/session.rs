//! The couple session actor.
//!
//! One task per attached couple owns all three live subscriptions
//! (content, settings, responses) plus the command channel, and is the
//! single writer of the published [`SessionSnapshot`]. Consumers read the
//! snapshot through a `watch` channel and derive routing from it; nothing
//! else may mutate session state.

use std::sync::Arc;

use chrono::Utc;
use content_core::{
    date_key, expected_day, ContentBackend, ContentCache, ContentResponse, ContentStream,
    CoupleSettings, CoupleStore, DailyContent, FlagStore, IdentityProvider, NotificationRequest,
    NotificationSink, ResponseStream, RoutingState, SettingsStream, UserIdentity,
};
use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::generator::ContentGenerator;
use crate::notifier::NotificationDispatcher;
use crate::state::{select_today, sort_responses, SessionSnapshot};
use crate::submitter::ResponseSubmitter;

/// External collaborators, injected explicitly.
#[derive(Clone)]
pub struct SessionDeps {
    pub store: Arc<dyn CoupleStore>,
    pub backend: Arc<dyn ContentBackend>,
    pub identity: Arc<dyn IdentityProvider>,
    pub flags: Arc<dyn FlagStore>,
    pub notifications: Arc<dyn NotificationSink>,
    pub cache: Arc<ContentCache>,
}

enum Command {
    Submit {
        text: String,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Regenerate {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    MarkIntroSeen,
    SetSubscribed(bool),
}

/// Entry point for attaching a session to a couple.
pub struct CoupleSession;

impl CoupleSession {
    /// Attach a session for `couple_id` and spawn its actor task.
    ///
    /// Fails with [`SessionError::NoUser`] before anything is subscribed
    /// when no acting user can be resolved. On a warm relaunch the cached
    /// content is published immediately; the live listener overwrites it
    /// within one round trip.
    pub async fn attach(
        deps: SessionDeps,
        couple_id: &str,
        config: SessionConfig,
    ) -> Result<SessionHandle, SessionError> {
        let user = deps.identity.current_user().ok_or(SessionError::NoUser)?;
        info!(couple_id, user_id = %user.user_id, "attaching couple session");

        let intro_key = format!("{}{}", config.intro_flag_prefix, user.user_id);
        let intro_seen = match deps.flags.get_flag(&intro_key).await {
            Ok(seen) => seen,
            Err(e) => {
                warn!("failed to read intro flag, assuming unseen: {}", e);
                false
            }
        };

        let mut snapshot = SessionSnapshot::new(couple_id);
        snapshot.intro_seen = intro_seen;

        let mut dispatcher = NotificationDispatcher::new();
        let today = date_key(Utc::now(), &config.timezone);
        if let Some(cached) = deps.cache.get(couple_id, &today).await {
            debug!(couple_id, content_id = %cached.id, "publishing cached content");
            dispatcher.seed_content(&cached.id);
            snapshot.content = Some(cached);
        }

        let (state_tx, state_rx) = watch::channel(snapshot.clone());
        let (command_tx, command_rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let actor = SessionActor {
            generator: ContentGenerator::new(
                Arc::clone(&deps.store),
                Arc::clone(&deps.backend),
            ),
            submitter: ResponseSubmitter::new(Arc::clone(&deps.backend)),
            deps,
            config: config.clone(),
            couple_id: couple_id.to_string(),
            user,
            intro_key,
            state: snapshot,
            state_tx,
            dispatcher,
        };
        let task = tokio::spawn(actor.run(command_rx, shutdown_rx));

        Ok(SessionHandle {
            couple_id: couple_id.to_string(),
            config,
            commands: command_tx,
            state: state_rx,
            shutdown: Some(shutdown_tx),
            task,
        })
    }
}

/// Handle to a running session. Dropping it without [`detach`] leaves the
/// actor running until its channels close.
///
/// [`detach`]: SessionHandle::detach
pub struct SessionHandle {
    couple_id: String,
    config: SessionConfig,
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SessionSnapshot>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// The couple this session is attached to.
    pub fn couple_id(&self) -> &str {
        &self.couple_id
    }

    /// A receiver for the live session snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.clone()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// The current routing state, derived from the snapshot.
    pub fn routing(&self) -> RoutingState {
        self.snapshot().routing(self.config.free_day_limit)
    }

    /// Submit a chat response for the current content.
    pub async fn submit_response(&self, text: &str) -> Result<(), SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Submit {
                text: text.to_string(),
                reply,
            })
            .await
            .map_err(|_| SessionError::Detached)?;
        response.await.map_err(|_| SessionError::Detached)?
    }

    /// User-initiated retry: clear the error state and re-run generation.
    pub async fn regenerate(&self) -> Result<(), SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Regenerate { reply })
            .await
            .map_err(|_| SessionError::Detached)?;
        response.await.map_err(|_| SessionError::Detached)?
    }

    /// Record that the user dismissed the intro.
    pub async fn mark_intro_seen(&self) -> Result<(), SessionError> {
        self.commands
            .send(Command::MarkIntroSeen)
            .await
            .map_err(|_| SessionError::Detached)
    }

    /// Feed the entitlement state from the purchase layer.
    pub async fn set_subscribed(&self, subscribed: bool) -> Result<(), SessionError> {
        self.commands
            .send(Command::SetSubscribed(subscribed))
            .await
            .map_err(|_| SessionError::Detached)
    }

    /// Tear the session down and wait for the actor to finish. In-flight
    /// call results are discarded with the actor rather than applied to a
    /// detached session.
    pub async fn detach(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!("session task join failed: {}", e);
        }
    }
}

struct SessionActor {
    deps: SessionDeps,
    config: SessionConfig,
    couple_id: String,
    user: UserIdentity,
    intro_key: String,
    state: SessionSnapshot,
    state_tx: watch::Sender<SessionSnapshot>,
    dispatcher: NotificationDispatcher,
    generator: ContentGenerator,
    submitter: ResponseSubmitter,
}

impl SessionActor {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        shutdown: oneshot::Receiver<()>,
    ) {
        let mut content_stream: Option<ContentStream> = None;
        let mut settings_stream: Option<SettingsStream> = None;
        let mut responses_stream: Option<ResponseStream> = None;

        match self.open_subscriptions().await {
            Ok((content, settings)) => {
                content_stream = Some(content);
                settings_stream = Some(settings);
                if let Err(e) = self.initialize().await {
                    self.fail(e.to_string());
                }
            }
            Err(e) => self.fail(e.to_string()),
        }

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!(couple_id = %self.couple_id, "detaching couple session");
                    break;
                }

                command = commands.recv() => {
                    match command {
                        Some(command) => self.handle_command(command).await,
                        // All handles dropped; nothing can reach us anymore.
                        None => break,
                    }
                }

                item = next_or_pending(&mut content_stream) => {
                    match item {
                        Some(Ok(docs)) => self.on_content(docs, &mut responses_stream).await,
                        Some(Err(e)) => self.fail(e.to_string()),
                        None => content_stream = None,
                    }
                }

                item = next_or_pending(&mut settings_stream) => {
                    match item {
                        Some(Ok(settings)) => self.on_settings(settings),
                        Some(Err(e)) => self.fail(e.to_string()),
                        None => settings_stream = None,
                    }
                }

                item = next_or_pending(&mut responses_stream) => {
                    match item {
                        Some(Ok(responses)) => self.on_responses(responses).await,
                        Some(Err(e)) => self.fail(e.to_string()),
                        None => responses_stream = None,
                    }
                }
            }
        }
    }

    async fn open_subscriptions(
        &self,
    ) -> Result<(ContentStream, SettingsStream), SessionError> {
        let content = self
            .deps
            .store
            .watch_content(&self.couple_id, self.config.content_window)
            .await?;
        let settings = self.deps.store.watch_settings(&self.couple_id).await?;
        Ok((content, settings))
    }

    /// Settings load/create followed by generation-if-needed. Runs on
    /// attach and again on explicit regenerate.
    async fn initialize(&mut self) -> Result<(), SessionError> {
        let outcome = self
            .generator
            .ensure_today_content(
                &self.couple_id,
                &self.user,
                &self.config.timezone,
                self.state.content.as_ref(),
                Utc::now(),
            )
            .await?;
        self.state.current_day = outcome.day();
        self.state.loading = false;
        self.publish();
        Ok(())
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Submit { text, reply } => {
                let result = self
                    .submitter
                    .submit(Some(&self.user), self.state.content_id(), &text)
                    .await;
                let _ = reply.send(result);
            }
            Command::Regenerate { reply } => {
                self.state.error = None;
                self.state.loading = true;
                self.publish();
                let result = self.initialize().await;
                if let Err(e) = &result {
                    self.fail(e.to_string());
                }
                let _ = reply.send(result);
            }
            Command::MarkIntroSeen => {
                if let Err(e) = self.deps.flags.set_flag(&self.intro_key, true).await {
                    warn!("failed to persist intro flag: {}", e);
                }
                self.state.intro_seen = true;
                self.publish();
            }
            Command::SetSubscribed(subscribed) => {
                self.state.subscribed = subscribed;
                self.publish();
            }
        }
    }

    async fn on_content(
        &mut self,
        docs: Vec<DailyContent>,
        responses_stream: &mut Option<ResponseStream>,
    ) {
        let today = date_key(Utc::now(), &self.config.timezone);
        // Recomputed from scratch on every snapshot; an empty selection
        // means "needs generation", not an error.
        let current = select_today(&docs, &today);

        let previous_id = self.state.content_id().map(str::to_string);
        let current_id = current.as_ref().map(|c| c.id.clone());

        if current_id != previous_id {
            // Re-scope the responses subscription. The old stream is
            // dropped before the new one opens so a listener pointed at
            // yesterday's content can never feed today's transcript.
            *responses_stream = None;
            self.state.responses.clear();

            if let Some(id) = &current_id {
                debug!(couple_id = %self.couple_id, content_id = %id, "scoping responses listener");
                match self.deps.store.watch_responses(id).await {
                    Ok(stream) => *responses_stream = Some(stream),
                    Err(e) => {
                        self.fail(e.to_string());
                        return;
                    }
                }
            }
        }

        if let Some(content) = &current {
            self.deps.cache.put(content.clone()).await;
            if let Some(request) = self.dispatcher.observe_content(content) {
                self.notify(request).await;
            }
        }

        self.state.content = current;
        self.state.loading = false;
        self.publish();
    }

    fn on_settings(&mut self, settings: Option<CoupleSettings>) {
        if let Some(settings) = &settings {
            self.state.current_day = expected_day(settings, Utc::now());
        }
        self.state.settings = settings;
        self.publish();
    }

    async fn on_responses(&mut self, mut responses: Vec<ContentResponse>) {
        sort_responses(&mut responses);
        if let Some(request) = self
            .dispatcher
            .observe_responses(&responses, &self.user.user_id)
        {
            self.notify(request).await;
        }
        self.state.responses = responses;
        self.publish();
    }

    async fn notify(&self, request: NotificationRequest) {
        // Fire-and-forget; presentation failures never affect the session.
        if let Err(e) = self.deps.notifications.notify(request).await {
            warn!("failed to present notification: {}", e);
        }
    }

    fn publish(&self) {
        let _ = self.state_tx.send(self.state.clone());
    }

    fn fail(&mut self, message: String) {
        warn!(couple_id = %self.couple_id, "session error: {}", message);
        self.state.error = Some(message);
        self.state.loading = false;
        self.publish();
    }
}

/// Await the next item of an optional stream; a missing stream never
/// resolves, which parks its `select!` arm.
async fn next_or_pending<S>(stream: &mut Option<S>) -> Option<S::Item>
where
    S: Stream + Unpin,
{
    match stream {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use content_core::{NotificationKind, RoutingState};
    use mock_store::{
        MemoryFlags, MemoryStore, MockBackend, RecordingNotifications, StaticIdentity,
    };
    use tokio::time::timeout;

    struct Harness {
        store: Arc<MemoryStore>,
        backend: Arc<MockBackend>,
        flags: Arc<MemoryFlags>,
        notifications: Arc<RecordingNotifications>,
        cache: Arc<ContentCache>,
        deps: SessionDeps,
    }

    fn harness(identity: StaticIdentity) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let backend = Arc::new(MockBackend::linked(Arc::clone(&store)));
        let flags = Arc::new(MemoryFlags::new());
        let notifications = Arc::new(RecordingNotifications::new());
        let cache = Arc::new(ContentCache::new());
        let deps = SessionDeps {
            store: Arc::clone(&store) as Arc<dyn CoupleStore>,
            backend: Arc::clone(&backend) as Arc<dyn ContentBackend>,
            identity: Arc::new(identity),
            flags: Arc::clone(&flags) as Arc<dyn FlagStore>,
            notifications: Arc::clone(&notifications) as Arc<dyn NotificationSink>,
            cache: Arc::clone(&cache),
        };
        Harness {
            store,
            backend,
            flags,
            notifications,
            cache,
            deps,
        }
    }

    async fn seen_intro(h: &Harness, user_id: &str) {
        h.flags.seed(&format!("intro_seen_{}", user_id), true).await;
    }

    async fn wait_for(
        rx: &mut watch::Receiver<SessionSnapshot>,
        predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> SessionSnapshot {
        timeout(std::time::Duration::from_secs(2), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for snapshot")
            .expect("session state channel closed")
            .clone()
    }

    fn partner_response(id: &str, content_id: &str, minutes: i64) -> ContentResponse {
        ContentResponse {
            id: id.to_string(),
            content_id: content_id.to_string(),
            user_id: "user-b".to_string(),
            user_name: "Sam".to_string(),
            text: format!("message {}", id),
            responded_at: Utc::now() + Duration::minutes(minutes),
        }
    }

    #[tokio::test]
    async fn test_attach_without_user_fails_before_subscribing() {
        let h = harness(StaticIdentity::signed_out());
        let result =
            CoupleSession::attach(h.deps.clone(), "couple-1", SessionConfig::default()).await;

        assert!(matches!(result, Err(SessionError::NoUser)));
        // Nothing was read or subscribed.
        assert_eq!(h.store.settings_reads(), 0);
    }

    #[tokio::test]
    async fn test_fresh_attach_generates_and_routes_to_main() {
        let h = harness(StaticIdentity::signed_in("user-a", "Alex"));
        seen_intro(&h, "user-a").await;

        let handle = CoupleSession::attach(h.deps.clone(), "couple-1", SessionConfig::default())
            .await
            .unwrap();
        let mut rx = handle.subscribe();

        let snapshot = wait_for(&mut rx, |s| !s.loading && s.content.is_some()).await;
        assert_eq!(snapshot.current_day, 1);
        assert_eq!(snapshot.routing(3), RoutingState::Main);
        assert_eq!(h.backend.generation_calls().await, 1);

        // Settings were created with day-1 defaults.
        let settings = h.store.get_settings("couple-1").await.unwrap().unwrap();
        assert_eq!(settings.current_day, 1);
        assert!(settings.is_active);

        handle.detach().await;
    }

    #[tokio::test]
    async fn test_intro_unseen_routes_to_intro() {
        let h = harness(StaticIdentity::signed_in("user-a", "Alex"));

        let handle = CoupleSession::attach(h.deps.clone(), "couple-1", SessionConfig::default())
            .await
            .unwrap();
        let mut rx = handle.subscribe();

        wait_for(&mut rx, |s| !s.loading && s.content.is_some()).await;
        assert!(matches!(handle.routing(), RoutingState::Intro { .. }));

        handle.mark_intro_seen().await.unwrap();
        wait_for(&mut rx, |s| s.intro_seen).await;
        assert_eq!(handle.routing(), RoutingState::Main);
        assert!(h.flags.get_flag("intro_seen_user-a").await.unwrap());

        handle.detach().await;
    }

    #[tokio::test]
    async fn test_regenerate_after_observation_makes_no_extra_call() {
        let h = harness(StaticIdentity::signed_in("user-a", "Alex"));
        seen_intro(&h, "user-a").await;

        let handle = CoupleSession::attach(h.deps.clone(), "couple-1", SessionConfig::default())
            .await
            .unwrap();
        let mut rx = handle.subscribe();
        wait_for(&mut rx, |s| s.content.is_some()).await;
        assert_eq!(h.backend.generation_calls().await, 1);

        // Today's document is live; the retry observes it and no-ops.
        handle.regenerate().await.unwrap();
        assert_eq!(h.backend.generation_calls().await, 1);

        handle.detach().await;
    }

    #[tokio::test]
    async fn test_out_of_order_responses_are_sorted() {
        let h = harness(StaticIdentity::signed_in("user-a", "Alex"));
        seen_intro(&h, "user-a").await;

        let handle = CoupleSession::attach(h.deps.clone(), "couple-1", SessionConfig::default())
            .await
            .unwrap();
        let mut rx = handle.subscribe();
        let snapshot = wait_for(&mut rx, |s| s.content.is_some()).await;
        let content_id = snapshot.content_id().unwrap().to_string();

        // Delivered newest-first; the published transcript must be ascending.
        h.store.push_response(partner_response("r2", &content_id, 10)).await;
        h.store.push_response(partner_response("r1", &content_id, 5)).await;

        let snapshot = wait_for(&mut rx, |s| s.responses.len() == 2).await;
        assert_eq!(snapshot.responses[0].id, "r1");
        assert_eq!(snapshot.responses[1].id, "r2");
        assert!(snapshot.responses[0].responded_at <= snapshot.responses[1].responded_at);

        handle.detach().await;
    }

    #[tokio::test]
    async fn test_stale_content_responses_never_reach_transcript() {
        let h = harness(StaticIdentity::signed_in("user-a", "Alex"));
        seen_intro(&h, "user-a").await;

        let handle = CoupleSession::attach(h.deps.clone(), "couple-1", SessionConfig::default())
            .await
            .unwrap();
        let mut rx = handle.subscribe();
        let snapshot = wait_for(&mut rx, |s| s.content.is_some()).await;
        let content_id = snapshot.content_id().unwrap().to_string();

        // A response on some other (e.g. yesterday's) content document.
        h.store
            .push_response(partner_response("stale", "content-yesterday", 1))
            .await;
        h.store.push_response(partner_response("fresh", &content_id, 2)).await;

        let snapshot = wait_for(&mut rx, |s| !s.responses.is_empty()).await;
        assert_eq!(snapshot.responses.len(), 1);
        assert_eq!(snapshot.responses[0].id, "fresh");

        handle.detach().await;
    }

    #[tokio::test]
    async fn test_superseding_content_rescopes_responses_listener() {
        let h = harness(StaticIdentity::signed_in("user-a", "Alex"));
        seen_intro(&h, "user-a").await;

        let handle = CoupleSession::attach(h.deps.clone(), "couple-1", SessionConfig::default())
            .await
            .unwrap();
        let mut rx = handle.subscribe();
        let snapshot = wait_for(&mut rx, |s| s.content.is_some()).await;
        let first_id = snapshot.content_id().unwrap().to_string();

        h.store.push_response(partner_response("r-old", &first_id, 1)).await;
        wait_for(&mut rx, |s| s.responses.len() == 1).await;

        // A replacement document for the same day, newer by timestamp, so
        // the content window now resolves today to a different id.
        h.store
            .push_content(DailyContent {
                id: "content-replacement".to_string(),
                couple_id: "couple-1".to_string(),
                scheduled_date: date_key(Utc::now(), "UTC"),
                scheduled_date_time: Utc::now() + Duration::hours(1),
                content_key: "daily_question_1".to_string(),
                is_completed: false,
                is_saved: false,
            })
            .await;

        // The transcript is cleared in the same publish that swaps the id.
        wait_for(&mut rx, |s| {
            s.content_id() == Some("content-replacement") && s.responses.is_empty()
        })
        .await;

        // Responses to the superseded document never reach the new
        // transcript; only the re-scoped listener's document feeds it.
        h.store.push_response(partner_response("r-stale", &first_id, 2)).await;
        h.store
            .push_response(partner_response("r-new", "content-replacement", 3))
            .await;

        let snapshot = wait_for(&mut rx, |s| !s.responses.is_empty()).await;
        assert_eq!(snapshot.responses.len(), 1);
        assert_eq!(snapshot.responses[0].id, "r-new");
        assert_eq!(snapshot.responses[0].content_id, "content-replacement");

        handle.detach().await;
    }

    #[tokio::test]
    async fn test_submit_blank_is_local_error() {
        let h = harness(StaticIdentity::signed_in("user-a", "Alex"));
        seen_intro(&h, "user-a").await;

        let handle = CoupleSession::attach(h.deps.clone(), "couple-1", SessionConfig::default())
            .await
            .unwrap();
        let mut rx = handle.subscribe();
        wait_for(&mut rx, |s| s.content.is_some()).await;

        let result = handle.submit_response("   ").await;
        assert!(matches!(result, Err(SessionError::EmptyInput)));
        assert_eq!(h.backend.submission_calls().await, 0);

        handle.detach().await;
    }

    #[tokio::test]
    async fn test_submit_round_trips_into_transcript() {
        let h = harness(StaticIdentity::signed_in("user-a", "Alex"));
        seen_intro(&h, "user-a").await;

        let handle = CoupleSession::attach(h.deps.clone(), "couple-1", SessionConfig::default())
            .await
            .unwrap();
        let mut rx = handle.subscribe();
        wait_for(&mut rx, |s| s.content.is_some()).await;

        handle.submit_response("  let's cook tonight  ").await.unwrap();

        let snapshot = wait_for(&mut rx, |s| !s.responses.is_empty()).await;
        assert_eq!(snapshot.responses[0].text, "let's cook tonight");
        assert_eq!(snapshot.responses[0].user_name, "Alex");

        handle.detach().await;
    }

    #[tokio::test]
    async fn test_partner_messages_notify_with_dedup() {
        let h = harness(StaticIdentity::signed_in("user-a", "Alex"));
        seen_intro(&h, "user-a").await;

        let handle = CoupleSession::attach(h.deps.clone(), "couple-1", SessionConfig::default())
            .await
            .unwrap();
        let mut rx = handle.subscribe();
        let snapshot = wait_for(&mut rx, |s| s.content.is_some()).await;
        let content_id = snapshot.content_id().unwrap().to_string();

        h.store.push_response(partner_response("r1", &content_id, 1)).await;
        wait_for(&mut rx, |s| s.responses.len() == 1).await;

        // Own reply must not notify.
        handle.submit_response("replying").await.unwrap();
        wait_for(&mut rx, |s| s.responses.len() == 2).await;

        h.store.push_response(partner_response("r2", &content_id, 5)).await;
        wait_for(&mut rx, |s| s.responses.len() == 3).await;

        let messages: Vec<_> = h
            .notifications
            .sent()
            .await
            .into_iter()
            .filter(|n| n.kind == NotificationKind::NewMessage)
            .collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].correlation_id, "r1");
        assert_eq!(messages[0].title, "Sam");
        assert_eq!(messages[1].correlation_id, "r2");

        handle.detach().await;
    }

    #[tokio::test]
    async fn test_new_content_notifies_once() {
        let h = harness(StaticIdentity::signed_in("user-a", "Alex"));
        seen_intro(&h, "user-a").await;

        let handle = CoupleSession::attach(h.deps.clone(), "couple-1", SessionConfig::default())
            .await
            .unwrap();
        let mut rx = handle.subscribe();
        wait_for(&mut rx, |s| s.content.is_some()).await;

        let content_notes: Vec<_> = h
            .notifications
            .sent()
            .await
            .into_iter()
            .filter(|n| n.kind == NotificationKind::NewContent)
            .collect();
        assert_eq!(content_notes.len(), 1);

        handle.detach().await;
    }

    #[tokio::test]
    async fn test_subscription_error_routes_to_error() {
        let h = harness(StaticIdentity::signed_in("user-a", "Alex"));
        seen_intro(&h, "user-a").await;

        let handle = CoupleSession::attach(h.deps.clone(), "couple-1", SessionConfig::default())
            .await
            .unwrap();
        let mut rx = handle.subscribe();
        wait_for(&mut rx, |s| !s.loading).await;

        h.store.break_subscriptions("connection lost");
        let snapshot = wait_for(&mut rx, |s| s.error.is_some()).await;
        assert!(matches!(snapshot.routing(3), RoutingState::Error(_)));

        handle.detach().await;
    }

    #[tokio::test]
    async fn test_generation_rejection_routes_to_error_and_retry_recovers() {
        let h = harness(StaticIdentity::signed_in("user-a", "Alex"));
        seen_intro(&h, "user-a").await;
        h.backend.reject_generation("temporarily unavailable").await;

        let handle = CoupleSession::attach(h.deps.clone(), "couple-1", SessionConfig::default())
            .await
            .unwrap();
        let mut rx = handle.subscribe();
        let snapshot = wait_for(&mut rx, |s| s.error.is_some()).await;
        assert!(matches!(snapshot.routing(3), RoutingState::Error(_)));
        assert_eq!(h.backend.generation_calls().await, 1);

        // No automatic retry loop: the count stays put until the user acts.
        assert_eq!(h.backend.generation_calls().await, 1);

        h.backend.accept_generation().await;
        handle.regenerate().await.unwrap();
        let snapshot = wait_for(&mut rx, |s| s.content.is_some() && s.error.is_none()).await;
        assert_eq!(snapshot.routing(3), RoutingState::Main);

        handle.detach().await;
    }

    #[tokio::test]
    async fn test_day_four_free_tier_paywalls_until_subscribed() {
        let h = harness(StaticIdentity::signed_in("user-a", "Alex"));
        seen_intro(&h, "user-a").await;
        h.store
            .set_settings(CoupleSettings {
                couple_id: "couple-1".to_string(),
                start_date: Utc::now() - Duration::days(3),
                timezone: "UTC".to_string(),
                current_day: 1,
                is_active: true,
            })
            .await;

        let handle = CoupleSession::attach(h.deps.clone(), "couple-1", SessionConfig::default())
            .await
            .unwrap();
        let mut rx = handle.subscribe();

        let snapshot = wait_for(&mut rx, |s| !s.loading && s.content.is_some()).await;
        assert_eq!(snapshot.current_day, 4);
        assert_eq!(handle.routing(), RoutingState::Paywall { day: 4 });

        handle.set_subscribed(true).await.unwrap();
        wait_for(&mut rx, |s| s.subscribed).await;
        assert_eq!(handle.routing(), RoutingState::Main);

        handle.detach().await;
    }

    #[tokio::test]
    async fn test_warm_cache_publishes_before_first_round_trip() {
        let h = harness(StaticIdentity::signed_in("user-a", "Alex"));
        seen_intro(&h, "user-a").await;

        let today = date_key(Utc::now(), "UTC");
        h.cache
            .put(DailyContent {
                id: "cached-content".to_string(),
                couple_id: "couple-1".to_string(),
                scheduled_date: today,
                scheduled_date_time: Utc::now(),
                content_key: "daily_question_1".to_string(),
                is_completed: false,
                is_saved: false,
            })
            .await;

        let handle = CoupleSession::attach(h.deps.clone(), "couple-1", SessionConfig::default())
            .await
            .unwrap();

        // Visible immediately, before any listener delivery.
        assert_eq!(handle.snapshot().content_id(), Some("cached-content"));

        handle.detach().await;
    }

    #[tokio::test]
    async fn test_detach_stops_the_actor() {
        let h = harness(StaticIdentity::signed_in("user-a", "Alex"));
        seen_intro(&h, "user-a").await;

        let handle = CoupleSession::attach(h.deps.clone(), "couple-1", SessionConfig::default())
            .await
            .unwrap();
        let mut rx = handle.subscribe();
        wait_for(&mut rx, |s| s.content.is_some()).await;

        handle.detach().await;
        // The state channel closes with the actor.
        assert!(rx.changed().await.is_err());
    }
}
