//! In-memory document store with working live subscriptions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use content_core::{
    ContentResponse, ContentStream, CoupleSettings, CoupleStore, DailyContent, GenerationRequest,
    ResponseStream, SettingsStream, StoreError, SubmissionRequest,
};
use tokio::sync::{broadcast, Mutex};

#[derive(Debug, Default)]
struct Inner {
    settings: HashMap<String, CoupleSettings>,
    content: Vec<DailyContent>,
    responses: HashMap<String, Vec<ContentResponse>>,
}

#[derive(Debug, Clone)]
enum StoreEvent {
    ContentChanged { couple_id: String },
    SettingsChanged { couple_id: String },
    ResponsesChanged { content_id: String },
    Broken { message: String },
}

/// Watch-stream state: the event receiver plus a flag for the initial
/// snapshot every subscription delivers immediately.
struct Watch {
    rx: broadcast::Receiver<StoreEvent>,
    initial: bool,
}

/// An in-memory [`CoupleStore`].
///
/// Subscriptions deliver an immediate snapshot and then a fresh snapshot on
/// every relevant mutation. Responses are delivered in insertion order, not
/// timestamp order, so consumers must re-sort.
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<StoreEvent>,
    refuse_watch: AtomicBool,
    settings_reads: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            events,
            refuse_watch: AtomicBool::new(false),
            settings_reads: AtomicUsize::new(0),
        }
    }

    /// Insert or replace a couple's settings and notify watchers.
    pub async fn set_settings(&self, settings: CoupleSettings) {
        let couple_id = settings.couple_id.clone();
        self.inner
            .lock()
            .await
            .settings
            .insert(couple_id.clone(), settings);
        let _ = self.events.send(StoreEvent::SettingsChanged { couple_id });
    }

    /// Insert or replace a content document by id and notify watchers.
    pub async fn push_content(&self, content: DailyContent) {
        let couple_id = content.couple_id.clone();
        {
            let mut guard = self.inner.lock().await;
            guard.content.retain(|c| c.id != content.id);
            guard.content.push(content);
        }
        let _ = self.events.send(StoreEvent::ContentChanged { couple_id });
    }

    /// Append a response and notify watchers.
    pub async fn push_response(&self, response: ContentResponse) {
        let content_id = response.content_id.clone();
        self.inner
            .lock()
            .await
            .responses
            .entry(content_id.clone())
            .or_default()
            .push(response);
        let _ = self.events.send(StoreEvent::ResponsesChanged { content_id });
    }

    /// Surface a subscription error on every open watch stream.
    pub fn break_subscriptions(&self, message: &str) {
        let _ = self.events.send(StoreEvent::Broken {
            message: message.to_string(),
        });
    }

    /// Make the next `watch_*` call fail at open.
    pub fn refuse_next_watch(&self) {
        self.refuse_watch.store(true, Ordering::SeqCst);
    }

    /// How many times `get_settings` was called.
    pub fn settings_reads(&self) -> usize {
        self.settings_reads.load(Ordering::SeqCst)
    }

    /// All content documents currently stored for a couple.
    pub async fn content_for(&self, couple_id: &str) -> Vec<DailyContent> {
        self.inner
            .lock()
            .await
            .content
            .iter()
            .filter(|c| c.couple_id == couple_id)
            .cloned()
            .collect()
    }

    /// Write the document a generation callable would create, skipping the
    /// write when a document for `(couple_id, scheduled_date)` already
    /// exists. Mirrors the backend's idempotency contract.
    pub(crate) async fn insert_generated(
        &self,
        request: &GenerationRequest,
        scheduled_date: &str,
        now: DateTime<Utc>,
    ) {
        {
            let mut guard = self.inner.lock().await;
            let exists = guard
                .content
                .iter()
                .any(|c| c.couple_id == request.couple_id && c.scheduled_date == scheduled_date);
            if exists {
                return;
            }
            guard.content.push(DailyContent {
                id: format!("{}-{}", request.couple_id, scheduled_date),
                couple_id: request.couple_id.clone(),
                scheduled_date: scheduled_date.to_string(),
                scheduled_date_time: now,
                content_key: format!("daily_question_{}", request.day),
                is_completed: false,
                is_saved: false,
            });
        }
        let _ = self.events.send(StoreEvent::ContentChanged {
            couple_id: request.couple_id.clone(),
        });
    }

    /// Write the response document a submission callable would create, with
    /// a server-assigned timestamp.
    pub(crate) async fn insert_response(
        &self,
        request: &SubmissionRequest,
        sequence: usize,
        now: DateTime<Utc>,
    ) {
        let response = ContentResponse {
            id: format!("response-{}", sequence),
            content_id: request.content_id.clone(),
            user_id: request.user_id.clone(),
            user_name: request.user_name.clone(),
            text: request.text.clone(),
            responded_at: now,
        };
        self.push_response(response).await;
    }

    fn check_watch(&self) -> Result<(), StoreError> {
        if self.refuse_watch.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Subscription(
                "subscription refused".to_string(),
            ));
        }
        Ok(())
    }

    fn watch(&self) -> Watch {
        Watch {
            rx: self.events.subscribe(),
            initial: true,
        }
    }
}

async fn content_snapshot(
    inner: &Mutex<Inner>,
    couple_id: &str,
    limit: usize,
) -> Vec<DailyContent> {
    let guard = inner.lock().await;
    let mut docs: Vec<DailyContent> = guard
        .content
        .iter()
        .filter(|c| c.couple_id == couple_id)
        .cloned()
        .collect();
    docs.sort_by(|a, b| b.scheduled_date_time.cmp(&a.scheduled_date_time));
    docs.truncate(limit);
    docs
}

async fn settings_snapshot(inner: &Mutex<Inner>, couple_id: &str) -> Option<CoupleSettings> {
    inner.lock().await.settings.get(couple_id).cloned()
}

async fn responses_snapshot(inner: &Mutex<Inner>, content_id: &str) -> Vec<ContentResponse> {
    inner
        .lock()
        .await
        .responses
        .get(content_id)
        .cloned()
        .unwrap_or_default()
}

#[async_trait]
impl CoupleStore for MemoryStore {
    async fn get_settings(&self, couple_id: &str) -> Result<Option<CoupleSettings>, StoreError> {
        self.settings_reads.fetch_add(1, Ordering::SeqCst);
        Ok(settings_snapshot(&self.inner, couple_id).await)
    }

    async fn create_settings(&self, settings: &CoupleSettings) -> Result<(), StoreError> {
        // Last-writer-wins, as on the real store.
        self.set_settings(settings.clone()).await;
        Ok(())
    }

    async fn watch_content(
        &self,
        couple_id: &str,
        limit: usize,
    ) -> Result<ContentStream, StoreError> {
        self.check_watch()?;
        let inner = Arc::clone(&self.inner);
        let couple_id = couple_id.to_string();
        let stream = futures::stream::unfold(self.watch(), move |mut watch| {
            let inner = Arc::clone(&inner);
            let couple_id = couple_id.clone();
            async move {
                if watch.initial {
                    watch.initial = false;
                    let snapshot = content_snapshot(&inner, &couple_id, limit).await;
                    return Some((Ok(snapshot), watch));
                }
                loop {
                    match watch.rx.recv().await {
                        Ok(StoreEvent::ContentChanged { couple_id: changed })
                            if changed == couple_id =>
                        {
                            let snapshot = content_snapshot(&inner, &couple_id, limit).await;
                            return Some((Ok(snapshot), watch));
                        }
                        Ok(StoreEvent::Broken { message }) => {
                            return Some((Err(StoreError::Subscription(message)), watch));
                        }
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(_)) => {
                            let snapshot = content_snapshot(&inner, &couple_id, limit).await;
                            return Some((Ok(snapshot), watch));
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        });
        Ok(Box::pin(stream))
    }

    async fn watch_settings(&self, couple_id: &str) -> Result<SettingsStream, StoreError> {
        self.check_watch()?;
        let inner = Arc::clone(&self.inner);
        let couple_id = couple_id.to_string();
        let stream = futures::stream::unfold(self.watch(), move |mut watch| {
            let inner = Arc::clone(&inner);
            let couple_id = couple_id.clone();
            async move {
                if watch.initial {
                    watch.initial = false;
                    let snapshot = settings_snapshot(&inner, &couple_id).await;
                    return Some((Ok(snapshot), watch));
                }
                loop {
                    match watch.rx.recv().await {
                        Ok(StoreEvent::SettingsChanged { couple_id: changed })
                            if changed == couple_id =>
                        {
                            let snapshot = settings_snapshot(&inner, &couple_id).await;
                            return Some((Ok(snapshot), watch));
                        }
                        Ok(StoreEvent::Broken { message }) => {
                            return Some((Err(StoreError::Subscription(message)), watch));
                        }
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(_)) => {
                            let snapshot = settings_snapshot(&inner, &couple_id).await;
                            return Some((Ok(snapshot), watch));
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        });
        Ok(Box::pin(stream))
    }

    async fn watch_responses(&self, content_id: &str) -> Result<ResponseStream, StoreError> {
        self.check_watch()?;
        let inner = Arc::clone(&self.inner);
        let content_id = content_id.to_string();
        let stream = futures::stream::unfold(self.watch(), move |mut watch| {
            let inner = Arc::clone(&inner);
            let content_id = content_id.clone();
            async move {
                if watch.initial {
                    watch.initial = false;
                    let snapshot = responses_snapshot(&inner, &content_id).await;
                    return Some((Ok(snapshot), watch));
                }
                loop {
                    match watch.rx.recv().await {
                        Ok(StoreEvent::ResponsesChanged { content_id: changed })
                            if changed == content_id =>
                        {
                            let snapshot = responses_snapshot(&inner, &content_id).await;
                            return Some((Ok(snapshot), watch));
                        }
                        Ok(StoreEvent::Broken { message }) => {
                            return Some((Err(StoreError::Subscription(message)), watch));
                        }
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(_)) => {
                            let snapshot = responses_snapshot(&inner, &content_id).await;
                            return Some((Ok(snapshot), watch));
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        });
        Ok(Box::pin(stream))
    }
}
