//! Mock callable backend that records every request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use content_core::{
    date_key, BackendError, ContentBackend, GenerationOutcome, GenerationRequest,
    SubmissionOutcome, SubmissionRequest,
};
use tokio::sync::Mutex;

use crate::store::MemoryStore;

/// A [`ContentBackend`] for tests.
///
/// Records every generation and submission request so call counts can be
/// asserted. When linked to a [`MemoryStore`], a successful generation
/// writes the day's document into the store (idempotently, as the real
/// callable does) and a successful submission appends a server-timestamped
/// response, so watch streams observe the effects.
#[derive(Default)]
pub struct MockBackend {
    store: Option<Arc<MemoryStore>>,
    generations: Mutex<Vec<GenerationRequest>>,
    submissions: Mutex<Vec<SubmissionRequest>>,
    rejection: Mutex<Option<String>>,
    fail_generation: AtomicBool,
    fail_submission: AtomicBool,
}

impl MockBackend {
    /// Backend with no linked store; calls succeed but write nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose successful calls write into the given store.
    pub fn linked(store: Arc<MemoryStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    /// Make generation calls answer `success: false` with this message.
    pub async fn reject_generation(&self, message: &str) {
        *self.rejection.lock().await = Some(message.to_string());
    }

    /// Accept generation calls again after [`reject_generation`].
    ///
    /// [`reject_generation`]: MockBackend::reject_generation
    pub async fn accept_generation(&self) {
        *self.rejection.lock().await = None;
    }

    /// Make generation calls fail at the transport level.
    pub fn fail_generation(&self) {
        self.fail_generation.store(true, Ordering::SeqCst);
    }

    /// Make submission calls fail at the transport level.
    pub fn fail_submission(&self) {
        self.fail_submission.store(true, Ordering::SeqCst);
    }

    /// All generation requests received so far.
    pub async fn generation_requests(&self) -> Vec<GenerationRequest> {
        self.generations.lock().await.clone()
    }

    /// Number of generation calls received so far.
    pub async fn generation_calls(&self) -> usize {
        self.generations.lock().await.len()
    }

    /// All submission requests received so far.
    pub async fn submission_requests(&self) -> Vec<SubmissionRequest> {
        self.submissions.lock().await.clone()
    }

    /// Number of submission calls received so far.
    pub async fn submission_calls(&self) -> usize {
        self.submissions.lock().await.len()
    }
}

#[async_trait]
impl ContentBackend for MockBackend {
    async fn generate_content(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationOutcome, BackendError> {
        self.generations.lock().await.push(request.clone());

        if self.fail_generation.load(Ordering::SeqCst) {
            return Err(BackendError::Call("injected generation failure".to_string()));
        }
        if let Some(message) = self.rejection.lock().await.clone() {
            return Ok(GenerationOutcome {
                success: false,
                message,
            });
        }

        if let Some(store) = &self.store {
            let now = Utc::now();
            let scheduled_date = date_key(now, &request.timezone);
            store.insert_generated(&request, &scheduled_date, now).await;
        }

        Ok(GenerationOutcome {
            success: true,
            message: format!("content ready for day {}", request.day),
        })
    }

    async fn submit_response(
        &self,
        request: SubmissionRequest,
    ) -> Result<SubmissionOutcome, BackendError> {
        let sequence = {
            let mut guard = self.submissions.lock().await;
            guard.push(request.clone());
            guard.len()
        };

        if self.fail_submission.load(Ordering::SeqCst) {
            return Err(BackendError::Call("injected submission failure".to_string()));
        }

        if let Some(store) = &self.store {
            store.insert_response(&request, sequence, Utc::now()).await;
        }

        Ok(SubmissionOutcome { success: true })
    }
}
