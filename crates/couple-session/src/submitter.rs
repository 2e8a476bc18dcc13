//! Validates and submits chat responses through the backend callable.

use std::sync::Arc;

use content_core::{BackendError, ContentBackend, SubmissionRequest, UserIdentity};
use tracing::debug;

use crate::error::SessionError;

/// Submits a response for the current content document.
///
/// Validation failures are resolved locally and never reach the network.
/// On success the backend callable is the sole writer of the response
/// document, so `responded_at` ordering stays server-arbitrated.
pub struct ResponseSubmitter {
    backend: Arc<dyn ContentBackend>,
}

impl ResponseSubmitter {
    pub fn new(backend: Arc<dyn ContentBackend>) -> Self {
        Self { backend }
    }

    /// Submit `text` as the acting user's response to `content_id`.
    pub async fn submit(
        &self,
        user: Option<&UserIdentity>,
        content_id: Option<&str>,
        text: &str,
    ) -> Result<(), SessionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let user = user.ok_or(SessionError::NoUser)?;
        let content_id = content_id
            .filter(|id| !id.is_empty())
            .ok_or(SessionError::NoActiveContent)?;

        debug!(content_id, user_id = %user.user_id, "submitting response");
        let outcome = self
            .backend
            .submit_response(SubmissionRequest {
                content_id: content_id.to_string(),
                text: trimmed.to_string(),
                user_name: user.display_name.clone(),
                user_id: user.user_id.clone(),
            })
            .await?;

        if !outcome.success {
            return Err(SessionError::Backend(BackendError::Rejected(
                "response submission rejected".to_string(),
            )));
        }
        Ok(())
    }
}
