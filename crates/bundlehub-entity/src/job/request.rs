//! Normalized download submission.

use serde::{Deserialize, Serialize};

use bundlehub_core::error::AppError;

use super::status::JobPriority;

/// Smallest file identifier accepted by the service.
pub const FILE_ID_MIN: u64 = 10_000;
/// Largest file identifier accepted by the service.
pub const FILE_ID_MAX: u64 = 100_000_000;
/// Maximum length of a client-supplied deduplication token.
pub const CLIENT_REQUEST_ID_MAX_LEN: usize = 128;

/// A validated, normalized request to start a bulk download job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Ordered file identifiers to include in the bundle.
    pub file_ids: Vec<u64>,
    /// Optional caller-supplied deduplication token.
    pub client_request_id: Option<String>,
    /// Optional opaque owner identifier.
    pub user_id: Option<String>,
    /// Queue priority class.
    pub priority: JobPriority,
}

impl DownloadRequest {
    /// Validate the request against the admission rules.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.file_ids.is_empty() {
            return Err(AppError::validation("file_ids must not be empty"));
        }
        for &id in &self.file_ids {
            if !(FILE_ID_MIN..=FILE_ID_MAX).contains(&id) {
                return Err(AppError::validation(format!(
                    "file id {id} outside allowed range [{FILE_ID_MIN}, {FILE_ID_MAX}]"
                )));
            }
        }
        if let Some(token) = &self.client_request_id {
            if token.len() > CLIENT_REQUEST_ID_MAX_LEN {
                return Err(AppError::validation(format!(
                    "clientRequestId longer than {CLIENT_REQUEST_ID_MAX_LEN} characters"
                )));
            }
        }
        Ok(())
    }

    /// Collapse empty-string tokens to `None` so the idempotency index
    /// only ever sees meaningful keys.
    pub fn normalized(mut self) -> Self {
        if matches!(self.client_request_id.as_deref(), Some("")) {
            self.client_request_id = None;
        }
        if matches!(self.user_id.as_deref(), Some("")) {
            self.user_id = None;
        }
        self
    }
}
