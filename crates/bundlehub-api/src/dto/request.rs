//! Request DTOs.

use serde::Deserialize;

use bundlehub_core::error::AppError;
use bundlehub_core::result::AppResult;
use bundlehub_entity::job::{DownloadRequest, JobPriority};

/// Body of `POST /v1/download/initiate`.
///
/// Both the array form (`file_ids`) and the legacy single form
/// (`file_id`) are accepted; the single form is normalized to a
/// one-element list. `priority` is parsed by hand so unknown values
/// surface as validation errors rather than body-rejection errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitiateDownloadRequest {
    /// Files to include in the bundle.
    #[serde(default)]
    pub file_ids: Option<Vec<u64>>,
    /// Single-file shorthand.
    #[serde(default)]
    pub file_id: Option<u64>,
    /// Deduplication token.
    #[serde(default, rename = "clientRequestId")]
    pub client_request_id: Option<String>,
    /// Opaque owner identifier.
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
    /// Queue priority: "standard" (default) or "low".
    #[serde(default)]
    pub priority: Option<String>,
}

impl InitiateDownloadRequest {
    /// Normalize the wire shape into the engine's request type.
    pub fn into_download_request(self) -> AppResult<DownloadRequest> {
        let file_ids = match (self.file_ids, self.file_id) {
            (Some(ids), _) => ids,
            (None, Some(single)) => vec![single],
            (None, None) => {
                return Err(AppError::validation(
                    "either file_ids or file_id is required",
                ));
            }
        };

        let priority = self
            .priority
            .as_deref()
            .map(str::parse::<JobPriority>)
            .transpose()?
            .unwrap_or_default();

        Ok(DownloadRequest {
            file_ids,
            client_request_id: self.client_request_id,
            user_id: self.user_id,
            priority,
        })
    }
}

/// Query parameters of `GET /v1/download/:job_id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolveQuery {
    /// Pass `format=json` to receive the snapshot instead of a redirect.
    #[serde(default)]
    pub format: Option<String>,
}
