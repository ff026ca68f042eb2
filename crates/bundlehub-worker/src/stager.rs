//! Artifact staging: turning a processed job into a retrievable object.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use bundlehub_core::traits::clock::Clock;
use bundlehub_core::traits::storage::{ObjectStore, StorageError};
use bundlehub_entity::job::artifact::ArtifactResult;
use bundlehub_entity::job::DownloadJob;

/// Classified staging failure, driving the worker's retry decision.
#[derive(Debug, Clone, Error)]
pub enum StageError {
    /// Retryable: reachability or backend fault.
    #[error("transient staging failure: {0}")]
    Transient(String),
    /// Not retryable: the job's inputs can never stage successfully.
    #[error("permanent staging failure: {0}")]
    Permanent(String),
}

impl From<StorageError> for StageError {
    fn from(err: StorageError) -> Self {
        if err.is_transient() {
            Self::Transient(err.to_string())
        } else {
            Self::Permanent(err.to_string())
        }
    }
}

/// The descriptor object written to storage for a completed job.
#[derive(Debug, Serialize)]
struct ArtifactDescriptor<'a> {
    job_id: String,
    user_id: Option<&'a str>,
    file_ids: &'a [u64],
    total_files: usize,
    staged_at: DateTime<Utc>,
}

/// Writes per-job artifact descriptors and requests presigned URLs.
pub struct ArtifactStager {
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
    url_ttl: Duration,
}

impl std::fmt::Debug for ArtifactStager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStager")
            .field("provider", &self.store.provider_type())
            .field("url_ttl", &self.url_ttl)
            .finish()
    }
}

impl ArtifactStager {
    /// Create a stager over the given store.
    pub fn new(store: Arc<dyn ObjectStore>, clock: Arc<dyn Clock>, url_ttl: Duration) -> Self {
        Self {
            store,
            clock,
            url_ttl,
        }
    }

    /// Stage the artifact for a job and return its retrieval descriptor.
    ///
    /// Called with an immutable snapshot; never touches the registry.
    pub async fn stage(&self, job: &DownloadJob) -> Result<ArtifactResult, StageError> {
        let key = object_key(job);

        let descriptor = ArtifactDescriptor {
            job_id: job.id.to_string(),
            user_id: job.user_id.as_deref(),
            file_ids: &job.file_ids,
            total_files: job.file_ids.len(),
            staged_at: self.clock.now(),
        };
        let bytes = serde_json::to_vec(&descriptor)
            .map_err(|e| StageError::Permanent(format!("encode descriptor: {e}")))?;

        let checksum = format!(
            "sha256:{}",
            URL_SAFE_NO_PAD.encode(Sha256::digest(&bytes))
        );
        let size = bytes.len() as u64;

        self.store.put_object(&key, bytes.into()).await?;
        let presigned = self.store.presign_get(&key, self.url_ttl).await?;

        debug!(job_id = %job.id, key, size, "Artifact staged");

        Ok(ArtifactResult {
            url: presigned.url,
            checksum,
            size,
            url_expires_at: presigned.expires_at,
        })
    }
}

/// Compose the object key for a job, namespaced by owner and job ID.
fn object_key(job: &DownloadJob) -> String {
    let owner = sanitize_segment(job.user_id.as_deref().unwrap_or(""));
    format!("jobs/{owner}/{}/bundle.json", job.id)
}

/// Reduce an untrusted identifier to a safe single path segment.
fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "anonymous".to_string()
    } else {
        cleaned
    }
}
