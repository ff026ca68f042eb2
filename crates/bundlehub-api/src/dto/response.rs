//! Response DTOs.
//!
//! The wire format is camelCase; the entity layer stays snake_case, so
//! every outbound shape is re-mapped here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bundlehub_entity::job::artifact::{ArtifactResult, JobFailure};
use bundlehub_entity::job::{DownloadJob, JobPriority, JobStatus};
use bundlehub_service::InitiateReceipt;

/// Body of a `202 Accepted` initiate response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateDownloadResponse {
    /// Handle to poll.
    pub job_id: Uuid,
    /// Status at acceptance time.
    pub status: JobStatus,
    /// Server-side poll interval hint.
    pub next_poll_in_ms: u64,
    /// When the job record will be swept.
    pub expires_at: DateTime<Utc>,
    /// Number of files accepted.
    pub total_file_ids: usize,
}

impl From<InitiateReceipt> for InitiateDownloadResponse {
    fn from(receipt: InitiateReceipt) -> Self {
        Self {
            job_id: receipt.job_id.into_uuid(),
            status: receipt.status,
            next_poll_in_ms: receipt.next_poll_in_ms,
            expires_at: receipt.expires_at,
            total_file_ids: receipt.total_file_ids,
        }
    }
}

/// Full job snapshot as returned by the status and resolve endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshotResponse {
    /// Job identifier.
    pub job_id: Uuid,
    /// Files in the bundle.
    pub file_ids: Vec<u64>,
    /// Owner, if one was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Priority class.
    pub priority: JobPriority,
    /// Lifecycle state.
    pub status: JobStatus,
    /// Progress within the current attempt.
    pub progress_percent: u8,
    /// Human-readable status note.
    pub message: String,
    /// Attempts performed.
    pub attempts: u32,
    /// Retry ceiling.
    pub max_attempts: u32,
    /// Staging outcome, when completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ArtifactResultResponse>,
    /// Failure detail, when failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobFailureResponse>,
    /// Client retry hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Start of the current attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Terminal instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Sweep deadline.
    pub expires_at: DateTime<Utc>,
    /// Last mutation instant.
    pub updated_at: DateTime<Utc>,
}

/// Artifact location for a completed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactResultResponse {
    /// Presigned retrieval URL.
    pub url: String,
    /// Descriptor checksum.
    pub checksum: String,
    /// Object size in bytes.
    pub size: u64,
    /// URL expiry instant.
    pub url_expires_at: DateTime<Utc>,
}

impl From<ArtifactResult> for ArtifactResultResponse {
    fn from(result: ArtifactResult) -> Self {
        Self {
            url: result.url,
            checksum: result.checksum,
            size: result.size,
            url_expires_at: result.url_expires_at,
        }
    }
}

/// Failure detail for a failed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFailureResponse {
    /// Failure class.
    pub code: String,
    /// Cause of the last attempt's failure.
    pub message: String,
    /// When the last attempt failed.
    pub last_attempt_at: DateTime<Utc>,
}

impl From<JobFailure> for JobFailureResponse {
    fn from(failure: JobFailure) -> Self {
        Self {
            code: failure.code,
            message: failure.message,
            last_attempt_at: failure.last_attempt_at,
        }
    }
}

impl From<DownloadJob> for JobSnapshotResponse {
    fn from(job: DownloadJob) -> Self {
        Self {
            job_id: job.id.into_uuid(),
            file_ids: job.file_ids,
            user_id: job.user_id,
            priority: job.priority,
            status: job.status,
            progress_percent: job.progress_percent,
            message: job.message,
            attempts: job.attempts,
            max_attempts: job.max_attempts,
            result: job.result.map(Into::into),
            error: job.error.map(Into::into),
            retry_after_ms: job.retry_after_ms,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
            expires_at: job.expires_at,
            updated_at: job.updated_at,
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "degraded".
    pub status: String,
    /// Per-dependency checks.
    pub checks: HealthChecks,
    /// Work queue depth by priority class.
    pub queue: QueueDepth,
    /// Number of job records currently held by the registry.
    pub jobs: usize,
}

/// Dependency check results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthChecks {
    /// Object storage reachability: "ok" or "error".
    pub storage: String,
}

/// Queue depth snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueDepth {
    /// Waiting standard-priority jobs.
    pub standard: usize,
    /// Waiting low-priority jobs.
    pub low: usize,
}
