//! The download job record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bundlehub_core::types::id::JobId;

use super::artifact::{ArtifactResult, JobFailure};
use super::request::DownloadRequest;
use super::status::{JobPriority, JobStatus};

/// One asynchronous bulk-download job.
///
/// The record is owned by the registry; all mutation happens under the
/// registry's per-record lock, and readers only ever see cloned
/// snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadJob {
    /// Process-unique job identifier, stable for the job's lifetime.
    pub id: JobId,
    /// Ordered file identifiers to bundle.
    pub file_ids: Vec<u64>,
    /// Caller-supplied deduplication token, if any.
    pub client_request_id: Option<String>,
    /// Opaque owner identifier, if any.
    pub user_id: Option<String>,
    /// Queue priority class.
    pub priority: JobPriority,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Progress within the current attempt, 0–100.
    pub progress_percent: u8,
    /// Human-readable status note.
    pub message: String,
    /// Worker attempts performed so far.
    pub attempts: u32,
    /// Retry ceiling.
    pub max_attempts: u32,
    /// Staging outcome; populated only when `status == Completed`.
    pub result: Option<ArtifactResult>,
    /// Failure detail; populated only when `status == Failed`.
    pub error: Option<JobFailure>,
    /// Client retry hint in milliseconds.
    pub retry_after_ms: Option<u64>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// First dequeue instant of the current attempt, if any.
    pub started_at: Option<DateTime<Utc>>,
    /// Instant the job reached a terminal state, if it has.
    pub completed_at: Option<DateTime<Utc>>,
    /// Instant after which the record is swept; never mutated.
    pub expires_at: DateTime<Utc>,
    /// Last mutation instant.
    pub updated_at: DateTime<Utc>,
}

impl DownloadJob {
    /// Create a fresh queued record from a normalized request.
    pub fn new(
        id: JobId,
        request: DownloadRequest,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            id,
            file_ids: request.file_ids,
            client_request_id: request.client_request_id,
            user_id: request.user_id,
            priority: request.priority,
            status: JobStatus::Queued,
            progress_percent: 0,
            message: "queued".to_string(),
            attempts: 0,
            max_attempts,
            result: None,
            error: None,
            retry_after_ms: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            expires_at: now + ttl,
            updated_at: now,
        }
    }

    /// Whether this record may move to `next`.
    ///
    /// Combines the status-machine edge table with the record-level
    /// retry guard: `failed -> queued` is only legal while attempts
    /// remain.
    pub fn can_enter(&self, next: JobStatus) -> bool {
        if self.status == JobStatus::Failed && next == JobStatus::Queued {
            return self.attempts < self.max_attempts;
        }
        self.status.can_transition(next)
    }

    /// Whether the record's TTL has elapsed.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
