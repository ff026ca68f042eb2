//! The download job façade: Initiate, Status, Resolve, Cancel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use bundlehub_core::config::AppConfig;
use bundlehub_core::error::AppError;
use bundlehub_core::result::AppResult;
use bundlehub_core::traits::clock::Clock;
use bundlehub_core::types::id::JobId;
use bundlehub_entity::job::{DownloadJob, DownloadRequest, JobStatus};
use bundlehub_registry::{InsertOutcome, JobRegistry};
use bundlehub_worker::{QueueError, WorkQueue};

/// Receipt returned by [`DownloadService::initiate`].
#[derive(Debug, Clone)]
pub struct InitiateReceipt {
    /// The job handle to poll.
    pub job_id: JobId,
    /// Status at receipt time (`queued`, or later for a deduplicated hit).
    pub status: JobStatus,
    /// Server-side poll interval hint, in milliseconds.
    pub next_poll_in_ms: u64,
    /// When the job record will be swept.
    pub expires_at: DateTime<Utc>,
    /// Number of files accepted into the bundle.
    pub total_file_ids: usize,
}

/// Outcome of [`DownloadService::resolve`].
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The artifact is ready; redirect the client to this URL.
    Redirect(String),
    /// The job is still in flight; the snapshot carries its progress.
    NotReady(DownloadJob),
    /// The job ended without a retrievable artifact.
    Gone(DownloadJob),
    /// Unknown or expired job.
    NotFound,
}

/// Synchronous API over the job engine, consumed by the HTTP handlers.
///
/// Initiate never blocks on worker progress: it validates, consults the
/// idempotency index, stores the record, pushes the ID onto the queue,
/// and returns.
pub struct DownloadService {
    registry: Arc<JobRegistry>,
    queue: Arc<WorkQueue>,
    clock: Arc<dyn Clock>,
    job_ttl: chrono::Duration,
    max_attempts: u32,
    next_poll_in_ms: u64,
}

impl std::fmt::Debug for DownloadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadService").finish()
    }
}

impl DownloadService {
    /// Create the façade over an assembled engine.
    pub fn new(
        registry: Arc<JobRegistry>,
        queue: Arc<WorkQueue>,
        clock: Arc<dyn Clock>,
        config: &AppConfig,
    ) -> Self {
        Self {
            registry,
            queue,
            clock,
            job_ttl: config.jobs.job_ttl(),
            max_attempts: config.worker.max_attempts,
            next_poll_in_ms: config.jobs.next_poll_interval_ms,
        }
    }

    /// Accept a download submission and return a pollable job handle.
    ///
    /// A resubmission carrying the same `(user_id, client_request_id)`
    /// returns the existing job's receipt, even if that job already
    /// finished, and never enqueues a second time.
    pub async fn initiate(&self, request: DownloadRequest) -> AppResult<InitiateReceipt> {
        request.validate()?;
        let request = request.normalized();

        let job = DownloadJob::new(
            JobId::new(),
            request,
            self.clock.now(),
            self.job_ttl,
            self.max_attempts,
        );

        let snapshot = match self.registry.insert(job) {
            InsertOutcome::Existing(existing) => {
                debug!(job_id = %existing.id, "Initiate deduplicated onto existing job");
                return Ok(self.receipt(&existing));
            }
            InsertOutcome::Inserted(snapshot) => snapshot,
        };

        if let Err(err) = self.queue.enqueue(snapshot.id, snapshot.priority).await {
            // Roll the record back so a retry is not deduplicated onto
            // a job that was never admitted.
            self.registry.remove(&snapshot.id);
            return Err(match err {
                QueueError::Full => {
                    AppError::service_unavailable("download queue is at capacity")
                }
                QueueError::Closed => {
                    AppError::service_unavailable("service is shutting down")
                }
            });
        }

        info!(
            job_id = %snapshot.id,
            files = snapshot.file_ids.len(),
            priority = %snapshot.priority,
            "Download job accepted"
        );
        Ok(self.receipt(&snapshot))
    }

    /// Immutable snapshot of a job, if it is still known.
    pub fn status(&self, job_id: &JobId) -> Option<DownloadJob> {
        self.registry.get(job_id)
    }

    /// Resolve a job to its artifact URL, or report why that is not
    /// possible yet (or anymore).
    pub fn resolve(&self, job_id: &JobId) -> Resolution {
        let Some(job) = self.registry.get(job_id) else {
            return Resolution::NotFound;
        };

        match job.status {
            JobStatus::Completed => match &job.result {
                Some(result) if self.clock.now() < result.url_expires_at => {
                    Resolution::Redirect(result.url.clone())
                }
                _ => Resolution::Gone(job),
            },
            JobStatus::Queued | JobStatus::Running | JobStatus::ProcessingArtifacts => {
                Resolution::NotReady(job)
            }
            JobStatus::Failed | JobStatus::Cancelled => Resolution::Gone(job),
            JobStatus::Expired => Resolution::NotFound,
        }
    }

    /// Cancel a job. Idempotent: terminal jobs are returned untouched.
    ///
    /// The worker holding the job observes the cancellation at its next
    /// tick boundary and abandons without staging.
    pub fn cancel(&self, job_id: &JobId) -> Option<DownloadJob> {
        let now = self.clock.now();
        let result = self.registry.update(job_id, |job| {
            if !job.status.is_terminal() {
                job.status = JobStatus::Cancelled;
                job.completed_at = Some(now);
                job.message = "cancelled by client".to_string();
                job.retry_after_ms = None;
            }
        });
        match result {
            Ok(snapshot) => {
                if snapshot.status == JobStatus::Cancelled {
                    info!(job_id = %job_id, "Job cancelled");
                }
                Some(snapshot)
            }
            Err(_) => None,
        }
    }

    fn receipt(&self, job: &DownloadJob) -> InitiateReceipt {
        InitiateReceipt {
            job_id: job.id,
            status: job.status,
            next_poll_in_ms: self.next_poll_in_ms,
            expires_at: job.expires_at,
            total_file_ids: job.file_ids.len(),
        }
    }
}
