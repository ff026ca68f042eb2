//! Worker pool — drains the queue and drives jobs through their lifecycle.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use bundlehub_core::config::{JobsConfig, WorkerConfig};
use bundlehub_core::traits::clock::Clock;
use bundlehub_core::types::id::JobId;
use bundlehub_entity::job::artifact::JobFailure;
use bundlehub_entity::job::{JobPriority, JobStatus};
use bundlehub_registry::JobRegistry;

use crate::backoff::{full_jitter, sample_delay};
use crate::queue::{QueueError, WorkQueue};
use crate::stager::{ArtifactStager, StageError};

/// How one attempt ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptOutcome {
    /// The job reached `completed`.
    Completed,
    /// The worker walked away: the record was cancelled, expired,
    /// swept, or the pool is shutting down. Nothing was overwritten.
    Abandoned,
}

/// Everything a worker needs, shared across the pool.
#[derive(Debug)]
struct WorkerContext {
    registry: Arc<JobRegistry>,
    queue: Arc<WorkQueue>,
    stager: Arc<ArtifactStager>,
    clock: Arc<dyn Clock>,
    worker: WorkerConfig,
    jobs: JobsConfig,
    shutdown: CancellationToken,
}

/// Fixed-size pool of long-lived workers draining the work queue.
///
/// Each worker loops: dequeue, claim the record (`queued -> running`),
/// simulate the processing delay in cancellable progress ticks, stage
/// the artifact, and write the terminal state back. Transient failures
/// retry with full-jitter backoff up to the job's attempt ceiling;
/// panics are caught and recorded as terminal internal failures.
#[derive(Debug)]
pub struct WorkerPool {
    ctx: Arc<WorkerContext>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Assemble a pool. Workers do not run until [`start`](Self::start).
    pub fn new(
        registry: Arc<JobRegistry>,
        queue: Arc<WorkQueue>,
        stager: Arc<ArtifactStager>,
        clock: Arc<dyn Clock>,
        worker: WorkerConfig,
        jobs: JobsConfig,
    ) -> Self {
        Self {
            ctx: Arc::new(WorkerContext {
                registry,
                queue,
                stager,
                clock,
                worker,
                jobs,
                shutdown: CancellationToken::new(),
            }),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the worker tasks. Idempotent.
    pub async fn start(&self) {
        let mut handles = self.handles.lock().await;
        if !handles.is_empty() {
            return;
        }
        info!(
            concurrency = self.ctx.worker.concurrency,
            "Worker pool starting"
        );
        for worker_id in 0..self.ctx.worker.concurrency {
            let ctx = Arc::clone(&self.ctx);
            handles.push(tokio::spawn(Self::worker_loop(ctx, worker_id)));
        }
    }

    /// Stop the pool: close the queue, signal in-flight workers, and
    /// wait up to the shutdown grace period before aborting stragglers.
    pub async fn stop(&self) {
        info!("Worker pool stopping");
        self.ctx.queue.close().await;
        self.ctx.shutdown.cancel();

        let handles: Vec<JoinHandle<()>> = self.handles.lock().await.drain(..).collect();
        let aborts: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();
        let drain = futures::future::join_all(handles);

        if tokio::time::timeout(self.ctx.worker.shutdown_grace(), drain)
            .await
            .is_err()
        {
            warn!("Shutdown grace elapsed; aborting in-flight workers");
            for abort in aborts {
                abort.abort();
            }
        }
        info!("Worker pool stopped");
    }

    async fn worker_loop(ctx: Arc<WorkerContext>, worker_id: usize) {
        debug!(worker_id, "Worker started");
        loop {
            let Some(job_id) = ctx.queue.dequeue(&ctx.shutdown).await else {
                break;
            };
            Self::process(&ctx, job_id).await;
        }
        debug!(worker_id, "Worker stopped");
    }

    /// Run one dequeued job to a conclusion. Never propagates errors.
    async fn process(ctx: &Arc<WorkerContext>, job_id: JobId) {
        let now = ctx.clock.now();
        let claimed = match ctx.registry.update(&job_id, |job| {
            if job.status == JobStatus::Queued {
                job.status = JobStatus::Running;
                job.started_at = Some(now);
                job.attempts += 1;
                job.progress_percent = 0;
                job.message = "processing".to_string();
                job.retry_after_ms = None;
            }
        }) {
            Ok(snapshot) => snapshot,
            Err(_) => {
                debug!(job_id = %job_id, "Dequeued job no longer in the registry");
                return;
            }
        };
        if claimed.status != JobStatus::Running {
            debug!(
                job_id = %job_id,
                status = %claimed.status,
                "Dropping dequeued job in non-runnable state"
            );
            return;
        }

        debug!(
            job_id = %job_id,
            attempt = claimed.attempts,
            max_attempts = claimed.max_attempts,
            "Attempt started"
        );

        let attempt = Self::run_attempt(ctx, job_id);
        let fenced =
            AssertUnwindSafe(tokio::time::timeout(ctx.worker.per_attempt_timeout(), attempt))
                .catch_unwind()
                .await;

        match fenced {
            Err(_panic) => {
                error!(job_id = %job_id, "Worker attempt panicked; marking job failed");
                Self::mark_failed_terminal(ctx, &job_id, "internal", "worker panicked during processing");
            }
            Ok(Err(_elapsed)) => {
                Self::handle_failure(
                    ctx,
                    &job_id,
                    StageError::Transient("attempt_timeout".to_string()),
                )
                .await;
            }
            Ok(Ok(Err(stage_err))) => {
                Self::handle_failure(ctx, &job_id, stage_err).await;
            }
            Ok(Ok(Ok(AttemptOutcome::Completed))) => {}
            Ok(Ok(Ok(AttemptOutcome::Abandoned))) => {
                debug!(job_id = %job_id, "Attempt abandoned");
            }
        }
    }

    /// The attempt pipeline: simulated processing, staging, completion.
    async fn run_attempt(
        ctx: &Arc<WorkerContext>,
        job_id: JobId,
    ) -> Result<AttemptOutcome, StageError> {
        let total = sample_delay(ctx.jobs.delay_min(), ctx.jobs.delay_max());
        let tick = ctx.worker.progress_tick_interval();
        let started = tokio::time::Instant::now();

        loop {
            let elapsed = started.elapsed();
            if elapsed >= total {
                break;
            }
            let nap = (total - elapsed).min(tick);
            tokio::select! {
                _ = tokio::time::sleep(nap) => {}
                _ = ctx.shutdown.cancelled() => return Ok(AttemptOutcome::Abandoned),
            }

            // Progress is the elapsed fraction of the sampled delay,
            // capped at 95 until the artifact is staged.
            let ratio = started.elapsed().as_secs_f64() / total.as_secs_f64();
            let pct = ((ratio * 100.0) as u8).min(95);
            match ctx.registry.update(&job_id, |job| {
                if job.status == JobStatus::Running && pct > job.progress_percent {
                    job.progress_percent = pct;
                }
            }) {
                Ok(snapshot)
                    if matches!(
                        snapshot.status,
                        JobStatus::Cancelled | JobStatus::Expired
                    ) =>
                {
                    debug!(
                        job_id = %job_id,
                        status = %snapshot.status,
                        "Abandoning attempt at tick boundary"
                    );
                    return Ok(AttemptOutcome::Abandoned);
                }
                Ok(_) => {}
                Err(_) => return Ok(AttemptOutcome::Abandoned),
            }
        }

        let staging = match ctx.registry.update(&job_id, |job| {
            if job.status == JobStatus::Running {
                job.status = JobStatus::ProcessingArtifacts;
                job.progress_percent = 95;
                job.message = "staging artifact".to_string();
            }
        }) {
            Ok(snapshot) if snapshot.status == JobStatus::ProcessingArtifacts => snapshot,
            _ => return Ok(AttemptOutcome::Abandoned),
        };

        let artifact = tokio::select! {
            staged = ctx.stager.stage(&staging) => staged?,
            _ = ctx.shutdown.cancelled() => return Ok(AttemptOutcome::Abandoned),
        };

        let now = ctx.clock.now();
        match ctx.registry.update(&job_id, |job| {
            if job.status == JobStatus::ProcessingArtifacts {
                job.status = JobStatus::Completed;
                job.progress_percent = 100;
                job.result = Some(artifact.clone());
                job.error = None;
                job.completed_at = Some(now);
                job.message = "completed".to_string();
                job.retry_after_ms = None;
            }
        }) {
            Ok(snapshot) if snapshot.status == JobStatus::Completed => {
                info!(
                    job_id = %job_id,
                    attempts = snapshot.attempts,
                    "Job completed"
                );
                Ok(AttemptOutcome::Completed)
            }
            _ => Ok(AttemptOutcome::Abandoned),
        }
    }

    /// Record a failed attempt and schedule a retry if one remains.
    async fn handle_failure(ctx: &Arc<WorkerContext>, job_id: &JobId, err: StageError) {
        let now = ctx.clock.now();
        let (code, transient) = match &err {
            StageError::Transient(_) => ("transient", true),
            StageError::Permanent(_) => ("permanent", false),
        };
        let cause = match &err {
            StageError::Transient(m) | StageError::Permanent(m) => m.clone(),
        };

        let failed = match ctx.registry.update(job_id, |job| {
            if matches!(
                job.status,
                JobStatus::Running | JobStatus::ProcessingArtifacts
            ) {
                job.status = JobStatus::Failed;
                job.result = None;
                job.error = Some(JobFailure {
                    code: code.to_string(),
                    message: cause.clone(),
                    last_attempt_at: now,
                });
                job.completed_at = Some(now);
                job.message = format!("attempt {} failed: {cause}", job.attempts);
                job.retry_after_ms = None;
            }
        }) {
            Ok(snapshot) if snapshot.status == JobStatus::Failed => snapshot,
            Ok(snapshot) => {
                debug!(
                    job_id = %job_id,
                    status = %snapshot.status,
                    "Failure raced a terminal state; leaving record untouched"
                );
                return;
            }
            Err(_) => return,
        };

        if transient && failed.attempts < failed.max_attempts {
            let delay = full_jitter(
                failed.attempts,
                ctx.worker.backoff_base(),
                ctx.worker.backoff_max(),
            );
            let requeued = ctx.registry.update(job_id, |job| {
                if job.status == JobStatus::Failed && job.attempts < job.max_attempts {
                    job.status = JobStatus::Queued;
                    job.progress_percent = 0;
                    job.started_at = None;
                    job.completed_at = None;
                    job.error = None;
                    job.retry_after_ms = Some(delay.as_millis() as u64);
                    job.message =
                        format!("retry {} of {} scheduled", job.attempts + 1, job.max_attempts);
                }
            });
            if let Ok(snapshot) = requeued {
                if snapshot.status == JobStatus::Queued {
                    warn!(
                        job_id = %job_id,
                        attempt = failed.attempts,
                        delay_ms = delay.as_millis() as u64,
                        cause = %cause,
                        "Transient failure; retry scheduled"
                    );
                    Self::spawn_delayed_requeue(ctx, *job_id, snapshot.priority, delay);
                }
            }
        } else {
            warn!(
                job_id = %job_id,
                attempts = failed.attempts,
                code,
                cause = %cause,
                "Job failed terminally"
            );
        }
    }

    /// Re-enqueue a retrying job after its backoff window.
    ///
    /// If the queue is full when the window elapses, the task keeps
    /// waiting one backoff window at a time; the sweeper bounds the
    /// loop by expiring the record at its TTL. Nothing is ever
    /// silently dropped.
    fn spawn_delayed_requeue(
        ctx: &Arc<WorkerContext>,
        job_id: JobId,
        priority: JobPriority,
        initial_delay: Duration,
    ) {
        let ctx = Arc::clone(ctx);
        tokio::spawn(async move {
            let mut delay = initial_delay;
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = ctx.shutdown.cancelled() => return,
                }
                match ctx.registry.get(&job_id) {
                    Some(job) if job.status == JobStatus::Queued => {}
                    _ => return,
                }
                match ctx.queue.enqueue(job_id, priority).await {
                    Ok(()) | Err(QueueError::Closed) => return,
                    Err(QueueError::Full) => {
                        warn!(
                            job_id = %job_id,
                            "Queue full at retry time; waiting another backoff window"
                        );
                        delay = full_jitter(
                            1,
                            ctx.worker.backoff_base(),
                            ctx.worker.backoff_max(),
                        );
                    }
                }
            }
        });
    }

    /// Terminal failure that bypasses the retry policy (panic fence).
    fn mark_failed_terminal(ctx: &Arc<WorkerContext>, job_id: &JobId, code: &str, message: &str) {
        let now = ctx.clock.now();
        let _ = ctx.registry.update(job_id, |job| {
            if matches!(
                job.status,
                JobStatus::Running | JobStatus::ProcessingArtifacts
            ) {
                job.status = JobStatus::Failed;
                job.result = None;
                job.error = Some(JobFailure {
                    code: code.to_string(),
                    message: message.to_string(),
                    last_attempt_at: now,
                });
                job.completed_at = Some(now);
                job.message = message.to_string();
                job.retry_after_ms = None;
            }
        });
    }
}
