//! Concurrent job store with state-machine enforcement.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, trace, warn};

use bundlehub_core::error::AppError;
use bundlehub_core::result::AppResult;
use bundlehub_core::traits::clock::Clock;
use bundlehub_core::types::id::JobId;
use bundlehub_entity::job::{DownloadJob, JobStatus};

use crate::index::{IdempotencyIndex, IdempotencyKey};

/// Outcome of [`JobRegistry::insert`].
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    /// The record was stored; the snapshot is the fresh record.
    Inserted(DownloadJob),
    /// An unexpired record with the same idempotency key already exists.
    Existing(DownloadJob),
}

/// Counters reported by one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Non-terminal records transitioned to `expired` this pass.
    pub expired: usize,
    /// Records removed from the registry this pass.
    pub removed: usize,
}

/// The in-process registry owning all job records.
///
/// Records live in a concurrent map; mutation goes through
/// [`update`](Self::update), which applies the caller's mutator to a
/// draft copy under the record's exclusive entry lock, validates the
/// result against the job state machine, and commits atomically.
/// Readers always receive detached snapshots.
#[derive(Debug)]
pub struct JobRegistry {
    records: DashMap<JobId, DownloadJob>,
    index: IdempotencyIndex,
    clock: Arc<dyn Clock>,
}

impl JobRegistry {
    /// Create an empty registry.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            index: IdempotencyIndex::new(),
            clock,
        }
    }

    /// Store a new record, deduplicating on the idempotency key.
    ///
    /// If an unexpired record with the same `(user_id,
    /// client_request_id)` exists, that record is returned instead and
    /// nothing is stored. Atomic with respect to concurrent inserts of
    /// the same key.
    pub fn insert(&self, job: DownloadJob) -> InsertOutcome {
        let now = self.clock.now();
        let key = IdempotencyKey::for_job(&job);

        // The record is stored before the index claim: a concurrent
        // duplicate that wins the claim must be able to observe a live
        // record behind the mapping. The ID has not been handed out
        // yet, so the early-stored record is unreachable to readers.
        self.records.insert(job.id, job.clone());

        if let Some(key) = key {
            let existing = self.index.claim_or_existing(key, job.id, |mapped| {
                if mapped == &job.id {
                    return None;
                }
                self.records
                    .get(mapped)
                    .map(|r| r.value().clone())
                    .filter(|record| !record.is_expired_at(now))
            });
            if let Some(existing) = existing {
                self.records.remove(&job.id);
                debug!(job_id = %existing.id, "Duplicate submission matched existing job");
                return InsertOutcome::Existing(existing);
            }
        }

        trace!(job_id = %job.id, priority = %job.priority, "Job record inserted");
        InsertOutcome::Inserted(job)
    }

    /// Fetch a detached snapshot of a record.
    pub fn get(&self, id: &JobId) -> Option<DownloadJob> {
        self.records.get(id).map(|r| r.value().clone())
    }

    /// Apply `mutate` to the record under its exclusive lock.
    ///
    /// The mutator runs against a draft copy; the commit is rejected if
    /// the draft violates the state machine or the record invariants,
    /// in which case the stored record is untouched. Returns the
    /// post-image snapshot.
    pub fn update<F>(&self, id: &JobId, mutate: F) -> AppResult<DownloadJob>
    where
        F: FnOnce(&mut DownloadJob),
    {
        let mut entry = self
            .records
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("Job {id} not found")))?;

        let current = entry.value();
        let mut draft = current.clone();
        mutate(&mut draft);

        if draft == *current {
            return Ok(draft);
        }

        Self::validate_draft(current, &draft)?;

        draft.updated_at = self.clock.now();
        *entry.value_mut() = draft.clone();
        Ok(draft)
    }

    /// Remove a record and its index entry. Returns the final snapshot.
    pub fn remove(&self, id: &JobId) -> Option<DownloadJob> {
        let (_, job) = self.records.remove(id)?;
        if let Some(key) = IdempotencyKey::for_job(&job) {
            self.index.release(&key, &job.id);
        }
        trace!(job_id = %job.id, status = %job.status, "Job record removed");
        Some(job)
    }

    /// Snapshot all records, optionally filtered by status. Diagnostics only.
    pub fn list(&self, status: Option<JobStatus>) -> Vec<DownloadJob> {
        self.records
            .iter()
            .map(|r| r.value().clone())
            .filter(|job| status.map_or(true, |s| job.status == s))
            .collect()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the registry holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One garbage-collection pass.
    ///
    /// Non-terminal records past their TTL transition to `expired` (a
    /// legal edge from every non-terminal state, including under a
    /// racing worker); terminal records past their TTL are removed
    /// together with their index entries. An expired record is thus
    /// removed on the pass after the one that marked it.
    pub fn sweep_once(&self, now: DateTime<Utc>) -> SweepStats {
        let mut stats = SweepStats::default();

        let ids: Vec<JobId> = self.records.iter().map(|r| *r.key()).collect();
        for id in ids {
            let remove = {
                let Some(mut entry) = self.records.get_mut(&id) else {
                    continue;
                };
                let job = entry.value_mut();
                if !job.is_expired_at(now) {
                    continue;
                }
                if job.status.is_terminal() {
                    true
                } else {
                    debug!(job_id = %job.id, status = %job.status, "Expiring stale job");
                    job.status = JobStatus::Expired;
                    job.completed_at = Some(now);
                    job.message = "expired".to_string();
                    job.retry_after_ms = None;
                    job.updated_at = now;
                    stats.expired += 1;
                    false
                }
            };
            if remove && self.remove(&id).is_some() {
                stats.removed += 1;
            }
        }

        // Index entries whose record vanished through an external remove.
        self.index.retain(|id| self.records.contains_key(id));

        stats
    }

    fn validate_draft(current: &DownloadJob, draft: &DownloadJob) -> AppResult<()> {
        if draft.id != current.id {
            return Err(AppError::internal("Job id is immutable"));
        }
        if draft.expires_at != current.expires_at {
            return Err(AppError::internal("Job expires_at is immutable"));
        }
        if draft.status == current.status && current.status.is_terminal() {
            warn!(job_id = %current.id, status = %current.status, "Rejected mutation of terminal record");
            return Err(AppError::internal(format!(
                "Terminal job in status {} cannot be mutated",
                current.status
            )));
        }
        if draft.status != current.status && !current.can_enter(draft.status) {
            warn!(
                job_id = %current.id,
                from = %current.status,
                to = %draft.status,
                "Rejected illegal status transition"
            );
            return Err(AppError::internal(format!(
                "Illegal status transition {} -> {}",
                current.status, draft.status
            )));
        }
        if draft.attempts > draft.max_attempts {
            return Err(AppError::internal("Job attempts exceed the retry ceiling"));
        }
        if draft.status.is_terminal() && draft.completed_at.is_none() {
            return Err(AppError::internal(
                "Terminal job must carry a completion timestamp",
            ));
        }
        match draft.status {
            JobStatus::Completed if draft.result.is_none() || draft.error.is_some() => Err(
                AppError::internal("Completed job must carry a result and no error"),
            ),
            JobStatus::Failed if draft.error.is_none() || draft.result.is_some() => Err(
                AppError::internal("Failed job must carry an error and no result"),
            ),
            _ => Ok(()),
        }
    }
}
