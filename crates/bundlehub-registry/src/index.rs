//! Secondary index deduplicating submissions by client request ID.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use bundlehub_core::types::id::JobId;
use bundlehub_entity::job::DownloadJob;

/// Deduplication key for a submission.
///
/// Only jobs carrying a non-empty `client_request_id` are indexed; the
/// user ID defaults to the empty string for anonymous submissions so
/// two anonymous callers with the same token still collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey {
    user_id: String,
    client_request_id: String,
}

impl IdempotencyKey {
    /// Build the key for a job, if the job is deduplicable.
    pub fn for_job(job: &DownloadJob) -> Option<Self> {
        let token = job.client_request_id.as_deref()?;
        if token.is_empty() {
            return None;
        }
        Some(Self {
            user_id: job.user_id.clone().unwrap_or_default(),
            client_request_id: token.to_string(),
        })
    }
}

/// Concurrent map from idempotency key to the job currently owning it.
#[derive(Debug, Default)]
pub(crate) struct IdempotencyIndex {
    map: DashMap<IdempotencyKey, JobId>,
}

impl IdempotencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim `key` for `candidate`.
    ///
    /// If the key already maps to a job for which `live` returns a
    /// snapshot, that snapshot is returned and the claim fails. A stale
    /// mapping (record swept or expired) is silently taken over.
    pub fn claim_or_existing<F>(
        &self,
        key: IdempotencyKey,
        candidate: JobId,
        live: F,
    ) -> Option<DownloadJob>
    where
        F: Fn(&JobId) -> Option<DownloadJob>,
    {
        match self.map.entry(key) {
            Entry::Occupied(mut occupied) => {
                if let Some(existing) = live(occupied.get()) {
                    return Some(existing);
                }
                occupied.insert(candidate);
                None
            }
            Entry::Vacant(vacant) => {
                vacant.insert(candidate);
                None
            }
        }
    }

    /// Drop the mapping for `key`, but only if it still points at `id`.
    pub fn release(&self, key: &IdempotencyKey, id: &JobId) {
        self.map.remove_if(key, |_, mapped| mapped == id);
    }

    /// Retain only mappings whose target satisfies `keep`.
    pub fn retain<F>(&self, mut keep: F)
    where
        F: FnMut(&JobId) -> bool,
    {
        self.map.retain(|_, id| keep(id));
    }
}
