//! Worker pool and queue configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Background worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent job processing workers.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Bounded capacity of the work queue (sum of both priority classes).
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Retry ceiling per job.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Upper bound on one attempt's wall duration, in seconds.
    #[serde(default = "default_per_attempt_timeout")]
    pub per_attempt_timeout_seconds: u64,
    /// Granularity of progress updates and cancellation checks, in ms.
    #[serde(default = "default_progress_tick_interval")]
    pub progress_tick_interval_ms: u64,
    /// Retry backoff base, in ms.
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,
    /// Retry backoff ceiling, in ms.
    #[serde(default = "default_backoff_max")]
    pub backoff_max_ms: u64,
    /// Time allowed for in-flight jobs to drain on shutdown, in seconds.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

impl WorkerConfig {
    /// Per-attempt timeout as a [`Duration`].
    pub fn per_attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.per_attempt_timeout_seconds)
    }

    /// Progress tick interval as a [`Duration`].
    pub fn progress_tick_interval(&self) -> Duration {
        Duration::from_millis(self.progress_tick_interval_ms)
    }

    /// Backoff base as a [`Duration`].
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// Backoff ceiling as a [`Duration`].
    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }

    /// Shutdown grace period as a [`Duration`].
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            queue_capacity: default_queue_capacity(),
            max_attempts: default_max_attempts(),
            per_attempt_timeout_seconds: default_per_attempt_timeout(),
            progress_tick_interval_ms: default_progress_tick_interval(),
            backoff_base_ms: default_backoff_base(),
            backoff_max_ms: default_backoff_max(),
            shutdown_grace_seconds: default_shutdown_grace(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    256
}

fn default_max_attempts() -> u32 {
    3
}

fn default_per_attempt_timeout() -> u64 {
    180
}

fn default_progress_tick_interval() -> u64 {
    500
}

fn default_backoff_base() -> u64 {
    1_000
}

fn default_backoff_max() -> u64 {
    30_000
}

fn default_shutdown_grace() -> u64 {
    10
}
