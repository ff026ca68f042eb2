//! Job lifecycle configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Job TTL, sweep, and simulated-processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Lifetime of a job record from creation, in seconds.
    #[serde(default = "default_job_ttl")]
    pub job_ttl_seconds: u64,
    /// Registry garbage-collection period, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// Lower bound of the simulated processing delay, in ms.
    #[serde(default = "default_delay_min")]
    pub delay_min_ms: u64,
    /// Upper bound of the simulated processing delay, in ms.
    #[serde(default = "default_delay_max")]
    pub delay_max_ms: u64,
    /// Poll interval hint returned to clients, in ms.
    #[serde(default = "default_next_poll_interval")]
    pub next_poll_interval_ms: u64,
}

impl JobsConfig {
    /// Job TTL as a [`chrono::Duration`] for wall-clock arithmetic.
    pub fn job_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.job_ttl_seconds as i64)
    }

    /// Sweep period as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    /// Simulated delay lower bound as a [`Duration`].
    pub fn delay_min(&self) -> Duration {
        Duration::from_millis(self.delay_min_ms)
    }

    /// Simulated delay upper bound as a [`Duration`].
    pub fn delay_max(&self) -> Duration {
        Duration::from_millis(self.delay_max_ms)
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            job_ttl_seconds: default_job_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
            delay_min_ms: default_delay_min(),
            delay_max_ms: default_delay_max(),
            next_poll_interval_ms: default_next_poll_interval(),
        }
    }
}

fn default_job_ttl() -> u64 {
    3_600
}

fn default_sweep_interval() -> u64 {
    30
}

fn default_delay_min() -> u64 {
    10_000
}

fn default_delay_max() -> u64 {
    120_000
}

fn default_next_poll_interval() -> u64 {
    2_000
}
