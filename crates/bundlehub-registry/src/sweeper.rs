//! Periodic garbage collection of aged job records.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use bundlehub_core::traits::clock::Clock;

use crate::store::JobRegistry;

/// Background loop driving [`JobRegistry::sweep_once`] on a fixed period.
pub struct RegistrySweeper {
    registry: Arc<JobRegistry>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl std::fmt::Debug for RegistrySweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrySweeper")
            .field("interval", &self.interval)
            .finish()
    }
}

impl RegistrySweeper {
    /// Create a sweeper over the given registry.
    pub fn new(registry: Arc<JobRegistry>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            registry,
            clock,
            interval,
        }
    }

    /// Run until the shutdown channel flips to `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs_f64(), "Registry sweeper started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick of `interval` fires immediately; consume it so
        // the first real sweep happens one period after startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let stats = self.registry.sweep_once(self.clock.now());
                    if stats.expired > 0 || stats.removed > 0 {
                        debug!(
                            expired = stats.expired,
                            removed = stats.removed,
                            remaining = self.registry.len(),
                            "Sweep pass finished"
                        );
                    }
                }
            }
        }

        info!("Registry sweeper stopped");
    }
}
