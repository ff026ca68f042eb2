//! Bounded in-process work queue with two priority classes.

use std::collections::VecDeque;

use thiserror::Error;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

use bundlehub_core::types::id::JobId;
use bundlehub_entity::job::JobPriority;

/// Failure from [`WorkQueue::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue is at capacity; the caller must surface backpressure.
    #[error("work queue is at capacity")]
    Full,
    /// The queue has been closed for shutdown.
    #[error("work queue is closed")]
    Closed,
}

#[derive(Debug, Default)]
struct Classes {
    standard: VecDeque<JobId>,
    low: VecDeque<JobId>,
    closed: bool,
}

impl Classes {
    fn total(&self) -> usize {
        self.standard.len() + self.low.len()
    }

    fn pop(&mut self) -> Option<JobId> {
        // Standard drains strictly before low.
        self.standard.pop_front().or_else(|| self.low.pop_front())
    }
}

/// Bounded FIFO queue with strict standard-before-low priority.
///
/// Producers never block: a full queue returns [`QueueError::Full`].
/// Consumers block on [`dequeue`](Self::dequeue) until an item arrives,
/// the supplied token is cancelled, or the queue is closed and drained.
#[derive(Debug)]
pub struct WorkQueue {
    classes: Mutex<Classes>,
    notify: Notify,
    capacity: usize,
}

impl WorkQueue {
    /// Create a queue bounded at `capacity` items across both classes.
    pub fn new(capacity: usize) -> Self {
        Self {
            classes: Mutex::new(Classes::default()),
            notify: Notify::new(),
            capacity,
        }
    }

    /// Push a job ID. O(1); never blocks beyond the internal lock.
    pub async fn enqueue(&self, id: JobId, priority: JobPriority) -> Result<(), QueueError> {
        {
            let mut classes = self.classes.lock().await;
            if classes.closed {
                return Err(QueueError::Closed);
            }
            if classes.total() >= self.capacity {
                return Err(QueueError::Full);
            }
            match priority {
                JobPriority::Standard => classes.standard.push_back(id),
                JobPriority::Low => classes.low.push_back(id),
            }
        }
        self.notify.notify_one();
        Ok(())
    }

    /// Pop the next job ID, blocking while the queue is empty.
    ///
    /// Returns `None` when `cancel` fires or the queue is closed with
    /// nothing left to drain.
    pub async fn dequeue(&self, cancel: &CancellationToken) -> Option<JobId> {
        loop {
            {
                let mut classes = self.classes.lock().await;
                if let Some(id) = classes.pop() {
                    if classes.total() > 0 {
                        // Hand the wake along so sibling consumers
                        // drain the backlog without waiting for the
                        // next producer.
                        self.notify.notify_one();
                    }
                    return Some(id);
                }
                if classes.closed {
                    return None;
                }
            }

            tokio::select! {
                _ = self.notify.notified() => {}
                _ = cancel.cancelled() => return None,
            }
        }
    }

    /// Current depth per class: `(standard, low)`.
    pub async fn len(&self) -> (usize, usize) {
        let classes = self.classes.lock().await;
        (classes.standard.len(), classes.low.len())
    }

    /// Whether both classes are empty.
    pub async fn is_empty(&self) -> bool {
        self.classes.lock().await.total() == 0
    }

    /// Close the queue: further enqueues fail, waiting consumers wake.
    pub async fn close(&self) {
        self.classes.lock().await.closed = true;
        self.notify.notify_waiters();
    }
}
