//! Background processing for BundleHub download jobs.
//!
//! The worker crate owns the bounded two-class work queue, the fixed
//! worker pool that drives jobs through the lifecycle state machine,
//! the retry/backoff policy, and the artifact stager that turns a
//! finished job into a presigned download URL.

pub mod backoff;
pub mod queue;
pub mod runner;
pub mod stager;

pub use queue::{QueueError, WorkQueue};
pub use runner::WorkerPool;
pub use stager::{ArtifactStager, StageError};
