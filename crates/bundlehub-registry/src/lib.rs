//! In-process job registry.
//!
//! The registry owns every job record in the process: a concurrent map
//! from job ID to record, a secondary idempotency index on
//! `(user_id, client_request_id)`, and a periodic sweeper that expires
//! and removes records past their TTL. All record mutation funnels
//! through [`JobRegistry::update`], which enforces the job state
//! machine under per-record exclusion.

pub mod index;
pub mod store;
pub mod sweeper;

pub use index::IdempotencyKey;
pub use store::{InsertOutcome, JobRegistry, SweepStats};
pub use sweeper::RegistrySweeper;
