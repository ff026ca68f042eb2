//! Object storage backends for staged download artifacts.
//!
//! Implementations of the [`ObjectStore`] trait from `bundlehub-core`:
//! a local-filesystem provider producing signed time-limited URLs, and
//! an in-memory provider for tests and development.
//!
//! [`ObjectStore`]: bundlehub_core::traits::storage::ObjectStore

pub mod providers;
pub mod signer;

pub use providers::local::LocalObjectStore;
pub use providers::memory::MemoryObjectStore;
pub use signer::UrlSigner;
