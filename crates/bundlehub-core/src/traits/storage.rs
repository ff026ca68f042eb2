//! Object storage capability trait for artifact staging.
//!
//! The [`ObjectStore`] trait is defined here in `bundlehub-core` and
//! implemented in `bundlehub-storage`. The engine only ever writes small
//! artifact descriptors and requests time-limited retrieval URLs; bulk
//! payload transfer is out of scope.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// A time-limited URL for retrieving a staged object.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PresignedUrl {
    /// Fully qualified retrieval URL.
    pub url: String,
    /// Instant after which the URL is no longer honored.
    pub expires_at: DateTime<Utc>,
}

/// Failure from an [`ObjectStore`] operation.
///
/// The variant determines whether the worker retries the attempt:
/// reachability and backend faults are retryable, malformed input is not.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The storage backend could not be reached.
    #[error("storage unreachable: {0}")]
    Unreachable(String),
    /// The backend answered with a server-side failure.
    #[error("storage backend error: {0}")]
    Backend(String),
    /// The object key is malformed or outside the allowed namespace.
    #[error("invalid object key: {0}")]
    InvalidKey(String),
}

impl StorageError {
    /// Whether a retry of the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::InvalidKey(_))
    }
}

/// Trait for object storage backends used to stage download artifacts.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "memory").
    fn provider_type(&self) -> &str;

    /// Write an object under the given key, overwriting any prior value.
    async fn put_object(&self, key: &str, data: Bytes) -> Result<(), StorageError>;

    /// Produce a presigned GET URL for the given key, valid for `ttl`.
    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError>;

    /// Check whether the backend is healthy and reachable.
    async fn health_check(&self) -> Result<(), StorageError>;
}
