//! In-memory object store for tests and development.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use bundlehub_core::config::StorageConfig;
use bundlehub_core::traits::clock::Clock;
use bundlehub_core::traits::storage::{ObjectStore, PresignedUrl, StorageError};

use crate::signer::UrlSigner;

use super::validate_key;

/// Object store holding everything in process memory.
#[derive(Debug, Clone)]
pub struct MemoryObjectStore {
    objects: Arc<DashMap<String, Bytes>>,
    base_url: String,
    signer: UrlSigner,
    clock: Arc<dyn Clock>,
}

impl MemoryObjectStore {
    /// Create an empty in-memory store.
    pub fn new(config: &StorageConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            objects: Arc::new(DashMap::new()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            signer: UrlSigner::new(config.signing_secret.clone()),
            clock,
        }
    }

    /// Number of stored objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Fetch a stored object, if present.
    pub fn get_object(&self, key: &str) -> Option<Bytes> {
        self.objects.get(key).map(|o| o.value().clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn put_object(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        validate_key(key)?;
        self.objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError> {
        validate_key(key)?;
        let expires_at = self.clock.now() + chrono::Duration::seconds(ttl.as_secs() as i64);
        let expires_unix = expires_at.timestamp();
        let token = self.signer.sign(key, expires_unix);

        Ok(PresignedUrl {
            url: format!(
                "{}/{key}?expires={expires_unix}&token={token}",
                self.base_url
            ),
            expires_at,
        })
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
