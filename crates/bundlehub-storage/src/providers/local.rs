//! Local filesystem object store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use bundlehub_core::config::StorageConfig;
use bundlehub_core::error::AppError;
use bundlehub_core::result::AppResult;
use bundlehub_core::traits::clock::Clock;
use bundlehub_core::traits::storage::{ObjectStore, PresignedUrl, StorageError};

use crate::signer::UrlSigner;

use super::validate_key;

/// Object store rooted at a local directory.
///
/// Presigned URLs point at `{base_url}/{key}` and carry an expiry
/// timestamp plus a signed token; whatever serves `base_url` verifies
/// them with the same [`UrlSigner`] secret.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    base_url: String,
    signer: UrlSigner,
    clock: Arc<dyn Clock>,
}

impl LocalObjectStore {
    /// Create a local store, creating the root directory if missing.
    pub async fn new(config: &StorageConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let root = PathBuf::from(&config.root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                bundlehub_core::error::ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            signer: UrlSigner::new(config.signing_secret.clone()),
            clock,
        })
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    async fn ensure_parent(&self, path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Backend(format!("create parent directory: {e}")))?;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn put_object(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        validate_key(key)?;
        let path = self.resolve(key);
        self.ensure_parent(&path).await?;

        fs::write(&path, &data)
            .await
            .map_err(|e| StorageError::Backend(format!("write object {key}: {e}")))?;

        debug!(key, bytes = data.len(), "Wrote object");
        Ok(())
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError> {
        validate_key(key)?;
        let expires_at = self.clock.now()
            + chrono::Duration::seconds(ttl.as_secs() as i64);
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
        let metadata = fs::metadata(&self.root)
            .await
            .map_err(|e| StorageError::Unreachable(format!("storage root: {e}")))?;
        if !metadata.is_dir() {
            return Err(StorageError::Unreachable(
                "storage root is not a directory".to_string(),
            ));
        }
        Ok(())
    }
}
