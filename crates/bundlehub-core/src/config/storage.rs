//! Artifact storage configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Object storage settings for staged artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Provider type: "local" or "memory".
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Root directory for the local provider.
    #[serde(default = "default_root_path")]
    pub root_path: String,
    /// Public base URL presigned links are rooted at.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Secret used to sign presigned URLs.
    #[serde(default = "default_signing_secret")]
    pub signing_secret: String,
    /// Presigned URL lifetime in seconds.
    #[serde(default = "default_artifact_url_ttl")]
    pub artifact_url_ttl_seconds: u64,
}

impl StorageConfig {
    /// Presigned URL lifetime as a [`Duration`].
    pub fn artifact_url_ttl(&self) -> Duration {
        Duration::from_secs(self.artifact_url_ttl_seconds)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            root_path: default_root_path(),
            base_url: default_base_url(),
            signing_secret: default_signing_secret(),
            artifact_url_ttl_seconds: default_artifact_url_ttl(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_root_path() -> String {
    "data/artifacts".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8080/artifacts".to_string()
}

fn default_signing_secret() -> String {
    "dev-only-signing-secret".to_string()
}

fn default_artifact_url_ttl() -> u64 {
    900
}
