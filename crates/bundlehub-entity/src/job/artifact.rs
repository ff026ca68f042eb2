//! Terminal payloads carried by a job record.
//!
//! `result` and `error` are mutually exclusive: the state machine only
//! writes [`ArtifactResult`] on the edge into `completed` and
//! [`JobFailure`] on the edge into `failed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Successful staging outcome: where the artifact can be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactResult {
    /// Presigned retrieval URL.
    pub url: String,
    /// Content checksum of the staged descriptor (`sha256:<base64url>`).
    pub checksum: String,
    /// Size of the staged object in bytes.
    pub size: u64,
    /// Instant after which the URL stops working.
    pub url_expires_at: DateTime<Utc>,
}

/// Terminal failure detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    /// Failure class: "transient", "permanent", or "internal".
    pub code: String,
    /// Cause of the last failed attempt.
    pub message: String,
    /// When the last attempt failed.
    pub last_attempt_at: DateTime<Utc>,
}
