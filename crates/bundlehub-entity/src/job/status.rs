//! Job status and priority enumerations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use bundlehub_core::error::AppError;

/// Status of a download job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, waiting for a worker slot.
    Queued,
    /// A worker is simulating the download processing.
    Running,
    /// Processing finished, the artifact is being staged.
    ProcessingArtifacts,
    /// Artifact staged, presigned URL available.
    Completed,
    /// Failed after exhausting retries, or failed permanently.
    Failed,
    /// Cancelled by the client.
    Cancelled,
    /// Outlived its TTL before (or after) finishing.
    Expired,
}

impl JobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Expired
        )
    }

    /// Whether the edge `self -> next` is legal in the job state machine.
    ///
    /// The `failed -> queued` retry edge carries an additional attempts
    /// guard enforced at the record level
    /// ([`super::DownloadJob::can_enter`]).
    pub fn can_transition(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Queued, Running | Cancelled | Expired)
                | (Running, ProcessingArtifacts | Failed | Cancelled | Expired)
                | (ProcessingArtifacts, Completed | Failed | Cancelled | Expired)
                | (Failed, Queued)
        )
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::ProcessingArtifacts => "processing_artifacts",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Priority class for a download job.
///
/// Standard jobs drain strictly before low-priority jobs; within a class
/// the queue is FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    /// Normal priority (default).
    #[default]
    Standard,
    /// Best-effort priority, drained only when no standard work waits.
    Low,
}

impl JobPriority {
    /// Return the priority as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for JobPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobPriority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "low" => Ok(Self::Low),
            other => Err(AppError::validation(format!(
                "Unknown priority '{other}', expected 'standard' or 'low'"
            ))),
        }
    }
}
