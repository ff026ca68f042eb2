//! The download job entity: record, status machine, and payloads.

pub mod artifact;
pub mod model;
pub mod request;
pub mod status;

pub use artifact::{ArtifactResult, JobFailure};
pub use model::DownloadJob;
pub use request::DownloadRequest;
pub use status::{JobPriority, JobStatus};
