//! Service façade consumed by the HTTP layer.

pub mod download;

pub use download::service::{DownloadService, InitiateReceipt, Resolution};
