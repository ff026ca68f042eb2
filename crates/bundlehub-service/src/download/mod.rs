//! Download job operations.

pub mod service;
