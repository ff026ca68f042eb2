//! Shared kernel for the BundleHub download job service.
//!
//! Every other crate in the workspace depends on this one for the
//! unified error type, configuration schemas, identifier newtypes, and
//! the capability traits ([`traits::storage::ObjectStore`],
//! [`traits::clock::Clock`]) that decouple the job engine from its
//! collaborators.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;
