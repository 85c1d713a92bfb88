//! Service directory module
//!
//! This module contains the peer-endpoint cache split into logical components:
//! - `endpoint`: A single named service endpoint and its URL helpers
//! - `directory`: The concurrently-readable directory and its reconciliation
//! - `error`: Directory error types

pub mod directory;
pub mod endpoint;
pub mod error;

pub use directory::ServiceDirectory;
pub use endpoint::ServiceEndpoint;
pub use error::DirectoryError;
