//! Registry client module
//!
//! This module contains the registry-facing client surface split into logical components:
//! - `types`: Data structures exchanged with the registry
//! - `error`: Client error types
//! - `registry`: The `RegistryClient` trait consumed by the rest of the crate
//! - `memory`: In-memory registry implementation for tests and local development

pub mod error;
pub mod memory;
pub mod registry;
pub mod types;

pub use error::RegistryError;
pub use memory::InMemoryRegistry;
pub use registry::RegistryClient;
pub use types::{CatalogRecord, HealthStatus, KvListing, KvPair, ServiceDescriptor, check_id};
