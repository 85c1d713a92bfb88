//! Credential store module
//!
//! This module contains the credential cache split into logical components:
//! - `store`: Credential groups and version-gated reconciliation
//! - `watch`: The long-poll watch loop publishing change events

pub mod store;
pub mod watch;

pub use store::{CredentialEntry, CredentialGroup, CredentialStore};
pub use watch::{CredentialWatcher, update_stream};
