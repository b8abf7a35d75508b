//! Credential store adapters
//!
//! - [`InMemoryCredentialStore`]: process-lifetime storage, the default
//! - [`FileCredentialStore`]: JSON file that survives restarts

pub mod file;
pub mod memory;

pub use file::FileCredentialStore;
pub use memory::InMemoryCredentialStore;
