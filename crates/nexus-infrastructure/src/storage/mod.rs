//! Storage layer: atomic TOML files and the credential stores built on them.

mod atomic_toml;
mod credential_store;
mod memory_store;

pub use atomic_toml::{AtomicTomlError, AtomicTomlFile};
pub use credential_store::FileCredentialStore;
pub use memory_store::InMemoryCredentialStore;
