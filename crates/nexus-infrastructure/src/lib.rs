//! File-system side of the NexusFlow client: path resolution, atomic TOML
//! storage, the durable credential store and configuration loading.

pub mod config_service;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::paths::{NexusPaths, PathError};
pub use crate::storage::{FileCredentialStore, InMemoryCredentialStore};
