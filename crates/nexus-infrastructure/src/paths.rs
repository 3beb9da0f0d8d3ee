//! Unified path management for NexusFlow client files.
//!
//! ```text
//! ~/.config/nexusflow/        # Config directory
//! ├── config.toml             # Client configuration (base URL, timeout)
//! └── credentials.toml        # Persisted session slots (0600 on unix)
//! ```

use std::path::{Path, PathBuf};

use nexus_core::NexusError;

const APP_DIR: &str = "nexusflow";
const CONFIG_FILE: &str = "config.toml";
const CREDENTIALS_FILE: &str = "credentials.toml";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for NexusError {
    fn from(err: PathError) -> Self {
        NexusError::config(err.to_string())
    }
}

/// Resolves the client's files.
///
/// With a base path every file lives directly under it, which is how tests
/// and `--config-dir` overrides point the client at a scratch directory.
#[derive(Debug, Clone)]
pub struct NexusPaths {
    base: Option<PathBuf>,
}

impl NexusPaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the NexusFlow configuration directory.
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join(CONFIG_FILE))
    }

    /// Returns the credentials file path.
    ///
    /// # Security Note
    ///
    /// The file holds bearer tokens; the credential store writes it with
    /// 0600 permissions on unix.
    pub fn credentials_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join(CREDENTIALS_FILE))
    }
}

impl Default for NexusPaths {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_override() {
        let paths = NexusPaths::new(Some(Path::new("/tmp/nexus-test")));
        assert_eq!(paths.config_dir().unwrap(), PathBuf::from("/tmp/nexus-test"));
        assert_eq!(
            paths.credentials_file().unwrap(),
            PathBuf::from("/tmp/nexus-test/credentials.toml")
        );
    }

    #[test]
    fn test_default_dir_ends_with_app_name() {
        if let Ok(dir) = NexusPaths::default().config_dir() {
            assert!(dir.ends_with(APP_DIR));
            let config_file = NexusPaths::default().config_file().unwrap();
            assert!(config_file.starts_with(&dir));
        }
    }
}
