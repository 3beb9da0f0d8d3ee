//! Configuration service.
//!
//! Loads `ClientConfig` from `config.toml` and applies environment
//! overrides on top. A missing file yields the defaults.

use std::path::PathBuf;

use nexus_core::config::ClientConfig;
use nexus_core::{NexusError, Result};

use crate::paths::NexusPaths;
use crate::storage::AtomicTomlFile;

pub const ENV_BASE_URL: &str = "NEXUS_API_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "NEXUS_API_TIMEOUT_SECS";

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves the effective client configuration.
pub struct ConfigService {
    file: AtomicTomlFile<ClientConfig>,
    env: EnvLookup,
}

impl ConfigService {
    pub fn new(paths: &NexusPaths) -> Result<Self> {
        Ok(Self::with_path(paths.config_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
            env: Box::new(|key| std::env::var(key).ok()),
        }
    }

    /// Replaces the environment lookup (tests).
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(lookup);
        self
    }

    pub fn config_path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// File config (or defaults) with environment overrides applied, then
    /// validated.
    pub fn load(&self) -> Result<ClientConfig> {
        let mut config = match self.file.load()? {
            Some(config) => {
                tracing::debug!("[Config] Loaded {}", self.file.path().display());
                config
            }
            None => {
                tracing::debug!(
                    "[Config] {} not found, using defaults",
                    self.file.path().display()
                );
                ClientConfig::default()
            }
        };

        self.apply_env(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes `config` to the config file.
    pub fn save(&self, config: &ClientConfig) -> Result<()> {
        config.validate()?;
        self.file.save(config)?;
        tracing::info!("[Config] Saved {}", self.file.path().display());
        Ok(())
    }

    fn apply_env(&self, config: &mut ClientConfig) -> Result<()> {
        if let Some(base_url) = (self.env)(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            tracing::debug!("[Config] {} overrides base_url", ENV_BASE_URL);
            config.base_url = base_url.trim().to_string();
        }
        if let Some(raw) = (self.env)(ENV_TIMEOUT_SECS).filter(|v| !v.trim().is_empty()) {
            config.timeout_secs = raw.trim().parse().map_err(|_| {
                NexusError::config(format!("{} must be a whole number of seconds (got '{}')", ENV_TIMEOUT_SECS, raw))
            })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ConfigService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigService")
            .field("path", &self.file.path())
            .finish_non_exhaustive()
    }
}
