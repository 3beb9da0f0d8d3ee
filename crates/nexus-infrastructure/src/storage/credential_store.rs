//! File-backed credential store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use nexus_core::auth::{CredentialSlot, CredentialStore};
use nexus_core::{NexusError, Result};

use super::atomic_toml::{AtomicTomlError, AtomicTomlFile};
use crate::paths::NexusPaths;

/// On-disk layout of `credentials.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

impl CredentialsFile {
    fn slot(&self, slot: CredentialSlot) -> &Option<String> {
        match slot {
            CredentialSlot::AccessToken => &self.access_token,
            CredentialSlot::RefreshToken => &self.refresh_token,
            CredentialSlot::User => &self.user,
        }
    }

    fn slot_mut(&mut self, slot: CredentialSlot) -> &mut Option<String> {
        match slot {
            CredentialSlot::AccessToken => &mut self.access_token,
            CredentialSlot::RefreshToken => &mut self.refresh_token,
            CredentialSlot::User => &mut self.user,
        }
    }

    fn is_empty(&self) -> bool {
        CredentialSlot::ALL.iter().all(|slot| self.slot(*slot).is_none())
    }
}

/// Credential slots persisted in one private TOML file.
///
/// All slots share the file, so `write_all` and `clear_all` are a single
/// atomic replace. Blocking file I/O runs on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    file: Arc<AtomicTomlFile<CredentialsFile>>,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicTomlFile::private(path)),
        }
    }

    /// Store at the default location (`~/.config/nexusflow/credentials.toml`
    /// unless `paths` carries a base override).
    pub fn from_paths(paths: &NexusPaths) -> Result<Self> {
        Ok(Self::new(paths.credentials_file()?))
    }

    pub fn path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    async fn with_file<R, F>(&self, op: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&AtomicTomlFile<CredentialsFile>) -> std::result::Result<R, AtomicTomlError>
            + Send
            + 'static,
    {
        let file = Arc::clone(&self.file);
        tokio::task::spawn_blocking(move || op(&file))
            .await
            .map_err(|e| NexusError::internal(format!("credential store task failed: {}", e)))?
            .map_err(NexusError::from)
    }

    /// Applies `f` and drops the file once every slot is empty.
    async fn mutate<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut CredentialsFile) + Send + 'static,
    {
        self.with_file(move |file| {
            file.update_or_remove(
                CredentialsFile::default(),
                |data| {
                    f(data);
                    Ok(())
                },
                CredentialsFile::is_empty,
            )
            .map(|_| ())
        })
        .await
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn read(&self, slot: CredentialSlot) -> Result<Option<String>> {
        let data = self.with_file(|file| file.load()).await?;
        Ok(data.and_then(|data| data.slot(slot).clone()))
    }

    async fn write(&self, slot: CredentialSlot, value: &str) -> Result<()> {
        let value = value.to_string();
        self.mutate(move |data| *data.slot_mut(slot) = Some(value)).await
    }

    async fn remove(&self, slot: CredentialSlot) -> Result<()> {
        self.mutate(move |data| *data.slot_mut(slot) = None).await
    }

    async fn write_all(&self, entries: &[(CredentialSlot, String)]) -> Result<()> {
        let entries = entries.to_vec();
        self.mutate(move |data| {
            for (slot, value) in entries {
                *data.slot_mut(slot) = Some(value);
            }
        })
        .await
    }

    async fn clear_all(&self) -> Result<()> {
        self.with_file(|file| file.remove()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> FileCredentialStore {
        FileCredentialStore::new(dir.path().join("credentials.toml"))
    }

    #[tokio::test]
    async fn test_write_all_then_read() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store
            .write_all(&[
                (CredentialSlot::AccessToken, "a1".to_string()),
                (CredentialSlot::RefreshToken, "r1".to_string()),
                (CredentialSlot::User, r#"{"id":"u1"}"#.to_string()),
            ])
            .await
            .unwrap();

        assert_eq!(store.read(CredentialSlot::AccessToken).await.unwrap().as_deref(), Some("a1"));
        assert_eq!(store.read(CredentialSlot::User).await.unwrap().as_deref(), Some(r#"{"id":"u1"}"#));
    }

    #[tokio::test]
    async fn test_removing_last_slot_deletes_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store.write(CredentialSlot::AccessToken, "a1").await.unwrap();
        assert!(store.path().exists());

        store.remove(CredentialSlot::AccessToken).await.unwrap();
        assert!(!store.path().exists());
        assert!(store.read(CredentialSlot::AccessToken).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_all_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store.clear_all().await.unwrap();
        store.write(CredentialSlot::RefreshToken, "r1").await.unwrap();
        store.clear_all().await.unwrap();
        store.clear_all().await.unwrap();

        for slot in CredentialSlot::ALL {
            assert!(store.read(slot).await.unwrap().is_none());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_write_survives_concurrent_removal_of_last_slot() {
        for _ in 0..20 {
            let dir = TempDir::new().unwrap();
            let store = store(&dir);
            store.write(CredentialSlot::AccessToken, "a1").await.unwrap();

            let remover = {
                let store = store.clone();
                tokio::spawn(async move { store.remove(CredentialSlot::AccessToken).await })
            };
            let writer = {
                let store = store.clone();
                tokio::spawn(async move { store.write(CredentialSlot::RefreshToken, "r1").await })
            };
            remover.await.unwrap().unwrap();
            writer.await.unwrap().unwrap();

            assert_eq!(
                store.read(CredentialSlot::RefreshToken).await.unwrap().as_deref(),
                Some("r1")
            );
            assert!(store.read(CredentialSlot::AccessToken).await.unwrap().is_none());
        }
    }
}
