//! In-memory credential store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use nexus_core::Result;
use nexus_core::auth::{CredentialSlot, CredentialStore};

/// Credential store that lives only as long as the process.
///
/// Used by tests and by callers that opt out of persistence.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    slots: Arc<Mutex<HashMap<CredentialSlot, String>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of populated slots.
    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.lock().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn read(&self, slot: CredentialSlot) -> Result<Option<String>> {
        Ok(self.slots.lock().await.get(&slot).cloned())
    }

    async fn write(&self, slot: CredentialSlot, value: &str) -> Result<()> {
        self.slots.lock().await.insert(slot, value.to_string());
        Ok(())
    }

    async fn remove(&self, slot: CredentialSlot) -> Result<()> {
        self.slots.lock().await.remove(&slot);
        Ok(())
    }

    async fn write_all(&self, entries: &[(CredentialSlot, String)]) -> Result<()> {
        let mut slots = self.slots.lock().await;
        for (slot, value) in entries {
            slots.insert(*slot, value.clone());
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        self.slots.lock().await.clear();
        Ok(())
    }
}
