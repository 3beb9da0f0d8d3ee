//! Durable credential storage trait.

use async_trait::async_trait;
use std::fmt;

use crate::error::Result;

/// Named slots of the durable client storage.
///
/// Only the auth session writes these; the bootstrap sequence reads them once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CredentialSlot {
    AccessToken,
    RefreshToken,
    /// Serialized `UserProfile` as JSON.
    User,
}

impl CredentialSlot {
    pub const ALL: [CredentialSlot; 3] = [
        CredentialSlot::AccessToken,
        CredentialSlot::RefreshToken,
        CredentialSlot::User,
    ];

    /// Fixed storage key of the slot.
    pub fn key(self) -> &'static str {
        match self {
            CredentialSlot::AccessToken => "access_token",
            CredentialSlot::RefreshToken => "refresh_token",
            CredentialSlot::User => "user",
        }
    }
}

impl fmt::Display for CredentialSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Durable key/value storage for session credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn read(&self, slot: CredentialSlot) -> Result<Option<String>>;

    async fn write(&self, slot: CredentialSlot, value: &str) -> Result<()>;

    async fn remove(&self, slot: CredentialSlot) -> Result<()>;

    /// Writes several slots. Implementations backed by a single file should
    /// override this to make the write all-or-nothing.
    async fn write_all(&self, entries: &[(CredentialSlot, String)]) -> Result<()> {
        for (slot, value) in entries {
            self.write(*slot, value).await?;
        }
        Ok(())
    }

    /// Removes every slot.
    async fn clear_all(&self) -> Result<()> {
        for slot in CredentialSlot::ALL {
            self.remove(slot).await?;
        }
        Ok(())
    }
}
