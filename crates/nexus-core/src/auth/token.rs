//! Bearer token cell shared between the auth session and the API client.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Access/refresh token pair held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenPair {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

/// Cheaply clonable handle to the in-memory token pair.
///
/// The auth session sets and clears it; the HTTP client reads the access
/// token for every request and swaps it after a successful refresh.
#[derive(Debug, Clone, Default)]
pub struct TokenCell {
    inner: Arc<RwLock<TokenPair>>,
}

impl TokenCell {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, TokenPair> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, TokenPair> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self) -> TokenPair {
        self.read_guard().clone()
    }

    pub fn access(&self) -> Option<String> {
        self.read_guard().access.clone()
    }

    pub fn refresh(&self) -> Option<String> {
        self.read_guard().refresh.clone()
    }

    pub fn set(&self, access: Option<String>, refresh: Option<String>) {
        *self.write_guard() = TokenPair { access, refresh };
    }

    /// Swaps the access token, and the refresh token when one is given.
    pub fn rotate(&self, access: String, refresh: Option<String>) {
        let mut pair = self.write_guard();
        pair.access = Some(access);
        if refresh.is_some() {
            pair.refresh = refresh;
        }
    }

    pub fn clear(&self) {
        *self.write_guard() = TokenPair::default();
    }
}
