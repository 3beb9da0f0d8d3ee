//! Authenticated identity and its persisted lifecycle.

use std::sync::Arc;
use tokio::sync::RwLock;

use nexus_core::api::AuthApi;
use nexus_core::auth::{
    AuthResponse, CredentialSlot, CredentialStore, LoginCredentials, PasswordChange,
    RegisterRequest, SessionSnapshot, SessionState, TokenCell,
};
use nexus_core::user::{ProfileUpdate, UserProfile};
use nexus_core::{NexusError, Result};

pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTRATION_FAILED: &str = "Registration failed";
pub const PROFILE_UPDATE_FAILED: &str = "Profile update failed";
pub const PASSWORD_CHANGE_FAILED: &str = "Password change failed";
pub const PROFILE_FETCH_FAILED: &str = "Failed to fetch profile";

/// Session service: user, tokens, loading and error flags.
///
/// Persisted slots are written before in-memory state changes, so a storage
/// failure leaves the session exactly as it was. The state lock is never held
/// across a remote call.
pub struct AuthSession {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn CredentialStore>,
    tokens: TokenCell,
    state: RwLock<SessionState>,
}

impl AuthSession {
    /// `tokens` must be the cell the API client reads its bearer token from.
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn CredentialStore>, tokens: TokenCell) -> Self {
        Self {
            api,
            store,
            tokens,
            state: RwLock::new(SessionState::default()),
        }
    }

    // ============================================================================
    // Lifecycle
    // ============================================================================

    /// Restores the persisted session.
    ///
    /// Access token and user record both present and parseable restore an
    /// authenticated session; anything less clears every slot.
    ///
    /// A credential file that cannot be parsed counts as no session and is
    /// cleared. I/O failures are returned.
    pub async fn init(&self) -> Result<SessionSnapshot> {
        let (access, refresh, raw_user) = match self.read_persisted().await {
            Ok(slots) => slots,
            Err(e @ NexusError::Serialization { .. }) => {
                tracing::warn!("[AuthSession] Discarding unreadable credential storage: {}", e);
                (None, None, None)
            }
            Err(e) => return Err(e),
        };
        let user = raw_user.and_then(|raw| match serde_json::from_str::<UserProfile>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("[AuthSession] Discarding unreadable user record: {}", e);
                None
            }
        });

        match (access, user) {
            (Some(access), Some(user)) => {
                tracing::info!("[AuthSession] Restored session for {}", user.email);
                let mut state = self.state.write().await;
                *state = SessionState {
                    user: Some(user),
                    ..SessionState::default()
                };
                self.tokens.set(Some(access), refresh);
            }
            (access, user) => {
                if access.is_some() || user.is_some() || refresh.is_some() {
                    tracing::info!("[AuthSession] Partial persisted session, clearing it");
                }
                self.clear_persisted().await;
                let mut state = self.state.write().await;
                *state = SessionState::default();
                self.tokens.clear();
            }
        }

        Ok(self.snapshot().await)
    }

    /// Drops in-memory state only; the persisted slots stay for the next
    /// `init`.
    pub async fn dispose(&self) {
        let mut state = self.state.write().await;
        *state = SessionState::default();
        self.tokens.clear();
        tracing::debug!("[AuthSession] Disposed");
    }

    // ============================================================================
    // Operations
    // ============================================================================

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<UserProfile> {
        credentials.validate()?;
        self.begin().await;

        let result = match self.api.login(credentials).await {
            Ok(response) => self.establish(response).await,
            Err(e) => Err(e),
        };
        if result.is_ok() {
            tracing::info!("[AuthSession] Logged in as {}", credentials.email);
        }
        self.settle(result, LOGIN_FAILED).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<UserProfile> {
        request.validate()?;
        self.begin().await;

        let result = match self.api.register(request).await {
            Ok(response) => self.establish(response).await,
            Err(e) => Err(e),
        };
        if result.is_ok() {
            tracing::info!("[AuthSession] Registered {}", request.email);
        }
        self.settle(result, REGISTRATION_FAILED).await
    }

    /// Clears in-memory state and every persisted slot.
    ///
    /// Never fails: storage errors are logged and the in-memory session is
    /// cleared regardless. Safe to call repeatedly.
    pub async fn logout(&self) {
        {
            let mut state = self.state.write().await;
            *state = SessionState::default();
            self.tokens.clear();
        }
        self.clear_persisted().await;
        tracing::info!("[AuthSession] Logged out");
    }

    /// Replaces the user with the server's updated profile. Tokens are
    /// untouched.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        self.require_authenticated().await?;
        self.begin().await;

        let result = match self.api.update_profile(update).await {
            Ok(user) => self.replace_user(user).await,
            Err(e) => Err(e),
        };
        self.settle(result, PROFILE_UPDATE_FAILED).await
    }

    /// Changes the password. User and tokens are untouched; callers are
    /// expected to log out afterwards.
    pub async fn change_password(&self, payload: &PasswordChange) -> Result<()> {
        payload.validate()?;
        self.require_authenticated().await?;
        self.begin().await;

        let result = self.api.change_password(payload).await;
        self.settle(result, PASSWORD_CHANGE_FAILED).await
    }

    /// Reloads the profile from the server.
    pub async fn fetch_profile(&self) -> Result<UserProfile> {
        self.require_authenticated().await?;
        self.begin().await;

        let result = match self.api.get_profile().await {
            Ok(user) => self.replace_user(user).await,
            Err(e) => Err(e),
        };
        self.settle(result, PROFILE_FETCH_FAILED).await
    }

    /// Exchanges the refresh token for a new access token and persists it.
    ///
    /// A rejected refresh token ends the session: the user is logged out and
    /// `SessionExpired` is returned.
    pub async fn refresh_access_token(&self) -> Result<String> {
        let refresh = self.tokens.refresh().ok_or(NexusError::NotAuthenticated)?;

        let rotated = match self.api.refresh_token(&refresh).await {
            Ok(rotated) => rotated,
            Err(e) => {
                tracing::warn!("[AuthSession] Refresh rejected, ending session: {}", e);
                self.logout().await;
                return Err(NexusError::SessionExpired);
            }
        };

        let mut entries = vec![(CredentialSlot::AccessToken, rotated.access.clone())];
        if let Some(refresh) = &rotated.refresh {
            entries.push((CredentialSlot::RefreshToken, refresh.clone()));
        }
        self.store.write_all(&entries).await?;

        let _state = self.state.write().await;
        self.tokens.rotate(rotated.access.clone(), rotated.refresh);
        tracing::debug!("[AuthSession] Access token refreshed");
        Ok(rotated.access)
    }

    /// Writes the in-memory tokens back to their slots.
    ///
    /// The HTTP client rotates the access token in memory when it recovers
    /// from a 401; this makes that rotation survive a restart.
    pub async fn persist_tokens(&self) -> Result<()> {
        let pair = {
            let state = self.state.read().await;
            if state.user.is_none() {
                return Ok(());
            }
            self.tokens.get()
        };

        let mut entries = Vec::new();
        if let Some(access) = pair.access {
            entries.push((CredentialSlot::AccessToken, access));
        }
        if let Some(refresh) = pair.refresh {
            entries.push((CredentialSlot::RefreshToken, refresh));
        }
        if entries.is_empty() {
            return Ok(());
        }
        self.store.write_all(&entries).await
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    // ============================================================================
    // Queries
    // ============================================================================

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        let pair = self.tokens.get();
        SessionSnapshot::new(&state, pair.access, pair.refresh)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.snapshot().await.is_authenticated
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.state.read().await.user.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    // ============================================================================
    // Internals
    // ============================================================================

    async fn require_authenticated(&self) -> Result<()> {
        if self.is_authenticated().await {
            Ok(())
        } else {
            Err(NexusError::NotAuthenticated)
        }
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.is_loading = true;
        state.error = None;
    }

    /// Ends an operation: clears the loading flag and records the error.
    async fn settle<T>(&self, result: Result<T>, fallback: &str) -> Result<T> {
        let mut state = self.state.write().await;
        state.is_loading = false;
        if let Err(e) = &result {
            tracing::warn!("[AuthSession] {}: {}", fallback, e);
            state.error = Some(e.user_message(fallback));
        }
        result
    }

    /// Persists the three slots, then publishes user and tokens together.
    async fn establish(&self, response: AuthResponse) -> Result<UserProfile> {
        let AuthResponse {
            user,
            access,
            refresh,
        } = response;
        let user_json = serde_json::to_string(&user)?;

        self.store
            .write_all(&[
                (CredentialSlot::AccessToken, access.clone()),
                (CredentialSlot::RefreshToken, refresh.clone()),
                (CredentialSlot::User, user_json),
            ])
            .await?;

        let mut state = self.state.write().await;
        state.user = Some(user.clone());
        self.tokens.set(Some(access), Some(refresh));
        Ok(user)
    }

    async fn replace_user(&self, user: UserProfile) -> Result<UserProfile> {
        let user_json = serde_json::to_string(&user)?;
        self.store.write(CredentialSlot::User, &user_json).await?;

        self.state.write().await.user = Some(user.clone());
        Ok(user)
    }

    async fn read_persisted(&self) -> Result<(Option<String>, Option<String>, Option<String>)> {
        let access = self.store.read(CredentialSlot::AccessToken).await?;
        let refresh = self.store.read(CredentialSlot::RefreshToken).await?;
        let user = self.store.read(CredentialSlot::User).await?;
        Ok((access, refresh, user))
    }

    async fn clear_persisted(&self) {
        if let Err(e) = self.store.clear_all().await {
            tracing::warn!("[AuthSession] Failed to clear persisted credentials: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "auth_session_test.rs"]
mod tests;
