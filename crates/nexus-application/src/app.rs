//! Application wiring: config, credential storage, HTTP client, session and
//! domain cache built once and shared.

use std::sync::Arc;

use nexus_core::Result;
use nexus_core::auth::{CredentialStore, SessionSnapshot, TokenCell};
use nexus_core::config::ClientConfig;
use nexus_infrastructure::{ConfigService, FileCredentialStore, NexusPaths};
use nexus_interaction::HttpApiClient;

use crate::auth_session::AuthSession;
use crate::domain_cache::{DomainApis, DomainCache};

/// Root object handed to the UI layer.
///
/// The session and the HTTP client share one [`TokenCell`], so a token set at
/// login or rotated after a 401 is seen by both.
pub struct NexusApp {
    config: ClientConfig,
    client: Arc<HttpApiClient>,
    session: Arc<AuthSession>,
    cache: Arc<DomainCache>,
}

impl NexusApp {
    /// Builds the app from the on-disk config and credential file.
    pub fn bootstrap(paths: &NexusPaths) -> Result<Self> {
        let config = ConfigService::new(paths)?.load()?;
        let store = FileCredentialStore::from_paths(paths)?;
        tracing::info!("[Bootstrap] API base URL: {}", config.normalized_base_url());
        Self::with_parts(config, Arc::new(store))
    }

    pub fn with_parts(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let tokens = TokenCell::new();
        let client = Arc::new(HttpApiClient::new(&config, tokens.clone())?);
        let session = Arc::new(AuthSession::new(client.clone(), store, tokens));
        let cache = Arc::new(DomainCache::new(DomainApis::from_client(client.clone())));

        Ok(Self {
            config,
            client,
            session,
            cache,
        })
    }

    /// Restores the persisted session and starts with an empty cache.
    pub async fn init(&self) -> Result<SessionSnapshot> {
        tracing::debug!("[Bootstrap] Restoring session");
        let snapshot = self.session.init().await?;
        self.cache.init().await;
        tracing::info!(
            "[Bootstrap] Ready (authenticated: {})",
            snapshot.is_authenticated
        );
        Ok(snapshot)
    }

    /// Persists rotated tokens, then drops in-memory state.
    pub async fn dispose(&self) {
        if let Err(e) = self.session.persist_tokens().await {
            tracing::warn!("[Bootstrap] Failed to persist tokens on shutdown: {}", e);
        }
        self.cache.dispose().await;
        self.session.dispose().await;
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<HttpApiClient> {
        &self.client
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub fn cache(&self) -> &Arc<DomainCache> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::auth::CredentialSlot;
    use nexus_infrastructure::InMemoryCredentialStore;

    #[tokio::test]
    async fn test_init_without_credentials_is_anonymous() {
        let app = NexusApp::with_parts(
            ClientConfig::default(),
            Arc::new(InMemoryCredentialStore::new()),
        )
        .unwrap();

        let snapshot = app.init().await.unwrap();
        assert!(!snapshot.is_authenticated);
        assert!(app.client().tokens().access().is_none());
    }

    #[tokio::test]
    async fn test_restored_session_shares_tokens_with_client() {
        let store = Arc::new(InMemoryCredentialStore::new());
        store
            .write(CredentialSlot::AccessToken, "access-1")
            .await
            .unwrap();
        store
            .write(
                CredentialSlot::User,
                r#"{"id":"u1","first_name":"Ada","last_name":"L","email":"ada@example.com","role":"admin"}"#,
            )
            .await
            .unwrap();

        let app = NexusApp::with_parts(ClientConfig::default(), store.clone()).unwrap();
        let snapshot = app.init().await.unwrap();

        assert!(snapshot.is_authenticated);
        assert_eq!(app.client().tokens().access().as_deref(), Some("access-1"));

        app.dispose().await;
        assert!(app.client().tokens().access().is_none());
        assert_eq!(
            store.read(CredentialSlot::AccessToken).await.unwrap().as_deref(),
            Some("access-1")
        );
    }
}
