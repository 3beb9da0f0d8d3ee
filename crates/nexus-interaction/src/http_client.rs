//! reqwest-based transport shared by every API trait implementation.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use tokio::sync::Mutex;

use nexus_core::api::ListParams;
use nexus_core::auth::{TokenCell, TokenRefresh};
use nexus_core::config::ClientConfig;
use nexus_core::{NexusError, Result};

use crate::endpoints;
use crate::error_mapping::{map_http_error, map_transport_error};

/// Typed REST client for the CRM backend.
///
/// The bearer token is read from the shared [`TokenCell`] on every request.
/// A 401 on an authenticated endpoint triggers one token refresh and one
/// retry; the refreshed token is written back to the cell only. Persisting it
/// is left to the auth session, which owns the credential slots.
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    tokens: TokenCell,
    refresh_lock: Mutex<()>,
}

impl HttpApiClient {
    pub fn new(config: &ClientConfig, tokens: TokenCell) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| NexusError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config.normalized_base_url(), tokens))
    }

    /// Uses a preconfigured `reqwest::Client`.
    pub fn with_client(client: Client, base_url: impl Into<String>, tokens: TokenCell) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            tokens,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Handle to the token cell this client reads from.
    pub fn tokens(&self) -> &TokenCell {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn build(
        &self,
        method: &Method,
        path: &str,
        params: Option<&ListParams>,
        body: Option<&Value>,
    ) -> RequestBuilder {
        let mut request = self.client.request(method.clone(), self.url(path));
        if let Some(params) = params.filter(|p| !p.is_empty()) {
            let query: Vec<(&str, &str)> = params.iter().collect();
            request = request.query(&query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if !endpoints::ANONYMOUS.contains(&path) {
            if let Some(token) = self.tokens.access() {
                request = request.bearer_auth(token);
            }
        }
        request
    }

    async fn send_once(
        &self,
        method: &Method,
        path: &str,
        params: Option<&ListParams>,
        body: Option<&Value>,
    ) -> Result<Response> {
        tracing::debug!("[Http] {} {}", method, path);
        self.build(method, path, params, body)
            .send()
            .await
            .map_err(map_transport_error)
    }

    /// Sends a request and returns the parsed JSON body (`Null` when empty).
    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        params: Option<&ListParams>,
        body: Option<&Value>,
    ) -> Result<Value> {
        let sent_with = self.tokens.access();
        let mut response = self.send_once(&method, path, params, body).await?;

        if response.status() == StatusCode::UNAUTHORIZED
            && !endpoints::ANONYMOUS.contains(&path)
            && self.tokens.refresh().is_some()
        {
            tracing::debug!("[Http] 401 on {}, refreshing access token", path);
            Box::pin(self.refresh_after_unauthorized(sent_with.as_deref())).await?;
            response = self.send_once(&method, path, params, body).await?;
        }

        read_json(response).await
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<&ListParams>,
    ) -> Result<T> {
        let value = self.request(Method::GET, path, params, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &Value,
    ) -> Result<T> {
        let value = self.request(method, path, None, Some(body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Exchanges the refresh token for a new access token.
    pub(crate) async fn exchange_refresh_token(&self, refresh: &str) -> Result<TokenRefresh> {
        let body = serde_json::json!({ "refresh": refresh });
        self.send_json(Method::POST, endpoints::AUTH_REFRESH, &body).await
    }

    /// Refreshes once for a batch of concurrent 401s.
    ///
    /// When another request already rotated the token while this one waited
    /// for the lock, the new token is reused instead of refreshing again. A
    /// failed refresh clears both tokens.
    async fn refresh_after_unauthorized(&self, sent_with: Option<&str>) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.tokens.access();
        if current.as_deref() != sent_with {
            // Rotated by another request, or dropped by its failed refresh.
            return match current {
                Some(_) => Ok(()),
                None => Err(NexusError::SessionExpired),
            };
        }

        let Some(refresh) = self.tokens.refresh() else {
            self.tokens.clear();
            return Err(NexusError::SessionExpired);
        };
        match self.exchange_refresh_token(&refresh).await {
            Ok(rotated) => {
                self.tokens.rotate(rotated.access, rotated.refresh);
                tracing::info!("[Http] Access token refreshed");
                Ok(())
            }
            Err(e) => {
                // Stale tokens must not be replayed by later requests.
                tracing::warn!("[Http] Token refresh failed, dropping tokens: {}", e);
                self.tokens.clear();
                Err(NexusError::SessionExpired)
            }
        }
    }
}

impl fmt::Debug for HttpApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

async fn read_json(response: Response) -> Result<Value> {
    let status = response.status();
    let text = response.text().await.map_err(map_transport_error)?;

    if !status.is_success() {
        return Err(map_http_error(status, &text));
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}
