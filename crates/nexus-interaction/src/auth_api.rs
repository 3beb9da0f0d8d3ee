use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use nexus_core::Result;
use nexus_core::api::AuthApi;
use nexus_core::auth::{AuthResponse, LoginCredentials, PasswordChange, RegisterRequest, TokenRefresh};
use nexus_core::user::{ProfileUpdate, UserProfile};

use crate::endpoints;
use crate::http_client::HttpApiClient;

#[async_trait]
impl AuthApi for HttpApiClient {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse> {
        let body = serde_json::to_value(credentials)?;
        self.send_json(Method::POST, endpoints::AUTH_LOGIN, &body).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        let body = serde_json::to_value(request)?;
        self.send_json(Method::POST, endpoints::AUTH_REGISTER, &body).await
    }

    async fn refresh_token(&self, refresh: &str) -> Result<TokenRefresh> {
        self.exchange_refresh_token(refresh).await
    }

    async fn get_profile(&self) -> Result<UserProfile> {
        self.get_json(endpoints::AUTH_ME, None).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        let body = serde_json::to_value(update)?;
        self.send_json(Method::PUT, endpoints::AUTH_UPDATE_PROFILE, &body).await
    }

    async fn change_password(&self, payload: &PasswordChange) -> Result<()> {
        let body = serde_json::to_value(payload)?;
        let _: Value = self
            .send_json(Method::POST, endpoints::AUTH_CHANGE_PASSWORD, &body)
            .await?;
        Ok(())
    }
}
