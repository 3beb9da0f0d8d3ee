//! Remote API seams used by the stores.
//!
//! The HTTP implementation lives in `nexus-interaction`; tests plug in
//! hand-written mocks. Every method returns the normalized [`NexusError`]
//! so callers never see transport-specific error types.
//!
//! [`NexusError`]: crate::error::NexusError

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::analytics::{DashboardData, PipelineStage};
use crate::auth::{AuthResponse, LoginCredentials, PasswordChange, RegisterRequest, TokenRefresh};
use crate::calendar::CalendarEvent;
use crate::contact::Contact;
use crate::error::Result;
use crate::id::{Entity, EntityId};
use crate::opportunity::{Opportunity, Stage};
use crate::task::Task;
use crate::user::{ProfileUpdate, UserProfile};

/// Query parameters passed through to list endpoints (search, filters,
/// pagination). Kept ordered so requests are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams(BTreeMap<String, String>);

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.0.insert(key.into(), value.to_string());
        self
    }

    pub fn search(self, term: impl Into<String>) -> Self {
        self.with("search", term.into())
    }

    pub fn page(self, page: u32) -> Self {
        self.with("page", page)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Authentication endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse>;

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse>;

    /// Exchanges a refresh token for a new access token.
    async fn refresh_token(&self, refresh: &str) -> Result<TokenRefresh>;

    async fn get_profile(&self) -> Result<UserProfile>;

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile>;

    async fn change_password(&self, payload: &PasswordChange) -> Result<()>;
}

/// CRUD endpoints of one entity collection.
///
/// `create` and `update` take the raw form payload; the server answers with
/// the full entity, which is what the cache stores.
#[async_trait]
pub trait ResourceApi<E: Entity>: Send + Sync {
    /// Lists entities. Bare arrays and `{results: [...]}` envelopes are both
    /// unwrapped before returning.
    async fn list(&self, params: &ListParams) -> Result<Vec<E>>;

    async fn get(&self, id: &EntityId) -> Result<E>;

    async fn create(&self, data: &Value) -> Result<E>;

    async fn update(&self, id: &EntityId, data: &Value) -> Result<E>;

    async fn delete(&self, id: &EntityId) -> Result<()>;
}

#[async_trait]
pub trait ContactsApi: ResourceApi<Contact> {
    /// Stamps the contact's `last_contacted` with the server clock.
    async fn update_last_contacted(&self, id: &EntityId) -> Result<()>;
}

#[async_trait]
pub trait OpportunitiesApi: ResourceApi<Opportunity> {
    async fn update_stage(&self, id: &EntityId, stage: Stage) -> Result<()>;
}

#[async_trait]
pub trait TasksApi: ResourceApi<Task> {
    async fn complete(&self, id: &EntityId) -> Result<()>;

    async fn start(&self, id: &EntityId) -> Result<()>;
}

/// Calendar events only need the generic CRUD surface.
pub trait CalendarApi: ResourceApi<CalendarEvent> {}

impl<T: ResourceApi<CalendarEvent> + ?Sized> CalendarApi for T {}

/// Server-side aggregates.
#[async_trait]
pub trait AnalyticsApi: Send + Sync {
    async fn dashboard(&self) -> Result<DashboardData>;

    async fn pipeline(&self) -> Result<Vec<PipelineStage>>;
}
