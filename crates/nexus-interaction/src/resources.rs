//! Collection endpoints.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};

use nexus_core::analytics::{DashboardData, PipelineStage};
use nexus_core::api::{
    AnalyticsApi, ContactsApi, ListParams, OpportunitiesApi, ResourceApi, TasksApi,
};
use nexus_core::calendar::CalendarEvent;
use nexus_core::contact::Contact;
use nexus_core::envelope::normalize_list;
use nexus_core::opportunity::{Opportunity, Stage};
use nexus_core::task::Task;
use nexus_core::{Entity, EntityId, Result};

use crate::endpoints;
use crate::http_client::HttpApiClient;

/// Entity served by a standard REST collection endpoint.
pub trait RemoteResource: Entity {
    /// Collection path, with leading and trailing slash.
    const COLLECTION_PATH: &'static str;
}

impl RemoteResource for Contact {
    const COLLECTION_PATH: &'static str = endpoints::CONTACTS;
}

impl RemoteResource for Opportunity {
    const COLLECTION_PATH: &'static str = endpoints::OPPORTUNITIES;
}

impl RemoteResource for Task {
    const COLLECTION_PATH: &'static str = endpoints::TASKS;
}

impl RemoteResource for CalendarEvent {
    const COLLECTION_PATH: &'static str = endpoints::CALENDAR_EVENTS;
}

#[async_trait]
impl<E: RemoteResource> ResourceApi<E> for HttpApiClient {
    async fn list(&self, params: &ListParams) -> Result<Vec<E>> {
        let payload = self
            .request(Method::GET, E::COLLECTION_PATH, Some(params), None)
            .await?;
        normalize_list(payload)
    }

    async fn get(&self, id: &EntityId) -> Result<E> {
        self.get_json(&endpoints::item(E::COLLECTION_PATH, id), None)
            .await
    }

    async fn create(&self, data: &Value) -> Result<E> {
        self.send_json(Method::POST, E::COLLECTION_PATH, data).await
    }

    async fn update(&self, id: &EntityId, data: &Value) -> Result<E> {
        self.send_json(Method::PUT, &endpoints::item(E::COLLECTION_PATH, id), data)
            .await
    }

    async fn delete(&self, id: &EntityId) -> Result<()> {
        self.request(
            Method::DELETE,
            &endpoints::item(E::COLLECTION_PATH, id),
            None,
            None,
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ContactsApi for HttpApiClient {
    async fn update_last_contacted(&self, id: &EntityId) -> Result<()> {
        let path = endpoints::action(endpoints::CONTACTS, id, "update_last_contacted");
        self.request(Method::POST, &path, None, Some(&json!({}))).await?;
        Ok(())
    }
}

#[async_trait]
impl OpportunitiesApi for HttpApiClient {
    async fn update_stage(&self, id: &EntityId, stage: Stage) -> Result<()> {
        let path = endpoints::action(endpoints::OPPORTUNITIES, id, "update_stage");
        self.request(Method::POST, &path, None, Some(&json!({ "stage": stage })))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TasksApi for HttpApiClient {
    async fn complete(&self, id: &EntityId) -> Result<()> {
        let path = endpoints::action(endpoints::TASKS, id, "complete");
        self.request(Method::PATCH, &path, None, None).await?;
        Ok(())
    }

    async fn start(&self, id: &EntityId) -> Result<()> {
        let path = endpoints::action(endpoints::TASKS, id, "start");
        self.request(Method::PATCH, &path, None, None).await?;
        Ok(())
    }
}

#[async_trait]
impl AnalyticsApi for HttpApiClient {
    async fn dashboard(&self) -> Result<DashboardData> {
        self.get_json(endpoints::ANALYTICS_DASHBOARD, None).await
    }

    async fn pipeline(&self) -> Result<Vec<PipelineStage>> {
        let payload = self
            .request(Method::GET, endpoints::ANALYTICS_PIPELINE, None, None)
            .await?;
        normalize_list(payload)
    }
}
