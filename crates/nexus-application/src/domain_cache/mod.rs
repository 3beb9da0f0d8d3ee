//! Domain-data cache: contacts, opportunities, tasks, calendar events and
//! analytics aggregates.

mod entity_store;

pub use entity_store::{EntityStore, StoreLabels};

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use nexus_core::analytics::{AnalyticsState, DashboardData, PipelineStage};
use nexus_core::api::{
    AnalyticsApi, CalendarApi, ContactsApi, ListParams, OpportunitiesApi, TasksApi,
};
use nexus_core::calendar::CalendarEvent;
use nexus_core::contact::Contact;
use nexus_core::opportunity::{Opportunity, Stage};
use nexus_core::task::{Task, TaskStatus};
use nexus_core::views::{self, DateRange, PipelineMetrics, StageSummary, TaskStats};
use nexus_core::{DomainState, EntityId, ErrorPayload, Result};
use nexus_interaction::HttpApiClient;

const CONTACT_LABELS: StoreLabels = StoreLabels {
    fetch_all: "Failed to fetch contacts",
    fetch_one: "Failed to fetch contact",
    create: "Failed to create contact",
    update: "Failed to update contact",
    delete: "Failed to delete contact",
};

const OPPORTUNITY_LABELS: StoreLabels = StoreLabels {
    fetch_all: "Failed to fetch opportunities",
    fetch_one: "Failed to fetch opportunity",
    create: "Failed to create opportunity",
    update: "Failed to update opportunity",
    delete: "Failed to delete opportunity",
};

const TASK_LABELS: StoreLabels = StoreLabels {
    fetch_all: "Failed to fetch tasks",
    fetch_one: "Failed to fetch task",
    create: "Failed to create task",
    update: "Failed to update task",
    delete: "Failed to delete task",
};

const CALENDAR_LABELS: StoreLabels = StoreLabels {
    fetch_all: "Failed to fetch calendar events",
    fetch_one: "Failed to fetch calendar event",
    create: "Failed to create calendar event",
    update: "Failed to update calendar event",
    delete: "Failed to delete calendar event",
};

const UPDATE_LAST_CONTACTED_FAILED: &str = "Failed to update last contacted";
const UPDATE_STAGE_FAILED: &str = "Failed to update opportunity stage";
const COMPLETE_TASK_FAILED: &str = "Failed to complete task";
const START_TASK_FAILED: &str = "Failed to start task";
const DASHBOARD_FAILED: &str = "Failed to fetch dashboard data";
const PIPELINE_FAILED: &str = "Failed to fetch pipeline data";

/// Remote endpoints used by the cache, one handle per domain.
#[derive(Clone)]
pub struct DomainApis {
    pub contacts: Arc<dyn ContactsApi>,
    pub opportunities: Arc<dyn OpportunitiesApi>,
    pub tasks: Arc<dyn TasksApi>,
    pub calendar: Arc<dyn CalendarApi>,
    pub analytics: Arc<dyn AnalyticsApi>,
}

impl DomainApis {
    /// Every domain served by the same HTTP client.
    pub fn from_client(client: Arc<HttpApiClient>) -> Self {
        Self {
            contacts: client.clone(),
            opportunities: client.clone(),
            tasks: client.clone(),
            calendar: client.clone(),
            analytics: client,
        }
    }
}

/// Cached domain data shared by every screen.
///
/// Each domain records its own loading and error flags; a failure in one
/// never touches another.
pub struct DomainCache {
    apis: DomainApis,
    contacts: EntityStore<Contact>,
    opportunities: EntityStore<Opportunity>,
    tasks: EntityStore<Task>,
    calendar_events: EntityStore<CalendarEvent>,
    analytics: RwLock<AnalyticsState>,
}

impl DomainCache {
    pub fn new(apis: DomainApis) -> Self {
        Self {
            apis,
            contacts: EntityStore::new(CONTACT_LABELS),
            opportunities: EntityStore::new(OPPORTUNITY_LABELS),
            tasks: EntityStore::new(TASK_LABELS),
            calendar_events: EntityStore::new(CALENDAR_LABELS),
            analytics: RwLock::new(AnalyticsState::default()),
        }
    }

    pub async fn init(&self) {
        self.reset_all_data().await;
        tracing::debug!("[DomainCache] Initialized");
    }

    pub async fn dispose(&self) {
        self.reset_all_data().await;
        tracing::debug!("[DomainCache] Disposed");
    }

    pub fn contacts(&self) -> &EntityStore<Contact> {
        &self.contacts
    }

    pub fn opportunities(&self) -> &EntityStore<Opportunity> {
        &self.opportunities
    }

    pub fn tasks(&self) -> &EntityStore<Task> {
        &self.tasks
    }

    pub fn calendar_events(&self) -> &EntityStore<CalendarEvent> {
        &self.calendar_events
    }

    // ============================================================================
    // Contacts
    // ============================================================================

    pub async fn fetch_contacts(&self, params: &ListParams) -> Result<Vec<Contact>> {
        self.contacts.fetch_all(self.apis.contacts.as_ref(), params).await
    }

    pub async fn fetch_contacts_cancellable(
        &self,
        params: &ListParams,
        cancel: &CancellationToken,
    ) -> Result<Vec<Contact>> {
        self.contacts
            .fetch_all_cancellable(self.apis.contacts.as_ref(), params, cancel)
            .await
    }

    pub async fn fetch_contact(&self, id: &EntityId) -> Result<Contact> {
        self.contacts.fetch_one(self.apis.contacts.as_ref(), id).await
    }

    pub async fn create_contact(&self, data: &Value) -> Result<Contact> {
        self.contacts.create(self.apis.contacts.as_ref(), data).await
    }

    pub async fn update_contact(&self, id: &EntityId, data: &Value) -> Result<Contact> {
        self.contacts.update(self.apis.contacts.as_ref(), id, data).await
    }

    pub async fn delete_contact(&self, id: &EntityId) -> Result<()> {
        self.contacts.delete(self.apis.contacts.as_ref(), id).await
    }

    /// Stamps `last_contacted` with the local clock once the server confirms.
    pub async fn update_last_contacted(&self, id: &EntityId) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.contacts
            .transition(
                id,
                self.apis.contacts.update_last_contacted(id),
                UPDATE_LAST_CONTACTED_FAILED,
                |contact| contact.last_contacted = Some(now.clone()),
            )
            .await
    }

    pub async fn clear_current_contact(&self) {
        self.contacts.clear_current().await;
    }

    pub async fn clear_contacts_error(&self) {
        self.contacts.clear_error().await;
    }

    // ============================================================================
    // Opportunities
    // ============================================================================

    pub async fn fetch_opportunities(&self, params: &ListParams) -> Result<Vec<Opportunity>> {
        self.opportunities
            .fetch_all(self.apis.opportunities.as_ref(), params)
            .await
    }

    pub async fn fetch_opportunities_cancellable(
        &self,
        params: &ListParams,
        cancel: &CancellationToken,
    ) -> Result<Vec<Opportunity>> {
        self.opportunities
            .fetch_all_cancellable(self.apis.opportunities.as_ref(), params, cancel)
            .await
    }

    pub async fn fetch_opportunity(&self, id: &EntityId) -> Result<Opportunity> {
        self.opportunities
            .fetch_one(self.apis.opportunities.as_ref(), id)
            .await
    }

    pub async fn create_opportunity(&self, data: &Value) -> Result<Opportunity> {
        self.opportunities
            .create(self.apis.opportunities.as_ref(), data)
            .await
    }

    pub async fn update_opportunity(&self, id: &EntityId, data: &Value) -> Result<Opportunity> {
        self.opportunities
            .update(self.apis.opportunities.as_ref(), id, data)
            .await
    }

    pub async fn delete_opportunity(&self, id: &EntityId) -> Result<()> {
        self.opportunities
            .delete(self.apis.opportunities.as_ref(), id)
            .await
    }

    /// Moves an opportunity to `stage` after the server confirms.
    pub async fn update_opportunity_stage(&self, id: &EntityId, stage: Stage) -> Result<()> {
        self.opportunities
            .transition(
                id,
                self.apis.opportunities.update_stage(id, stage),
                UPDATE_STAGE_FAILED,
                |opportunity| opportunity.stage = stage,
            )
            .await
    }

    pub async fn clear_current_opportunity(&self) {
        self.opportunities.clear_current().await;
    }

    pub async fn clear_opportunities_error(&self) {
        self.opportunities.clear_error().await;
    }

    // ============================================================================
    // Tasks
    // ============================================================================

    pub async fn fetch_tasks(&self, params: &ListParams) -> Result<Vec<Task>> {
        self.tasks.fetch_all(self.apis.tasks.as_ref(), params).await
    }

    pub async fn fetch_tasks_cancellable(
        &self,
        params: &ListParams,
        cancel: &CancellationToken,
    ) -> Result<Vec<Task>> {
        self.tasks
            .fetch_all_cancellable(self.apis.tasks.as_ref(), params, cancel)
            .await
    }

    pub async fn fetch_task(&self, id: &EntityId) -> Result<Task> {
        self.tasks.fetch_one(self.apis.tasks.as_ref(), id).await
    }

    pub async fn create_task(&self, data: &Value) -> Result<Task> {
        self.tasks.create(self.apis.tasks.as_ref(), data).await
    }

    pub async fn update_task(&self, id: &EntityId, data: &Value) -> Result<Task> {
        self.tasks.update(self.apis.tasks.as_ref(), id, data).await
    }

    pub async fn delete_task(&self, id: &EntityId) -> Result<()> {
        self.tasks.delete(self.apis.tasks.as_ref(), id).await
    }

    pub async fn complete_task(&self, id: &EntityId) -> Result<()> {
        self.tasks
            .transition(
                id,
                self.apis.tasks.complete(id),
                COMPLETE_TASK_FAILED,
                |task| task.status = TaskStatus::Completed,
            )
            .await
    }

    pub async fn start_task(&self, id: &EntityId) -> Result<()> {
        self.tasks
            .transition(
                id,
                self.apis.tasks.start(id),
                START_TASK_FAILED,
                |task| task.status = TaskStatus::InProgress,
            )
            .await
    }

    pub async fn clear_current_task(&self) {
        self.tasks.clear_current().await;
    }

    pub async fn clear_tasks_error(&self) {
        self.tasks.clear_error().await;
    }

    // ============================================================================
    // Calendar events
    // ============================================================================

    pub async fn fetch_calendar_events(&self, params: &ListParams) -> Result<Vec<CalendarEvent>> {
        self.calendar_events
            .fetch_all(self.apis.calendar.as_ref(), params)
            .await
    }

    pub async fn fetch_calendar_events_cancellable(
        &self,
        params: &ListParams,
        cancel: &CancellationToken,
    ) -> Result<Vec<CalendarEvent>> {
        self.calendar_events
            .fetch_all_cancellable(self.apis.calendar.as_ref(), params, cancel)
            .await
    }

    pub async fn fetch_calendar_event(&self, id: &EntityId) -> Result<CalendarEvent> {
        self.calendar_events
            .fetch_one(self.apis.calendar.as_ref(), id)
            .await
    }

    pub async fn create_calendar_event(&self, data: &Value) -> Result<CalendarEvent> {
        self.calendar_events
            .create(self.apis.calendar.as_ref(), data)
            .await
    }

    pub async fn update_calendar_event(
        &self,
        id: &EntityId,
        data: &Value,
    ) -> Result<CalendarEvent> {
        self.calendar_events
            .update(self.apis.calendar.as_ref(), id, data)
            .await
    }

    pub async fn delete_calendar_event(&self, id: &EntityId) -> Result<()> {
        self.calendar_events
            .delete(self.apis.calendar.as_ref(), id)
            .await
    }

    /// Focuses a cached event; `None` (and an empty focus slot) when the id
    /// is not cached.
    pub async fn select_calendar_event(&self, id: &EntityId) -> Option<CalendarEvent> {
        self.calendar_events.select(id).await
    }

    pub async fn clear_current_calendar_event(&self) {
        self.calendar_events.clear_current().await;
    }

    pub async fn clear_calendar_events_error(&self) {
        self.calendar_events.clear_error().await;
    }

    // ============================================================================
    // Analytics
    // ============================================================================

    pub async fn fetch_dashboard_data(&self) -> Result<DashboardData> {
        self.analytics.write().await.begin_request();
        let result = self.apis.analytics.dashboard().await;

        let mut analytics = self.analytics.write().await;
        match result {
            Ok(data) => {
                analytics.dashboard = Some(data.clone());
                analytics.end_request();
                Ok(data)
            }
            Err(e) => {
                analytics.fail_request(ErrorPayload::from_error(&e, DASHBOARD_FAILED));
                Err(e)
            }
        }
    }

    /// Replaces the pipeline breakdown. A failed fetch keeps the previous
    /// breakdown.
    pub async fn fetch_pipeline_data(&self) -> Result<Vec<PipelineStage>> {
        self.analytics.write().await.begin_request();
        let result = self.apis.analytics.pipeline().await;

        let mut analytics = self.analytics.write().await;
        match result {
            Ok(stages) => {
                analytics.pipeline = stages.clone();
                analytics.end_request();
                Ok(stages)
            }
            Err(e) => {
                analytics.fail_request(ErrorPayload::from_error(&e, PIPELINE_FAILED));
                Err(e)
            }
        }
    }

    pub async fn analytics(&self) -> AnalyticsState {
        self.analytics.read().await.clone()
    }

    pub async fn clear_analytics_error(&self) {
        self.analytics.write().await.clear_error();
    }

    // ============================================================================
    // Bulk actions
    // ============================================================================

    pub async fn clear_all_errors(&self) {
        self.contacts.clear_error().await;
        self.opportunities.clear_error().await;
        self.tasks.clear_error().await;
        self.calendar_events.clear_error().await;
        self.analytics.write().await.clear_error();
    }

    /// Drops every collection, focus slot and aggregate.
    pub async fn reset_all_data(&self) {
        self.contacts.reset().await;
        self.opportunities.reset().await;
        self.tasks.reset().await;
        self.calendar_events.reset().await;
        self.analytics.write().await.reset();
    }

    // ============================================================================
    // Derived views
    // ============================================================================

    pub async fn contacts_snapshot(&self) -> DomainState<Contact> {
        self.contacts.snapshot().await
    }

    pub async fn search_contacts(&self, term: &str) -> Vec<Contact> {
        let items = self.contacts.items().await;
        views::search_contacts(&items, term)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn opportunities_in_stage(&self, stage: Stage) -> Vec<Opportunity> {
        let items = self.opportunities.items().await;
        views::filter_by_stage(&items, stage)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn pipeline_metrics(&self) -> PipelineMetrics {
        PipelineMetrics::compute(&self.opportunities.items().await)
    }

    pub async fn stage_breakdown(&self) -> Vec<StageSummary> {
        views::stage_breakdown(&self.opportunities.items().await)
    }

    pub async fn conversion_rate(&self) -> f64 {
        views::conversion_rate(&self.opportunities.items().await)
    }

    pub async fn tasks_with_status(&self, status: TaskStatus) -> Vec<Task> {
        let items = self.tasks.items().await;
        items.into_iter().filter(|task| task.status == status).collect()
    }

    pub async fn task_stats(&self, now: DateTime<Utc>) -> TaskStats {
        TaskStats::compute(&self.tasks.items().await, now)
    }

    pub async fn events_between(&self, range: &DateRange) -> Vec<CalendarEvent> {
        let items = self.calendar_events.items().await;
        views::events_between(&items, range)
            .into_iter()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "domain_cache_test.rs"]
mod tests;
