//! Generic cached collection with its CRUD reconciliation rules.

use serde_json::Value;
use std::future::Future;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use nexus_core::api::{ListParams, ResourceApi};
use nexus_core::{DomainState, Entity, EntityId, ErrorPayload, NexusError, Result};

use crate::mutation_guard::MutationGuard;

/// Fallback messages recorded when a failure carries no server payload.
#[derive(Debug, Clone, Copy)]
pub struct StoreLabels {
    pub fetch_all: &'static str,
    pub fetch_one: &'static str,
    pub create: &'static str,
    pub update: &'static str,
    pub delete: &'static str,
}

/// Cached collection and focus slot of one entity type.
///
/// Every operation is: mark loading, call the server without holding the
/// lock, then reconcile under a single write. Failures leave items and the
/// focused entity as they were and record the error.
pub struct EntityStore<E: Entity> {
    state: RwLock<DomainState<E>>,
    guard: MutationGuard,
    labels: StoreLabels,
}

impl<E: Entity> EntityStore<E> {
    pub fn new(labels: StoreLabels) -> Self {
        Self {
            state: RwLock::new(DomainState::default()),
            guard: MutationGuard::new(E::KIND),
            labels,
        }
    }

    pub fn labels(&self) -> &StoreLabels {
        &self.labels
    }

    pub fn guard(&self) -> &MutationGuard {
        &self.guard
    }

    // ============================================================================
    // Reads
    // ============================================================================

    pub async fn snapshot(&self) -> DomainState<E> {
        self.state.read().await.clone()
    }

    pub async fn items(&self) -> Vec<E> {
        self.state.read().await.collection.items().to_vec()
    }

    pub async fn find(&self, id: &EntityId) -> Option<E> {
        self.state.read().await.collection.find(id).cloned()
    }

    pub async fn current(&self) -> Option<E> {
        self.state.read().await.current.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.collection.is_loading()
    }

    pub async fn error(&self) -> Option<ErrorPayload> {
        self.state.read().await.collection.error().cloned()
    }

    // ============================================================================
    // Remote operations
    // ============================================================================

    /// Replaces the collection with a fresh listing.
    pub async fn fetch_all<A>(&self, api: &A, params: &ListParams) -> Result<Vec<E>>
    where
        A: ResourceApi<E> + ?Sized,
    {
        self.begin().await;
        let result = api.list(params).await;
        self.settle_listing(result).await
    }

    /// [`fetch_all`](Self::fetch_all) that gives up when `cancel` fires.
    ///
    /// A cancelled fetch leaves the items untouched and returns
    /// `NexusError::Cancelled`; a late response is discarded.
    pub async fn fetch_all_cancellable<A>(
        &self,
        api: &A,
        params: &ListParams,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>>
    where
        A: ResourceApi<E> + ?Sized,
    {
        if cancel.is_cancelled() {
            return Err(NexusError::Cancelled);
        }
        self.begin().await;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = api.list(params) => Some(result),
        };

        match result {
            Some(result) => self.settle_listing(result).await,
            None => {
                self.state.write().await.collection.end_request();
                tracing::debug!("[DomainCache] {} listing cancelled", E::KIND);
                Err(NexusError::Cancelled)
            }
        }
    }

    /// Loads one entity into the focus slot.
    pub async fn fetch_one<A>(&self, api: &A, id: &EntityId) -> Result<E>
    where
        A: ResourceApi<E> + ?Sized,
    {
        self.begin().await;
        let result = api.get(id).await;

        let mut state = self.state.write().await;
        match result {
            Ok(item) => {
                state.current = Some(item.clone());
                state.collection.end_request();
                Ok(item)
            }
            Err(e) => {
                state
                    .collection
                    .fail_request(ErrorPayload::from_error(&e, self.labels.fetch_one));
                Err(e)
            }
        }
    }

    /// Creates an entity and puts the server's copy first.
    pub async fn create<A>(&self, api: &A, data: &Value) -> Result<E>
    where
        A: ResourceApi<E> + ?Sized,
    {
        self.begin().await;
        let result = api.create(data).await;

        let mut state = self.state.write().await;
        match result {
            Ok(item) => {
                state.collection.prepend(item.clone());
                state.collection.end_request();
                tracing::debug!("[DomainCache] Created {} '{}'", E::KIND, item.id());
                Ok(item)
            }
            Err(e) => {
                state
                    .collection
                    .fail_request(ErrorPayload::from_error(&e, self.labels.create));
                Err(e)
            }
        }
    }

    /// Updates an entity and reconciles both the item and the focus slot.
    pub async fn update<A>(&self, api: &A, id: &EntityId, data: &Value) -> Result<E>
    where
        A: ResourceApi<E> + ?Sized,
    {
        let permit = self.guard.acquire(id)?;
        self.begin().await;
        let result = api.update(id, data).await;

        let mut state = self.state.write().await;
        match result {
            Ok(item) => {
                state.collection.replace(item.clone());
                state.replace_current_if_matches(&item);
                state.collection.end_request();
                tracing::debug!(
                    "[DomainCache] Updated {} '{}' ({})",
                    E::KIND,
                    id,
                    permit.token()
                );
                Ok(item)
            }
            Err(e) => {
                state
                    .collection
                    .fail_request(ErrorPayload::from_error(&e, self.labels.update));
                Err(e)
            }
        }
    }

    /// Deletes an entity; the focus slot is cleared when it held it.
    pub async fn delete<A>(&self, api: &A, id: &EntityId) -> Result<()>
    where
        A: ResourceApi<E> + ?Sized,
    {
        let _permit = self.guard.acquire(id)?;
        self.begin().await;
        let result = api.delete(id).await;

        let mut state = self.state.write().await;
        match result {
            Ok(()) => {
                state.collection.remove(id);
                state.clear_current_if_matches(id);
                state.collection.end_request();
                tracing::debug!("[DomainCache] Deleted {} '{}'", E::KIND, id);
                Ok(())
            }
            Err(e) => {
                state
                    .collection
                    .fail_request(ErrorPayload::from_error(&e, self.labels.delete));
                Err(e)
            }
        }
    }

    /// Runs a server-side state transition, then patches the cached copies.
    ///
    /// Nothing changes locally until the server confirms. `call` is only
    /// polled once the mutation guard for `id` has been acquired.
    pub async fn transition<F, P>(
        &self,
        id: &EntityId,
        call: F,
        fallback: &str,
        patch: P,
    ) -> Result<()>
    where
        F: Future<Output = Result<()>>,
        P: Fn(&mut E),
    {
        let _permit = self.guard.acquire(id)?;
        self.begin().await;
        let result = call.await;

        let mut state = self.state.write().await;
        match result {
            Ok(()) => {
                state.collection.patch(id, &patch);
                if let Some(current) = state.current.as_mut().filter(|c| c.id() == id) {
                    patch(current);
                }
                state.collection.end_request();
                Ok(())
            }
            Err(e) => {
                state
                    .collection
                    .fail_request(ErrorPayload::from_error(&e, fallback));
                Err(e)
            }
        }
    }

    // ============================================================================
    // Local operations
    // ============================================================================

    /// Focuses a cached entity without a remote call.
    pub async fn select(&self, id: &EntityId) -> Option<E> {
        let mut state = self.state.write().await;
        let selected = state.collection.find(id).cloned();
        state.current = selected.clone();
        selected
    }

    pub async fn set_current(&self, item: Option<E>) {
        self.state.write().await.current = item;
    }

    pub async fn clear_current(&self) {
        self.state.write().await.current = None;
    }

    pub async fn clear_error(&self) {
        self.state.write().await.collection.clear_error();
    }

    /// Drops items, focus slot and error. In-flight requests keep their
    /// loading count.
    pub async fn reset(&self) {
        self.state.write().await.reset();
    }

    // ============================================================================
    // Internals
    // ============================================================================

    async fn begin(&self) {
        self.state.write().await.collection.begin_request(true);
    }

    async fn settle_listing(&self, result: Result<Vec<E>>) -> Result<Vec<E>> {
        let mut state = self.state.write().await;
        match result {
            Ok(items) => {
                state.collection.replace_all(items);
                state.collection.end_request();
                tracing::debug!(
                    "[DomainCache] Loaded {} {} item(s)",
                    state.collection.len(),
                    E::KIND
                );
                Ok(state.collection.items().to_vec())
            }
            Err(e) => {
                tracing::warn!("[DomainCache] {}: {}", self.labels.fetch_all, e);
                state
                    .collection
                    .fail_request(ErrorPayload::from_error(&e, self.labels.fetch_all));
                Err(e)
            }
        }
    }
}
