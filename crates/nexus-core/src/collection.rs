//! Cached collections and their reconciliation rules.
//!
//! A [`Collection`] keeps the server-ordered items of one entity type together
//! with its loading and error flags. Every reconciliation method preserves
//! the uniqueness invariant: at most one item per id.

use serde::Serialize;
use std::collections::HashSet;

use crate::error::{ApiError, NexusError};
use crate::id::{Entity, EntityId};

/// Error recorded in a store slot for passive observation by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    /// Structured payload sent by the server.
    Server(ApiError),
    /// Local message (validation or fallback text).
    Message(String),
}

impl ErrorPayload {
    /// Builds the payload to record for `err`.
    ///
    /// Server payloads are kept verbatim; transport and internal failures are
    /// replaced by `fallback`.
    pub fn from_error(err: &NexusError, fallback: &str) -> Self {
        match err {
            NexusError::Api(payload) if !payload.is_empty() => Self::Server(payload.clone()),
            NexusError::Validation { message, .. } => Self::Message(message.clone()),
            _ => Self::Message(fallback.to_string()),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Server(payload) => payload
                .message()
                .unwrap_or_else(|| payload.to_string()),
            Self::Message(message) => message.clone(),
        }
    }
}

/// In-memory cached list of one entity type plus its request flags.
#[derive(Debug, Clone, Serialize)]
pub struct Collection<E> {
    items: Vec<E>,
    pending_requests: u32,
    error: Option<ErrorPayload>,
}

impl<E> Default for Collection<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pending_requests: 0,
            error: None,
        }
    }
}

impl<E: Entity> Collection<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True while at least one request on this collection is pending.
    pub fn is_loading(&self) -> bool {
        self.pending_requests > 0
    }

    pub fn error(&self) -> Option<&ErrorPayload> {
        self.error.as_ref()
    }

    pub fn find(&self, id: &EntityId) -> Option<&E> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.find(id).is_some()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.items.iter().map(|item| item.id().clone()).collect()
    }

    /// Marks a request as started; clears the previous error when asked to.
    pub fn begin_request(&mut self, clear_error: bool) {
        self.pending_requests += 1;
        if clear_error {
            self.error = None;
        }
    }

    /// Marks a request as finished without touching items or error.
    pub fn end_request(&mut self) {
        self.pending_requests = self.pending_requests.saturating_sub(1);
    }

    /// Finishes a request that failed and records its error.
    ///
    /// Items are left as the last known-good snapshot.
    pub fn fail_request(&mut self, error: ErrorPayload) {
        self.end_request();
        self.error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Replaces all items with a fresh server listing.
    ///
    /// Duplicate ids in the listing are collapsed, keeping the first
    /// occurrence and the server order.
    pub fn replace_all(&mut self, items: Vec<E>) {
        let mut seen = HashSet::with_capacity(items.len());
        self.items = items
            .into_iter()
            .filter(|item| seen.insert(item.id().clone()))
            .collect();
    }

    /// Inserts a newly created entity at the front.
    ///
    /// An existing item with the same id is dropped first.
    pub fn prepend(&mut self, item: E) {
        let id = item.id().clone();
        self.items.retain(|existing| existing.id() != &id);
        self.items.insert(0, item);
    }

    /// Replaces the item with the same id. Returns false when absent.
    pub fn replace(&mut self, item: E) -> bool {
        match self.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    /// Applies `patch` to the item with `id`. Returns false when absent.
    pub fn patch<F>(&mut self, id: &EntityId, patch: F) -> bool
    where
        F: FnOnce(&mut E),
    {
        match self.items.iter_mut().find(|existing| existing.id() == id) {
            Some(item) => {
                patch(item);
                true
            }
            None => false,
        }
    }

    /// Removes the item with `id`, returning it when present.
    pub fn remove(&mut self, id: &EntityId) -> Option<E> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    /// Drops all items and flags.
    pub fn clear(&mut self) {
        self.items.clear();
        self.error = None;
    }

    /// True when no two items share an id.
    pub fn has_unique_ids(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.items.len());
        self.items.iter().all(|item| seen.insert(item.id()))
    }
}

/// Cached state of one domain: its collection and the focused entity.
///
/// `current` holds a copy; changing it never touches `collection` and vice
/// versa. Reconciliation between the two is done explicitly by the store.
#[derive(Debug, Clone, Serialize)]
pub struct DomainState<E> {
    pub collection: Collection<E>,
    pub current: Option<E>,
}

impl<E> Default for DomainState<E> {
    fn default() -> Self {
        Self {
            collection: Collection::default(),
            current: None,
        }
    }
}

impl<E: Entity> DomainState<E> {
    /// True when the focused entity has `id`.
    pub fn current_is(&self, id: &EntityId) -> bool {
        self.current.as_ref().is_some_and(|current| current.id() == id)
    }

    /// Replaces the focused entity when it has the same id as `item`.
    pub fn replace_current_if_matches(&mut self, item: &E) {
        if self.current_is(item.id()) {
            self.current = Some(item.clone());
        }
    }

    /// Clears the focused entity when it has `id`.
    pub fn clear_current_if_matches(&mut self, id: &EntityId) {
        if self.current_is(id) {
            self.current = None;
        }
    }

    /// Drops items and the focused entity.
    pub fn reset(&mut self) {
        self.collection.clear();
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: EntityId,
        name: String,
    }

    impl Entity for Item {
        const KIND: &'static str = "item";

        fn id(&self) -> &EntityId {
            &self.id
        }
    }

    fn item(id: i64, name: &str) -> Item {
        Item {
            id: EntityId::from(id),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_replace_all_collapses_duplicates() {
        let mut collection = Collection::new();
        collection.replace_all(vec![item(1, "A"), item(2, "B"), item(1, "A2")]);

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.items()[0].name, "A");
        assert!(collection.has_unique_ids());
    }

    #[test]
    fn test_prepend_replaces_existing_id() {
        let mut collection = Collection::new();
        collection.replace_all(vec![item(1, "A"), item(2, "B")]);
        collection.prepend(item(2, "B2"));

        assert_eq!(collection.ids(), vec![EntityId::from(2), EntityId::from(1)]);
        assert_eq!(collection.items()[0].name, "B2");
    }

    #[test]
    fn test_replace_and_remove() {
        let mut collection = Collection::new();
        collection.replace_all(vec![item(3, "C"), item(5, "E"), item(7, "G")]);

        assert!(collection.replace(item(5, "E2")));
        assert!(!collection.replace(item(9, "I")));
        assert_eq!(collection.find(&EntityId::from(5)).unwrap().name, "E2");

        let removed = collection.remove(&EntityId::from(5));
        assert_eq!(removed.map(|i| i.name), Some("E2".to_string()));
        assert_eq!(collection.ids(), vec![EntityId::from(3), EntityId::from(7)]);
        assert!(collection.remove(&EntityId::from(5)).is_none());
    }

    #[test]
    fn test_uniqueness_holds_across_mutation_sequences() {
        let mut collection = Collection::new();
        collection.replace_all(vec![item(1, "A")]);
        for round in 0..5 {
            collection.prepend(item(round % 3, "x"));
            collection.replace(item(1, "y"));
            if round % 2 == 0 {
                collection.remove(&EntityId::from(round % 3));
            }
            assert!(collection.has_unique_ids());
        }
    }

    #[test]
    fn test_loading_tracks_overlapping_requests() {
        let mut collection: Collection<Item> = Collection::new();
        collection.begin_request(true);
        collection.begin_request(true);
        collection.end_request();
        assert!(collection.is_loading());

        collection.fail_request(ErrorPayload::Message("boom".to_string()));
        assert!(!collection.is_loading());
        assert_eq!(collection.error().map(|e| e.message()), Some("boom".to_string()));
    }

    #[test]
    fn test_error_payload_from_network_error_uses_fallback() {
        let payload =
            ErrorPayload::from_error(&NexusError::network("refused"), "Failed to create contact");
        assert_eq!(payload, ErrorPayload::Message("Failed to create contact".to_string()));
    }

    #[test]
    fn test_error_payload_keeps_server_payload() {
        let api = ApiError::with_detail(Some(400), "Email already exists");
        let payload = ErrorPayload::from_error(&NexusError::Api(api.clone()), "fallback");
        assert_eq!(payload, ErrorPayload::Server(api));
        assert_eq!(payload.message(), "Email already exists");
    }

    #[test]
    fn test_domain_state_current_reconciliation() {
        let mut state = DomainState::default();
        state.current = Some(item(1, "A"));

        state.replace_current_if_matches(&item(2, "B"));
        assert_eq!(state.current.as_ref().unwrap().name, "A");

        state.replace_current_if_matches(&item(1, "A2"));
        assert_eq!(state.current.as_ref().unwrap().name, "A2");

        state.clear_current_if_matches(&EntityId::from(1));
        assert!(state.current.is_none());
    }
}
