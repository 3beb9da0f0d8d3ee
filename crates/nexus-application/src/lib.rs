//! Application services of the NexusFlow client.
//!
//! [`AuthSession`] owns the authenticated identity and its persisted
//! credential slots. [`DomainCache`] owns the fetched collections and
//! aggregates and reconciles them with server responses. [`NexusApp`] wires
//! both to the HTTP client and the credential store.

pub mod app;
pub mod auth_session;
pub mod domain_cache;
pub mod mutation_guard;

pub use app::NexusApp;
pub use auth_session::AuthSession;
pub use domain_cache::{DomainApis, DomainCache, EntityStore, StoreLabels};
pub use mutation_guard::{MutationGuard, MutationPermit};
