//! Domain layer of the NexusFlow CRM client.
//!
//! Holds the entity models, the shared error type, the traits the stores use
//! to reach the remote API and durable storage, collection reconciliation
//! helpers and the derived views computed from cached items.

pub mod analytics;
pub mod api;
pub mod auth;
pub mod calendar;
pub mod collection;
pub mod config;
pub mod contact;
pub mod envelope;
pub mod error;
pub mod id;
pub mod opportunity;
pub mod serde_helpers;
pub mod task;
pub mod user;
pub mod views;

// Re-export common types
pub use collection::{Collection, DomainState, ErrorPayload};
pub use error::{ApiError, NexusError, Result};
pub use id::{Entity, EntityId};
