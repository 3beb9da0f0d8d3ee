//! HTTP implementation of the NexusFlow API traits.
//!
//! [`HttpApiClient`] implements every trait in `nexus_core::api` over a
//! single `reqwest::Client`. It reads the bearer token from the shared
//! `TokenCell` on each request and transparently refreshes it once on a 401.

pub mod endpoints;
pub mod error_mapping;
mod auth_api;
mod http_client;
mod resources;

pub use http_client::HttpApiClient;
pub use resources::RemoteResource;
