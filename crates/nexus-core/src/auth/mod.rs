//! Authentication domain module.
//!
//! # Module Structure
//!
//! - `model`: credentials, auth responses and the session state
//! - `storage`: durable credential slots and the store trait
//! - `token`: in-memory bearer token cell shared with the API client

mod model;
mod storage;
mod token;

pub use model::{
    AuthResponse, LoginCredentials, PasswordChange, RegisterRequest, SessionSnapshot,
    SessionState, TokenRefresh,
};
pub use storage::{CredentialSlot, CredentialStore};
pub use token::{TokenCell, TokenPair};
