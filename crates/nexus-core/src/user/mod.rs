//! User domain module.
//!
//! - `model`: user profile and role as returned by the auth endpoints

mod model;

pub use model::{ProfileUpdate, Role, UserProfile};
