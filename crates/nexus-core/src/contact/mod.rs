//! Contact domain module.

mod model;

pub use model::{Contact, ContactSource};
