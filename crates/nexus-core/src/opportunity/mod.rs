//! Opportunity (sales pipeline) domain module.

mod model;

pub use model::{Opportunity, Stage};
