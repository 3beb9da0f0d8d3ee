//! Analytics aggregates fetched from the server.

mod model;

pub use model::{AnalyticsState, DashboardData, PipelineStage};
