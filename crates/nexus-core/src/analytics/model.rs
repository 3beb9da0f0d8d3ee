//! Dashboard and pipeline aggregate views.
//!
//! Both are read-only server snapshots: each fetch replaces the previous one
//! wholesale, there is no client-side merge.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::collection::ErrorPayload;
use crate::opportunity::Stage;
use crate::serde_helpers;

/// Dashboard metrics for the last 30 days.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    #[serde(default)]
    pub total_contacts: Option<u64>,
    #[serde(default)]
    pub total_opportunities: Option<u64>,
    #[serde(default, deserialize_with = "serde_helpers::optional_decimal")]
    pub total_value: Option<f64>,
    #[serde(default)]
    pub open_tasks: Option<u64>,
    #[serde(default)]
    pub closed_won: Option<u64>,
    #[serde(default, deserialize_with = "serde_helpers::optional_decimal")]
    pub closed_won_value: Option<f64>,
    #[serde(default, deserialize_with = "serde_helpers::optional_decimal")]
    pub avg_deal_size: Option<f64>,
    #[serde(default, deserialize_with = "serde_helpers::optional_decimal")]
    pub win_rate: Option<f64>,
    #[serde(default)]
    pub active_opportunities: Option<u64>,
    #[serde(default, deserialize_with = "serde_helpers::optional_decimal")]
    pub conversion_rate: Option<f64>,
    /// Period-over-period comparison fields and anything else the server adds.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One row of the server-side pipeline breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStage {
    pub stage: Stage,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default, deserialize_with = "serde_helpers::decimal")]
    pub value: f64,
    #[serde(default, deserialize_with = "serde_helpers::decimal")]
    pub percentage: f64,
    #[serde(default, deserialize_with = "serde_helpers::decimal")]
    pub avg_probability: f64,
}

/// Cached aggregates with loading/error flags shared by the analytics domain.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyticsState {
    pub dashboard: Option<DashboardData>,
    pub pipeline: Vec<PipelineStage>,
    pending_requests: u32,
    error: Option<ErrorPayload>,
}

impl AnalyticsState {
    pub fn is_loading(&self) -> bool {
        self.pending_requests > 0
    }

    pub fn error(&self) -> Option<&ErrorPayload> {
        self.error.as_ref()
    }

    pub fn begin_request(&mut self) {
        self.pending_requests += 1;
        self.error = None;
    }

    pub fn end_request(&mut self) {
        self.pending_requests = self.pending_requests.saturating_sub(1);
    }

    /// Records a failed fetch; the previous snapshots stay available.
    pub fn fail_request(&mut self, error: ErrorPayload) {
        self.end_request();
        self.error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn reset(&mut self) {
        self.dashboard = None;
        self.pipeline.clear();
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_keeps_comparison_fields() {
        let data: DashboardData = serde_json::from_str(
            r#"{"total_contacts": 12, "total_value": 1500.5, "win_rate": "33.3",
                "contacts_change": 20.0}"#,
        )
        .unwrap();

        assert_eq!(data.total_contacts, Some(12));
        assert_eq!(data.win_rate, Some(33.3));
        assert!(data.extra.contains_key("contacts_change"));
    }

    #[test]
    fn test_failed_fetch_keeps_snapshot() {
        let mut state = AnalyticsState {
            dashboard: Some(DashboardData::default()),
            ..Default::default()
        };
        state.begin_request();
        state.fail_request(ErrorPayload::Message("Failed to fetch dashboard data".into()));

        assert!(state.dashboard.is_some());
        assert!(!state.is_loading());
        assert!(state.error().is_some());
    }
}
