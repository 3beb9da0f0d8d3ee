//! Opportunity domain model and pipeline stages.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::id::{Entity, EntityId};
use crate::serde_helpers;

/// Pipeline stage of an opportunity, in board order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    #[default]
    Prospect,
    Qualified,
    Proposal,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Prospect,
        Stage::Qualified,
        Stage::Proposal,
        Stage::Negotiation,
        Stage::ClosedWon,
        Stage::ClosedLost,
    ];

    pub fn is_closed(self) -> bool {
        matches!(self, Stage::ClosedWon | Stage::ClosedLost)
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Prospect => "Prospect",
            Stage::Qualified => "Qualified",
            Stage::Proposal => "Proposal",
            Stage::Negotiation => "Negotiation",
            Stage::ClosedWon => "Closed Won",
            Stage::ClosedLost => "Closed Lost",
        }
    }
}

/// A deal in the sales pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub contact: Option<EntityId>,
    #[serde(default, deserialize_with = "serde_helpers::decimal")]
    pub value: f64,
    #[serde(default)]
    pub stage: Stage,
    /// Win probability in percent (0-100).
    #[serde(default)]
    pub probability: u32,
    #[serde(default)]
    pub expected_close_date: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub closed_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Opportunity {
    /// Value weighted by win probability.
    pub fn weighted_value(&self) -> f64 {
        self.value * f64::from(self.probability.min(100)) / 100.0
    }
}

impl Entity for Opportunity {
    const KIND: &'static str = "opportunity";

    fn id(&self) -> &EntityId {
        &self.id
    }
}
