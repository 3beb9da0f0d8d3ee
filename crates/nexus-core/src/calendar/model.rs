//! Calendar event domain model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::id::{Entity, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    #[default]
    Meeting,
    Call,
    Deadline,
    Task,
    Reminder,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

/// Scheduled event, optionally linked to a contact and an opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub customer: Option<EntityId>,
    #[serde(default)]
    pub opportunity: Option<EntityId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity for CalendarEvent {
    const KIND: &'static str = "calendar_event";

    fn id(&self) -> &EntityId {
        &self.id
    }
}
