//! Contact domain model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::id::{Entity, EntityId};

/// Where a contact was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContactSource {
    Referral,
    ColdCall,
    Website,
    Email,
    SocialMedia,
    #[default]
    Other,
}

/// A person tracked by the CRM.
///
/// Fields the client does not model (tags, owner...) are kept in `extra` so
/// they survive reconciliation untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: EntityId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source: ContactSource,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub last_contacted: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl Entity for Contact {
    const KIND: &'static str = "contact";

    fn id(&self) -> &EntityId {
        &self.id
    }
}
