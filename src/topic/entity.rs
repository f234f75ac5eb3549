//! Platform entities carried by topic events

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::CodecConfig,
    protocol::redact::{redact_non_empty, Redact},
};

/// A member of a chat conversation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMember {
    #[serde(default, with = "crate::protocol::scalar::uuid_opt")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub display_name: String,
    /// `AGENT`, `CUSTOMER`, `ACD`, ...
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub state: String,
    #[serde(rename = "joinDate", default, with = "crate::protocol::scalar::instant_opt")]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(rename = "leaveDate", default, with = "crate::protocol::scalar::instant_opt")]
    pub left_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub authenticated_guest: bool,
    #[serde(default)]
    pub custom_fields: HashMap<String, String>,
}

impl Redact for ChatMember {
    fn redact_with(&self, _config: &CodecConfig) -> Self {
        Self {
            display_name: redact_non_empty(&self.display_name),
            custom_fields: self
                .custom_fields
                .iter()
                .map(|(key, value)| (key.clone(), redact_non_empty(value)))
                .collect(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceDefinition {
    #[serde(default, with = "crate::protocol::scalar::uuid_opt")]
    pub id: Option<Uuid>,
    /// `Available`, `Away`, `Busy`, `Offline`, ...
    #[serde(default)]
    pub system_presence: String,
}

/// Presence of a user
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPresence {
    #[serde(default, with = "crate::protocol::scalar::uuid_opt")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub presence_definition: Option<PresenceDefinition>,
    #[serde(default)]
    pub message: String,
    #[serde(default, with = "crate::protocol::scalar::instant_opt")]
    pub modified_date: Option<DateTime<Utc>>,
}

/// ACD routing status of a user
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingStatus {
    #[serde(default)]
    pub user_id: String,
    /// `OFF_QUEUE`, `IDLE`, `INTERACTING`, `NOT_RESPONDING`, `COMMUNICATING`
    #[serde(default)]
    pub status: String,
    #[serde(default, with = "crate::protocol::scalar::instant_opt")]
    pub start_time: Option<DateTime<Utc>>,
}

/// A participant of a conversation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(default, with = "crate::protocol::scalar::uuid_opt")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default, with = "crate::protocol::scalar::instant_opt")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::protocol::scalar::instant_opt")]
    pub connected_time: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::protocol::scalar::instant_opt")]
    pub end_time: Option<DateTime<Utc>>,
}

impl Redact for Participant {
    fn redact_with(&self, _config: &CodecConfig) -> Self {
        Self {
            name: redact_non_empty(&self.name),
            ..self.clone()
        }
    }
}
