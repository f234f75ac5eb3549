//! Routing information of an open message

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::CodecConfig,
    protocol::{
        error::{CodecError, CodecResult},
        redact::{redact_keys, redact_non_empty, Redact},
    },
};

/// Visibility of the conversation on the external platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelType {
    Private,
    Public,
}

/// Recipient of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenMessageTo {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "idType", default, skip_serializing_if = "Option::is_none")]
    pub id_type: Option<String>,
}

impl OpenMessageTo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            id_type: None,
        }
    }
}

/// Sender of a message
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenMessageFrom {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl OpenMessageFrom {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_names(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }
}

impl Redact for OpenMessageFrom {
    fn redact_with(&self, _config: &CodecConfig) -> Self {
        let redact = |name: &Option<String>| name.as_deref().map(redact_non_empty);
        Self {
            first_name: redact(&self.first_name),
            last_name: redact(&self.last_name),
            nickname: redact(&self.nickname),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ChannelMetadata {
    #[serde(rename = "customAttributes", default, skip_serializing_if = "HashMap::is_empty")]
    custom_attributes: HashMap<String, String>,
}

/// Channel of an open message
///
/// Custom attributes travel under `metadata.customAttributes`. Keys listed in
/// `keysToRedact` are only read from the wire and drive [`Redact`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ChannelWire", into = "ChannelWire")]
pub struct OpenMessageChannel {
    pub id: Option<Uuid>,
    pub platform: String,
    pub channel_type: ChannelType,
    pub message_id: Option<String>,
    pub time: DateTime<Utc>,
    pub to: Option<OpenMessageTo>,
    pub from: Option<OpenMessageFrom>,
    pub custom_attributes: HashMap<String, String>,
    pub keys_to_redact: Vec<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelWire {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::protocol::scalar::uuid_opt"
    )]
    id: Option<Uuid>,
    #[serde(default)]
    platform: String,
    #[serde(rename = "type")]
    channel_type: ChannelType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message_id: Option<String>,
    #[serde(with = "crate::protocol::scalar::instant")]
    time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    to: Option<OpenMessageTo>,
    #[serde(default)]
    from: Option<OpenMessageFrom>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<ChannelMetadata>,
    #[serde(default, skip_serializing)]
    keys_to_redact: Vec<String>,
}

impl From<ChannelWire> for OpenMessageChannel {
    fn from(wire: ChannelWire) -> Self {
        Self {
            id: wire.id,
            platform: wire.platform,
            channel_type: wire.channel_type,
            message_id: wire.message_id,
            time: wire.time,
            to: wire.to,
            from: wire.from,
            custom_attributes: wire.metadata.unwrap_or_default().custom_attributes,
            keys_to_redact: wire.keys_to_redact,
        }
    }
}

impl From<OpenMessageChannel> for ChannelWire {
    fn from(channel: OpenMessageChannel) -> Self {
        let metadata = (!channel.custom_attributes.is_empty()).then(|| ChannelMetadata {
            custom_attributes: channel.custom_attributes,
        });
        Self {
            id: channel.id,
            platform: channel.platform,
            channel_type: channel.channel_type,
            message_id: channel.message_id,
            time: channel.time,
            to: channel.to,
            from: channel.from,
            metadata,
            keys_to_redact: Vec::new(),
        }
    }
}

impl OpenMessageChannel {
    /// A private `Open` channel between two parties
    pub fn new(from: OpenMessageFrom, to: OpenMessageTo, time: DateTime<Utc>) -> Self {
        Self {
            id: None,
            platform: "Open".to_string(),
            channel_type: ChannelType::Private,
            message_id: None,
            time,
            to: Some(to),
            from: Some(from),
            custom_attributes: HashMap::new(),
            keys_to_redact: Vec::new(),
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_attributes.insert(key.into(), value.into());
        self
    }

    /// Check the channel can be used to send a message
    pub fn validate(&self) -> CodecResult<()> {
        if self.platform != "Open" {
            return Err(CodecError::invalid("channel.platform", &self.platform, "Open"));
        }
        match &self.from {
            Some(from) if from.id.is_empty() => return Err(CodecError::missing("channel.from.id")),
            Some(_) => {}
            None => return Err(CodecError::missing("channel.from")),
        }
        match &self.to {
            Some(to) if to.id.is_empty() => Err(CodecError::missing("channel.to.id")),
            Some(_) => Ok(()),
            None => Err(CodecError::missing("channel.to")),
        }
    }
}

impl Redact for OpenMessageChannel {
    fn redact_with(&self, config: &CodecConfig) -> Self {
        Self {
            from: self.from.as_ref().map(|from| from.redact_with(config)),
            custom_attributes: redact_keys(&self.custom_attributes, &self.keys_to_redact),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload() -> serde_json::Value {
        json!({
            "platform": "Open",
            "type": "Private",
            "messageId": "gmAy9zNkhf4ermFvHH9mB5",
            "to": {"id": "edce4efa-4abf-468b-ada7-cd6d35e7bbaf"},
            "from": {"id": "abcdef12345", "idType": "Opaque", "firstName": "Bob", "lastName": "Minion"},
            "time": "2021-04-09T04:43:33.705Z",
            "metadata": {"customAttributes": {"email": "bob@acme.com", "tier": "gold"}},
            "keysToRedact": ["email"]
        })
    }

    #[test]
    fn test_channel_wire_shape() {
        let channel: OpenMessageChannel = serde_json::from_value(payload()).unwrap();
        assert_eq!(channel.channel_type, ChannelType::Private);
        assert_eq!(channel.custom_attributes["tier"], "gold");
        assert_eq!(channel.keys_to_redact, vec!["email".to_string()]);
        assert!(channel.validate().is_ok());

        let value = serde_json::to_value(&channel).unwrap();
        assert!(value.get("keysToRedact").is_none());
        assert_eq!(value["metadata"]["customAttributes"]["email"], "bob@acme.com");
        assert_eq!(value["time"], "2021-04-09T04:43:33.705Z");
    }

    #[test]
    fn test_channel_redaction() {
        let channel: OpenMessageChannel = serde_json::from_value(payload()).unwrap();
        let redacted = channel.redact_with(&CodecConfig::default());
        let from = redacted.from.as_ref().unwrap();
        assert!(from.first_name.as_deref().unwrap().starts_with("REDACTED-"));
        assert!(from.last_name.as_deref().unwrap().starts_with("REDACTED-"));
        assert_eq!(from.nickname, None);
        assert!(redacted.custom_attributes["email"].starts_with("REDACTED-"));
        assert_eq!(redacted.custom_attributes["tier"], "gold");
        assert_eq!(channel.from.unwrap().first_name.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_channel_validation() {
        let mut channel = OpenMessageChannel::new(
            OpenMessageFrom::new("abcdef12345"),
            OpenMessageTo::new("edce4efa"),
            Utc::now(),
        );
        assert!(channel.validate().is_ok());

        channel.to = None;
        assert_eq!(channel.validate().unwrap_err().missing_argument(), Some("channel.to"));

        channel.platform = "Facebook".to_string();
        assert!(channel.validate().unwrap_err().is_argument_invalid());
    }
}
