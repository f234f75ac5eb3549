//! Open messaging envelopes
//!
//! Messages exchanged with an Open Messaging integration are objects keyed by
//! `type`: `Text`, `Structured`, `ButtonResponse`, `Receipt` and `Event`.
//! They share a common header (id, channel, direction, metadata and
//! conversation id) and carry normalized [`Content`](crate::protocol::Content)
//! elements.

pub mod channel;
pub mod event;
pub mod message;
pub mod receipt;

use std::{collections::HashMap, sync::OnceLock};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub use channel::{ChannelType, OpenMessageChannel, OpenMessageFrom, OpenMessageTo};
pub use event::{OpenMessageEvent, OpenMessageEvents, TypingEvent};
pub use message::{OpenMessageButtonResponse, OpenMessageText, MAX_RELATED_DEPTH};
pub use receipt::{OpenMessageReceipt, ReceiptStatus, StatusReason};

use crate::{
    codec::{serde_via_codec, Decode, Encode},
    config::CodecConfig,
    protocol::{
        error::{CodecError, CodecResult},
        redact::{redact_with_hash, Redact},
        registry::TypeRegistry,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Fields shared by every open message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenMessageHeader {
    /// Free form identifier chosen by the sender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub channel: OpenMessageChannel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// `Bot` or `Human`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub originating_entity: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::protocol::scalar::uuid_opt"
    )]
    pub conversation_id: Option<Uuid>,
    #[serde(default, skip_serializing)]
    pub keys_to_redact: Vec<String>,
}

impl OpenMessageHeader {
    pub fn new(channel: OpenMessageChannel, direction: Direction) -> Self {
        Self {
            id: None,
            channel,
            direction: Some(direction),
            originating_entity: None,
            metadata: HashMap::new(),
            conversation_id: None,
            keys_to_redact: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl Redact for OpenMessageHeader {
    fn redact_with(&self, config: &CodecConfig) -> Self {
        let metadata = self
            .metadata
            .iter()
            .map(|(key, value)| {
                if self.keys_to_redact.contains(key) {
                    (key.clone(), redact_with_hash(value))
                } else {
                    (key.clone(), value.clone())
                }
            })
            .collect();
        Self {
            channel: self.channel.redact_with(config),
            metadata,
            ..self.clone()
        }
    }
}

pub(crate) fn envelope_to_value<T: Serialize>(message_type: &str, wire: &T) -> CodecResult<Value> {
    let mut value = serde_json::to_value(wire).map_err(CodecError::marshal)?;
    if let Value::Object(object) = &mut value {
        object.insert("type".to_string(), Value::from(message_type));
    }
    Ok(value)
}

pub(crate) fn envelope_from_value<T: DeserializeOwned>(value: Value) -> CodecResult<T> {
    serde_json::from_value(value).map_err(CodecError::unmarshal)
}

/// A message of the open messaging family
#[derive(Debug, Clone, PartialEq)]
pub enum OpenMessage {
    Text(OpenMessageText),
    /// Same layout as a text message, the content list drives rendering
    Structured(OpenMessageText),
    ButtonResponse(OpenMessageButtonResponse),
    Receipt(OpenMessageReceipt),
    Event(OpenMessageEvents),
}

fn registry() -> &'static TypeRegistry<OpenMessage> {
    static REGISTRY: OnceLock<TypeRegistry<OpenMessage>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        TypeRegistry::new("open message", "type")
            .with("Text", |value, config| {
                OpenMessageText::decode(value, config, 0).map(OpenMessage::Text)
            })
            .with("Structured", |value, config| {
                OpenMessageText::decode(value, config, 0).map(OpenMessage::Structured)
            })
            .with("ButtonResponse", |value, config| {
                OpenMessageButtonResponse::decode(value, config).map(OpenMessage::ButtonResponse)
            })
            .with("Receipt", |value, _| {
                OpenMessageReceipt::decode(value).map(OpenMessage::Receipt)
            })
            .with("Event", |value, config| {
                OpenMessageEvents::decode(value, config).map(OpenMessage::Event)
            })
    })
}

impl OpenMessage {
    /// The `type` discriminator
    pub fn message_type(&self) -> &'static str {
        match self {
            OpenMessage::Text(_) => "Text",
            OpenMessage::Structured(_) => "Structured",
            OpenMessage::ButtonResponse(_) => "ButtonResponse",
            OpenMessage::Receipt(_) => "Receipt",
            OpenMessage::Event(_) => "Event",
        }
    }

    pub fn header(&self) -> &OpenMessageHeader {
        match self {
            OpenMessage::Text(message) | OpenMessage::Structured(message) => &message.header,
            OpenMessage::ButtonResponse(message) => &message.header,
            OpenMessage::Receipt(message) => &message.header,
            OpenMessage::Event(message) => &message.header,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.header().id.as_deref()
    }

    pub fn supported_types() -> Vec<&'static str> {
        registry().supported_types()
    }

    /// Decode one open message, `depth` counts enclosing `relatedMessages`
    pub(crate) fn decode_at(value: Value, config: &CodecConfig, depth: usize) -> CodecResult<Self> {
        match value.get("type").and_then(Value::as_str) {
            Some("Text") => OpenMessageText::decode(value, config, depth).map(OpenMessage::Text),
            Some("Structured") => {
                OpenMessageText::decode(value, config, depth).map(OpenMessage::Structured)
            }
            _ => registry().unmarshal(value, config),
        }
    }
}

impl Encode for OpenMessage {
    fn to_value(&self) -> CodecResult<Value> {
        match self {
            OpenMessage::Text(message) | OpenMessage::Structured(message) => {
                message.encode(self.message_type())
            }
            OpenMessage::ButtonResponse(message) => message.encode(),
            OpenMessage::Receipt(message) => message.encode(),
            OpenMessage::Event(message) => message.encode(),
        }
    }
}

impl Decode for OpenMessage {
    fn from_value_with(value: Value, config: &CodecConfig) -> CodecResult<Self> {
        registry().unmarshal(value, config)
    }
}

serde_via_codec!(OpenMessage);

impl Redact for OpenMessage {
    fn redact_with(&self, config: &CodecConfig) -> Self {
        match self {
            OpenMessage::Text(message) => OpenMessage::Text(message.redact_with(config)),
            OpenMessage::Structured(message) => OpenMessage::Structured(message.redact_with(config)),
            OpenMessage::ButtonResponse(message) => {
                OpenMessage::ButtonResponse(message.redact_with(config))
            }
            OpenMessage::Receipt(message) => OpenMessage::Receipt(message.redact_with(config)),
            OpenMessage::Event(message) => OpenMessage::Event(message.redact_with(config)),
        }
    }
}

macro_rules! open_message_from {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(
            impl From<$ty> for OpenMessage {
                fn from(message: $ty) -> Self {
                    OpenMessage::$variant(message)
                }
            }
        )+
    };
}

open_message_from!(
    ButtonResponse(OpenMessageButtonResponse),
    Receipt(OpenMessageReceipt),
    Event(OpenMessageEvents),
);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_registry_types() {
        assert_eq!(
            OpenMessage::supported_types(),
            vec!["ButtonResponse", "Event", "Receipt", "Structured", "Text"]
        );
    }

    #[test]
    fn test_unknown_type() {
        let err = OpenMessage::from_value(json!({"type": "Reaction"})).unwrap_err();
        assert!(err.is_json_unmarshal());
        assert!(err.is_invalid_type());

        let err = OpenMessage::from_value(json!({"text": "hello"})).unwrap_err();
        assert_eq!(err.missing_argument(), Some("type"));
    }

    #[test]
    fn test_header_metadata_redaction() {
        let payload = json!({
            "type": "Text",
            "id": "gmAy9zNkhf4ermFvHH9mB5",
            "channel": {
                "platform": "Open",
                "type": "Private",
                "to": {"id": "edce4efa"},
                "from": {"id": "abcdef12345", "idType": "Opaque"},
                "time": "2021-04-09T04:43:33.705Z"
            },
            "direction": "Inbound",
            "text": "Hello",
            "metadata": {"phone": "+15551234567", "source": "web"},
            "keysToRedact": ["phone"]
        });
        let message = OpenMessage::from_value(payload).unwrap();
        assert_eq!(message.id(), Some("gmAy9zNkhf4ermFvHH9mB5"));

        let redacted = message.redact_with(&CodecConfig::default());
        let header = redacted.header();
        assert!(header.metadata["phone"].starts_with("REDACTED-"));
        assert_eq!(header.metadata["source"], "web");
        assert_eq!(message.header().metadata["phone"], "+15551234567");
    }
}
