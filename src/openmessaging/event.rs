//! Event open messages (typing indicators)

use std::{sync::OnceLock, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    codec::{serde_via_codec, Decode, Encode},
    config::CodecConfig,
    protocol::{
        error::{CodecError, CodecResult},
        redact::Redact,
        registry::TypeRegistry,
    },
};

use super::{envelope_from_value, envelope_to_value, OpenMessageHeader};

/// The other party started or stopped typing
///
/// `duration` is how long the indicator should be shown, zero lets the
/// platform decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypingEvent {
    pub is_typing: bool,
    pub duration: Duration,
}

#[derive(Serialize, Deserialize)]
struct TypingWire {
    #[serde(rename = "type")]
    typing_type: String,
    #[serde(default, with = "crate::protocol::scalar::duration_ms")]
    duration: Duration,
}

impl TypingEvent {
    pub fn on() -> Self {
        Self {
            is_typing: true,
            duration: Duration::ZERO,
        }
    }

    pub fn off() -> Self {
        Self {
            is_typing: false,
            duration: Duration::ZERO,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    fn encode(&self) -> CodecResult<Value> {
        if self.is_typing && self.duration.is_zero() {
            return Ok(json!({"eventType": "Typing"}));
        }
        let typing = TypingWire {
            typing_type: if self.is_typing { "On" } else { "Off" }.to_string(),
            duration: self.duration,
        };
        Ok(json!({
            "eventType": "Typing",
            "typing": serde_json::to_value(typing).map_err(CodecError::marshal)?,
        }))
    }

    fn decode(value: Value) -> CodecResult<Self> {
        match value.get("typing") {
            None | Some(Value::Null) => Ok(Self::on()),
            Some(typing) => {
                let wire: TypingWire =
                    serde_json::from_value(typing.clone()).map_err(CodecError::unmarshal)?;
                let is_typing = match wire.typing_type.as_str() {
                    "On" => true,
                    "Off" => false,
                    other => {
                        return Err(CodecError::unmarshal(CodecError::invalid(
                            "typing.type",
                            other,
                            "On, Off",
                        )))
                    }
                };
                Ok(Self {
                    is_typing,
                    duration: wire.duration,
                })
            }
        }
    }
}

/// An event carried by an `Event` open message
#[derive(Debug, Clone, PartialEq)]
pub enum OpenMessageEvent {
    Typing(TypingEvent),
}

fn registry() -> &'static TypeRegistry<OpenMessageEvent> {
    static REGISTRY: OnceLock<TypeRegistry<OpenMessageEvent>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        TypeRegistry::new("open message event", "eventType")
            .with("Typing", |value, _| TypingEvent::decode(value).map(OpenMessageEvent::Typing))
    })
}

impl OpenMessageEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OpenMessageEvent::Typing(_) => "Typing",
        }
    }
}

impl Encode for OpenMessageEvent {
    fn to_value(&self) -> CodecResult<Value> {
        match self {
            OpenMessageEvent::Typing(event) => event.encode(),
        }
    }
}

impl Decode for OpenMessageEvent {
    fn from_value_with(value: Value, config: &CodecConfig) -> CodecResult<Self> {
        registry().unmarshal(value, config)
    }
}

serde_via_codec!(OpenMessageEvent);

impl Redact for TypingEvent {
    fn redact_with(&self, _config: &CodecConfig) -> Self {
        *self
    }
}

impl Redact for OpenMessageEvent {
    fn redact_with(&self, config: &CodecConfig) -> Self {
        match self {
            OpenMessageEvent::Typing(event) => OpenMessageEvent::Typing(event.redact_with(config)),
        }
    }
}

/// The `Event` open message, a batch of events
#[derive(Debug, Clone, PartialEq)]
pub struct OpenMessageEvents {
    pub header: OpenMessageHeader,
    pub events: Vec<OpenMessageEvent>,
}

#[derive(Serialize, Deserialize)]
struct EventsWire {
    #[serde(flatten)]
    header: OpenMessageHeader,
    #[serde(default)]
    events: Vec<Value>,
}

impl OpenMessageEvents {
    pub fn new(header: OpenMessageHeader, events: Vec<OpenMessageEvent>) -> Self {
        Self { header, events }
    }

    pub(crate) fn encode(&self) -> CodecResult<Value> {
        let wire = EventsWire {
            header: self.header.clone(),
            events: self
                .events
                .iter()
                .map(Encode::to_value)
                .collect::<CodecResult<_>>()?,
        };
        envelope_to_value("Event", &wire)
    }

    pub(crate) fn decode(value: Value, config: &CodecConfig) -> CodecResult<Self> {
        let wire: EventsWire = envelope_from_value(value)?;
        Ok(Self {
            header: wire.header,
            events: registry().unmarshal_list(wire.events, config)?,
        })
    }
}

impl Redact for OpenMessageEvents {
    fn redact_with(&self, config: &CodecConfig) -> Self {
        Self {
            header: self.header.redact_with(config),
            events: self.events.iter().map(|event| event.redact_with(config)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::openmessaging::OpenMessage;

    use super::*;

    fn events_payload(events: Value) -> Value {
        json!({
            "type": "Event",
            "channel": {
                "platform": "Open",
                "type": "Private",
                "to": {"id": "edce4efa"},
                "from": {"id": "abcdef12345"},
                "time": "2021-04-09T04:43:33Z"
            },
            "direction": "Inbound",
            "events": events
        })
    }

    #[test]
    fn test_redaction_walks_every_event() {
        let mut payload = events_payload(json!([
            {"eventType": "Typing"},
            {"eventType": "Typing", "typing": {"type": "Off"}}
        ]));
        payload["channel"]["from"]["firstName"] = json!("Jane");
        let message = OpenMessage::from_value(payload).unwrap();
        let OpenMessage::Event(events) = &message else {
            panic!("unexpected message: {message:?}");
        };

        let redacted = events.redact_with(&CodecConfig::default());
        assert_eq!(redacted.events, events.events);
        let first_name = redacted.header.channel.from.unwrap().first_name.unwrap();
        assert!(first_name.starts_with("REDACTED-"), "{first_name}");
    }

    #[test]
    fn test_typing_without_details_is_on() {
        let message = OpenMessage::from_value(events_payload(json!([{"eventType": "Typing"}]))).unwrap();
        let OpenMessage::Event(events) = &message else {
            panic!("unexpected message: {message:?}");
        };
        assert_eq!(events.events, vec![OpenMessageEvent::Typing(TypingEvent::on())]);
        assert_eq!(message.to_value().unwrap()["events"], json!([{"eventType": "Typing"}]));
    }

    #[test]
    fn test_typing_with_duration() {
        let payload = events_payload(json!([
            {"eventType": "Typing", "typing": {"type": "On", "duration": 5000}}
        ]));
        let message = OpenMessage::from_value(payload.clone()).unwrap();
        let OpenMessage::Event(events) = &message else {
            panic!("unexpected message: {message:?}");
        };
        assert_eq!(
            events.events[0],
            OpenMessageEvent::Typing(TypingEvent::on().with_duration(Duration::from_secs(5)))
        );
        assert_eq!(message.to_value().unwrap(), payload);
    }

    #[test]
    fn test_typing_off() {
        let event = OpenMessageEvent::Typing(TypingEvent::off());
        let value = event.to_value().unwrap();
        assert_eq!(value, json!({"eventType": "Typing", "typing": {"type": "Off", "duration": 0}}));
        assert_eq!(OpenMessageEvent::from_value(value).unwrap(), event);
    }

    #[test]
    fn test_unknown_event_type() {
        let err = OpenMessage::from_value(events_payload(json!([{"eventType": "Reaction"}])))
            .unwrap_err();
        assert!(err.is_invalid_type());
    }
}
