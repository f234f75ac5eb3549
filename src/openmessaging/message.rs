//! Text, structured and button response open messages

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::CodecConfig,
    protocol::{
        content::{ButtonResponseContent, Content, ContentVariant},
        error::{CodecError, CodecResult},
        redact::{redact_non_empty, Redact},
    },
};

use super::{envelope_from_value, envelope_to_value, OpenMessage, OpenMessageHeader};

/// Deepest accepted nesting of `relatedMessages`
pub const MAX_RELATED_DEPTH: usize = 8;

/// A `Text` or `Structured` open message
#[derive(Debug, Clone, PartialEq)]
pub struct OpenMessageText {
    pub header: OpenMessageHeader,
    pub text: String,
    pub content: Vec<Content>,
    pub related_messages: Vec<OpenMessage>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextWire {
    #[serde(flatten)]
    header: OpenMessageHeader,
    #[serde(default)]
    text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    content: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    related_messages: Vec<Value>,
}

impl OpenMessageText {
    pub fn new(header: OpenMessageHeader, text: impl Into<String>) -> Self {
        Self {
            header,
            text: text.into(),
            content: Vec::new(),
            related_messages: Vec::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<Content>) -> Self {
        self.content.push(content.into());
        self
    }

    pub fn with_related(mut self, message: impl Into<OpenMessage>) -> Self {
        self.related_messages.push(message.into());
        self
    }

    /// Nesting level of `relatedMessages` below this message
    pub fn related_depth(&self) -> usize {
        self.related_messages
            .iter()
            .map(|message| match message {
                OpenMessage::Text(inner) | OpenMessage::Structured(inner) => 1 + inner.related_depth(),
                _ => 1,
            })
            .max()
            .unwrap_or(0)
    }

    pub fn validate(&self) -> CodecResult<()> {
        if self.related_depth() > MAX_RELATED_DEPTH {
            return Err(CodecError::invalid(
                "relatedMessages",
                self.related_depth(),
                format!("at most {} levels", MAX_RELATED_DEPTH),
            ));
        }
        self.content.iter().try_for_each(Content::validate)
    }

    pub(crate) fn encode(&self, message_type: &str) -> CodecResult<Value> {
        self.validate().map_err(CodecError::marshal)?;
        let wire = TextWire {
            header: self.header.clone(),
            text: self.text.clone(),
            content: Content::encode_list(&self.content)?,
            related_messages: self
                .related_messages
                .iter()
                .map(crate::codec::Encode::to_value)
                .collect::<CodecResult<_>>()?,
        };
        envelope_to_value(message_type, &wire)
    }

    pub(crate) fn decode(value: Value, config: &CodecConfig, depth: usize) -> CodecResult<Self> {
        let wire: TextWire = envelope_from_value(value)?;
        if !wire.related_messages.is_empty() && depth >= MAX_RELATED_DEPTH {
            return Err(CodecError::unmarshal(CodecError::invalid(
                "relatedMessages",
                depth + 1,
                format!("at most {} levels", MAX_RELATED_DEPTH),
            )));
        }
        let related_messages = wire
            .related_messages
            .into_iter()
            .map(|value| OpenMessage::decode_at(value, config, depth + 1))
            .collect::<CodecResult<_>>()
            .map_err(CodecError::unmarshal)?;
        Ok(Self {
            header: wire.header,
            text: wire.text,
            content: Content::decode_list(wire.content, config)?,
            related_messages,
        })
    }
}

impl Redact for OpenMessageText {
    fn redact_with(&self, config: &CodecConfig) -> Self {
        Self {
            header: self.header.redact_with(config),
            text: if config.redact_message_text {
                redact_non_empty(&self.text)
            } else {
                self.text.clone()
            },
            content: self.content.iter().map(|c| c.redact_with(config)).collect(),
            related_messages: self
                .related_messages
                .iter()
                .map(|message| message.redact_with(config))
                .collect(),
        }
    }
}

/// The customer answered a button or quick reply
#[derive(Debug, Clone, PartialEq)]
pub struct OpenMessageButtonResponse {
    pub header: OpenMessageHeader,
    pub button_response: ButtonResponseContent,
    pub originating_message_id: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ButtonResponseWire {
    #[serde(flatten)]
    header: OpenMessageHeader,
    button_response: Value,
    #[serde(default)]
    originating_message_id: String,
}

impl OpenMessageButtonResponse {
    pub(crate) fn encode(&self) -> CodecResult<Value> {
        let wire = ButtonResponseWire {
            header: self.header.clone(),
            button_response: self
                .button_response
                .encode_payload()
                .map_err(CodecError::marshal)?,
            originating_message_id: self.originating_message_id.clone(),
        };
        envelope_to_value("ButtonResponse", &wire)
    }

    pub(crate) fn decode(value: Value, config: &CodecConfig) -> CodecResult<Self> {
        let wire: ButtonResponseWire = envelope_from_value(value)?;
        Ok(Self {
            header: wire.header,
            button_response: ButtonResponseContent::decode_payload(wire.button_response, config)
                .map_err(CodecError::unmarshal)?,
            originating_message_id: wire.originating_message_id,
        })
    }
}

impl Redact for OpenMessageButtonResponse {
    fn redact_with(&self, config: &CodecConfig) -> Self {
        let mut button_response = self.button_response.clone();
        if config.redact_message_text {
            button_response.text = redact_non_empty(&button_response.text);
        }
        button_response.payload = redact_non_empty(&button_response.payload);
        Self {
            header: self.header.redact_with(config),
            button_response,
            originating_message_id: self.originating_message_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use crate::{
        codec::{Decode, Encode},
        config::UnmarshalMode,
        openmessaging::{Direction, OpenMessageChannel, OpenMessageFrom, OpenMessageTo},
        protocol::content::{ButtonType, QuickReplyContent, TextContent},
    };

    use super::*;

    fn header() -> OpenMessageHeader {
        let channel = OpenMessageChannel::new(
            OpenMessageFrom::new("abcdef12345"),
            OpenMessageTo::new("edce4efa"),
            Utc.with_ymd_and_hms(2021, 4, 9, 4, 43, 33).unwrap(),
        );
        OpenMessageHeader::new(channel, Direction::Outbound).with_id("msg-1")
    }

    fn nested(levels: usize) -> OpenMessageText {
        let mut message = OpenMessageText::new(header(), "leaf");
        for _ in 0..levels {
            message = OpenMessageText::new(header(), "parent").with_related(OpenMessage::Text(message));
        }
        message
    }

    #[test]
    fn test_structured_message_round_trip() {
        let message = OpenMessage::Structured(
            OpenMessageText::new(header(), "Do you want to proceed?")
                .with_content(QuickReplyContent::new("Yes", "Yes").with_action("Message"))
                .with_content(QuickReplyContent::new("No", "No").with_action("Message")),
        );
        let value = message.to_value().unwrap();
        assert_eq!(value["type"], "Structured");
        assert_eq!(value["direction"], "Outbound");
        assert_eq!(value["content"][1]["quickReply"]["text"], "No");
        assert_eq!(OpenMessage::from_value(value).unwrap(), message);
    }

    #[test]
    fn test_unknown_content_follows_unmarshal_mode() {
        let mut value = OpenMessage::Text(OpenMessageText::new(header(), "hi")).to_value().unwrap();
        value["content"] = json!([
            {"contentType": "Reaction", "reaction": {"type": "Like"}},
            {"contentType": "Text", "text": {"body": "kept"}}
        ]);

        let strict = CodecConfig::default();
        assert!(OpenMessage::from_value_with(value.clone(), &strict)
            .unwrap_err()
            .is_invalid_type());

        let lenient = strict.with_unmarshal_mode(UnmarshalMode::IgnoreUnknownKeys);
        match OpenMessage::from_value_with(value, &lenient).unwrap() {
            OpenMessage::Text(message) => {
                assert_eq!(message.content, vec![Content::from(TextContent::new("kept"))])
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_related_messages_depth() {
        let message = OpenMessage::Text(nested(MAX_RELATED_DEPTH));
        let value = message.to_value().unwrap();
        assert_eq!(OpenMessage::from_value(value.clone()).unwrap(), message);

        let mut deeper = value;
        let mut cursor = &mut deeper;
        for _ in 0..MAX_RELATED_DEPTH {
            cursor = &mut cursor["relatedMessages"][0];
        }
        let channel = cursor["channel"].clone();
        cursor["relatedMessages"] = json!([{"type": "Text", "channel": channel, "text": "too deep"}]);
        let err = OpenMessage::from_value(deeper).unwrap_err();
        assert!(err.is_json_unmarshal());
        assert!(err.is_argument_invalid());

        let err = OpenMessage::Text(nested(MAX_RELATED_DEPTH + 1)).to_value().unwrap_err();
        assert!(err.is_json_marshal());
    }

    #[test]
    fn test_button_response() {
        let payload = json!({
            "type": "ButtonResponse",
            "channel": {
                "platform": "Open",
                "type": "Private",
                "from": {"id": "abcdef12345"},
                "time": "2021-04-09T04:43:33Z"
            },
            "direction": "Inbound",
            "buttonResponse": {"type": "QuickReply", "text": "Yes", "payload": "yes-please"},
            "originatingMessageId": "f2b6d5e7"
        });
        let message = OpenMessage::from_value(payload.clone()).unwrap();
        let OpenMessage::ButtonResponse(response) = &message else {
            panic!("unexpected message: {message:?}");
        };
        assert_eq!(response.button_response.button_type, Some(ButtonType::QuickReply));
        assert_eq!(message.to_value().unwrap(), payload);

        let redacted = response.redact_with(&CodecConfig::default().with_redact_message_text(false));
        assert_eq!(redacted.button_response.text, "Yes");
        assert!(redacted.button_response.payload.starts_with("REDACTED-"));
    }
}
