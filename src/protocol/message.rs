//! Normalized message, the platform's canonical typed message

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    codec::{serde_via_codec, Decode, Encode},
    config::CodecConfig,
};

use super::{
    content::Content,
    error::{CodecError, CodecResult, MultiError},
    redact::{redact_non_empty, Redact},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Text,
    Structured,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "Text",
            MessageType::Structured => "Structured",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `Text` message or a `Structured` message with content elements
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMessage {
    pub message_type: MessageType,
    pub text: String,
    pub content: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct NormalizedMessageWire {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    message_type: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    content: Vec<Value>,
}

impl NormalizedMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            message_type: MessageType::Text,
            text: text.into(),
            content: Vec::new(),
        }
    }

    pub fn structured(content: Vec<Content>) -> Self {
        Self {
            message_type: MessageType::Structured,
            text: String::new(),
            content,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn validate(&self) -> CodecResult<()> {
        check(Some(self.message_type.as_str()), &self.text, self.content.len()).into_result()
    }
}

fn check(message_type: Option<&str>, text: &str, content_len: usize) -> MultiError {
    let mut merr = MultiError::new();
    match message_type {
        None | Some("") => merr.push(CodecError::missing("inputMessage.type")),
        Some("Text") if text.is_empty() => merr.push(CodecError::missing("inputMessage.text")),
        Some("Structured") if content_len == 0 => {
            merr.push(CodecError::missing("inputMessage.content"))
        }
        Some("Text") | Some("Structured") => {}
        Some(other) => merr.push(CodecError::invalid(
            "inputMessage.type",
            other,
            "Text, Structured",
        )),
    }
    merr
}

impl Encode for NormalizedMessage {
    fn to_value(&self) -> CodecResult<Value> {
        self.validate().map_err(CodecError::marshal)?;
        let wire = NormalizedMessageWire {
            message_type: Some(self.message_type.to_string()),
            text: self.text.clone(),
            content: Content::encode_list(&self.content)?,
        };
        serde_json::to_value(wire).map_err(CodecError::marshal)
    }
}

impl Decode for NormalizedMessage {
    fn from_value_with(value: Value, config: &CodecConfig) -> CodecResult<Self> {
        let wire: NormalizedMessageWire =
            serde_json::from_value(value).map_err(CodecError::unmarshal)?;
        let content = Content::decode_list(wire.content, config)?;

        check(wire.message_type.as_deref(), &wire.text, content.len())
            .into_result()
            .map_err(CodecError::unmarshal)?;

        let message_type = match wire.message_type.as_deref() {
            Some("Structured") => MessageType::Structured,
            _ => MessageType::Text,
        };
        Ok(Self {
            message_type,
            text: wire.text,
            content,
        })
    }
}

serde_via_codec!(NormalizedMessage);

impl Redact for NormalizedMessage {
    fn redact_with(&self, config: &CodecConfig) -> Self {
        Self {
            message_type: self.message_type,
            text: if config.redact_message_text {
                redact_non_empty(&self.text)
            } else {
                self.text.clone()
            },
            content: self.content.iter().map(|c| c.redact_with(config)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        config::UnmarshalMode,
        protocol::content::{QuickReplyContent, TextContent},
    };

    use super::*;

    #[test]
    fn test_quick_replies_payload() {
        let message = NormalizedMessage::structured(vec![
            QuickReplyContent::new("Yes", "Yes").with_action("Message").into(),
            QuickReplyContent::new("No", "No").with_action("Message").into(),
        ])
        .with_text("Do you want to proceed?");

        let value = message.to_value().unwrap();
        assert_eq!(
            value,
            json!({
                "type": "Structured",
                "text": "Do you want to proceed?",
                "content": [
                    {"contentType": "QuickReply", "quickReply": {"text": "Yes", "payload": "Yes", "action": "Message"}},
                    {"contentType": "QuickReply", "quickReply": {"text": "No", "payload": "No", "action": "Message"}}
                ]
            })
        );
        assert_eq!(NormalizedMessage::from_value(value).unwrap(), message);
    }

    #[test]
    fn test_validation_collects_faults() {
        let err = NormalizedMessage::from_value_with(json!({"type": "Text"}), &CodecConfig::default())
            .unwrap_err();
        assert!(err.is_json_unmarshal());
        assert_eq!(err.missing_argument(), Some("inputMessage.text"));

        let err = NormalizedMessage::from_value_with(json!({"text": "hi"}), &CodecConfig::default())
            .unwrap_err();
        assert_eq!(err.missing_argument(), Some("inputMessage.type"));

        let err = NormalizedMessage::from_value_with(
            json!({"type": "Voice", "text": "hi"}),
            &CodecConfig::default(),
        )
        .unwrap_err();
        assert!(err.is_argument_invalid());

        let err = NormalizedMessage::structured(vec![]).to_value().unwrap_err();
        assert!(err.is_json_marshal());
        assert_eq!(err.missing_argument(), Some("inputMessage.content"));
    }

    #[test]
    fn test_unknown_content_in_lenient_mode() {
        let value = json!({
            "type": "Structured",
            "content": [
                {"contentType": "Reaction", "reaction": {}},
                {"contentType": "Text", "text": {"body": "kept"}}
            ]
        });
        let strict = CodecConfig::default();
        assert!(NormalizedMessage::from_value_with(value.clone(), &strict)
            .unwrap_err()
            .is_invalid_type());

        let lenient = strict.with_unmarshal_mode(UnmarshalMode::IgnoreUnknownKeys);
        let message = NormalizedMessage::from_value_with(value, &lenient).unwrap();
        assert_eq!(message.content, vec![Content::from(TextContent::new("kept"))]);
    }

    #[test]
    fn test_redact_text() {
        let message = NormalizedMessage::text("my card number is 4111");
        let redacted = message.redact_with(&CodecConfig::default());
        assert!(redacted.text.starts_with("REDACTED-"));
        assert_eq!(message.text, "my card number is 4111");
    }
}
