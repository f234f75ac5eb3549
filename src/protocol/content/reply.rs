//! Quick replies and the button responses they produce

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::{
    config::CodecConfig,
    protocol::error::{CodecError, CodecResult},
};

use super::{payload_from_value, payload_to_value, ContentVariant};

/// A single quick reply button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReplyContent {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub payload: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::protocol::scalar::url_opt"
    )]
    pub image: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl QuickReplyContent {
    pub fn new(text: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            payload: payload.into(),
            image: None,
            action: None,
        }
    }

    /// Set the action, the platform only knows `Message`
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_image(mut self, image: Url) -> Self {
        self.image = Some(image);
        self
    }
}

impl ContentVariant for QuickReplyContent {
    const CONTENT_TYPE: &'static str = "QuickReply";
    const KEY: &'static str = "quickReply";

    fn encode_payload(&self) -> CodecResult<Value> {
        payload_to_value(self)
    }

    fn decode_payload(payload: Value, _config: &CodecConfig) -> CodecResult<Self> {
        payload_from_value(payload)
    }

    fn validate(&self) -> CodecResult<()> {
        if self.text.is_empty() {
            return Err(CodecError::missing("text"));
        }
        Ok(())
    }
}

/// One button of a [`QuickReplyV2Content`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReplyAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub payload: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::protocol::scalar::url_opt"
    )]
    pub image: Option<Url>,
}

impl QuickReplyAction {
    pub fn new(text: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            action: None,
            text: text.into(),
            payload: payload.into(),
            image: None,
        }
    }
}

/// A titled group of quick replies
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuickReplyV2Content {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub actions: Vec<QuickReplyAction>,
}

impl QuickReplyV2Content {
    pub fn new(title: impl Into<String>, actions: Vec<QuickReplyAction>) -> Self {
        Self {
            title: title.into(),
            actions,
        }
    }
}

impl ContentVariant for QuickReplyV2Content {
    const CONTENT_TYPE: &'static str = "QuickReplyV2";
    const KEY: &'static str = "quickReplyV2";

    fn encode_payload(&self) -> CodecResult<Value> {
        payload_to_value(self)
    }

    fn decode_payload(payload: Value, _config: &CodecConfig) -> CodecResult<Self> {
        payload_from_value(payload)
    }
}

/// What produced a button response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonType {
    Button,
    QuickReply,
}

impl ButtonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonType::Button => "Button",
            ButtonType::QuickReply => "QuickReply",
        }
    }
}

impl fmt::Display for ButtonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ButtonType {
    type Err = CodecError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Button" => Ok(ButtonType::Button),
            "QuickReply" => Ok(ButtonType::QuickReply),
            other => Err(CodecError::invalid_type(other, &["Button", "QuickReply"])),
        }
    }
}

/// The customer selected a button or quick reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonResponseContent {
    pub button_type: Option<ButtonType>,
    pub text: String,
    pub payload: String,
}

#[derive(Serialize, Deserialize)]
struct ButtonResponseWire {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    button_type: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    payload: String,
}

impl ButtonResponseContent {
    pub fn new(text: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            button_type: None,
            text: text.into(),
            payload: payload.into(),
        }
    }

    pub fn with_button_type(mut self, button_type: ButtonType) -> Self {
        self.button_type = Some(button_type);
        self
    }
}

impl ContentVariant for ButtonResponseContent {
    const CONTENT_TYPE: &'static str = "ButtonResponse";
    const KEY: &'static str = "buttonResponse";

    fn encode_payload(&self) -> CodecResult<Value> {
        payload_to_value(&ButtonResponseWire {
            button_type: self.button_type.map(|kind| kind.to_string()),
            text: self.text.clone(),
            payload: self.payload.clone(),
        })
    }

    fn decode_payload(payload: Value, _config: &CodecConfig) -> CodecResult<Self> {
        let wire: ButtonResponseWire = payload_from_value(payload)?;
        Ok(Self {
            button_type: wire.button_type.as_deref().map(str::parse).transpose()?,
            text: wire.text,
            payload: wire.payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_quick_reply_wire_shape() {
        let reply = QuickReplyContent::new("Yes", "Yes").with_action("Message");
        assert_eq!(
            reply.to_content_value().unwrap(),
            json!({
                "contentType": "QuickReply",
                "quickReply": {"text": "Yes", "payload": "Yes", "action": "Message"}
            })
        );
    }

    #[test]
    fn test_quick_reply_v2() {
        let content = QuickReplyV2Content::new(
            "Proceed?",
            vec![QuickReplyAction::new("Yes", "yes"), QuickReplyAction::new("No", "no")],
        );
        let value = content.to_content_value().unwrap();
        assert_eq!(value["quickReplyV2"]["actions"][1]["payload"], "no");
        let decoded = QuickReplyV2Content::from_content_value(value, &CodecConfig::default()).unwrap();
        assert_eq!(decoded, content);
    }

    #[test]
    fn test_button_response_type() {
        let response = ButtonResponseContent::new("Yes", "yes").with_button_type(ButtonType::QuickReply);
        let value = response.to_content_value().unwrap();
        assert_eq!(value["buttonResponse"]["type"], "QuickReply");

        let decoded = ButtonResponseContent::from_content_value(value, &CodecConfig::default()).unwrap();
        assert_eq!(decoded, response);

        let err = ButtonResponseContent::from_content_value(
            json!({"contentType": "ButtonResponse", "buttonResponse": {"type": "Slider", "text": "x", "payload": "x"}}),
            &CodecConfig::default(),
        )
        .unwrap_err();
        assert!(err.is_invalid_type());
    }
}
