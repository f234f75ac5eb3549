//! Notification (message template) content

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::{
    config::CodecConfig,
    protocol::error::{CodecError, CodecResult},
};

use super::{attachment::AttachmentContent, payload_from_value, payload_to_value, ContentVariant};

/// Template parameters, an array of `{name, text}` on the wire
mod parameters {
    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Parameter {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        name: String,
        #[serde(default)]
        text: String,
    }

    pub fn serialize<S: Serializer>(
        parameters: &BTreeMap<String, String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        parameters
            .iter()
            .map(|(name, text)| Parameter {
                name: name.clone(),
                text: text.clone(),
            })
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, String>, D::Error> {
        let values = Option::<Vec<Parameter>>::deserialize(deserializer)?;
        Ok(values
            .unwrap_or_default()
            .into_iter()
            .map(|parameter| (parameter.name, parameter.text))
            .collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderType {
    Text,
    Media,
}

impl fmt::Display for HeaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderType::Text => f.write_str("Text"),
            HeaderType::Media => f.write_str("Media"),
        }
    }
}

impl FromStr for HeaderType {
    type Err = CodecError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Text" => Ok(HeaderType::Text),
            "Media" => Ok(HeaderType::Media),
            other => Err(CodecError::invalid_type(other, &["Media", "Text"])),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationHeader {
    pub header_type: HeaderType,
    pub text: Option<String>,
    pub media: Option<AttachmentContent>,
    pub parameters: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize)]
struct HeaderWire {
    #[serde(rename = "type", default)]
    header_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    media: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", with = "parameters")]
    parameters: BTreeMap<String, String>,
}

impl NotificationHeader {
    fn to_wire(&self) -> CodecResult<HeaderWire> {
        Ok(HeaderWire {
            header_type: self.header_type.to_string(),
            text: self.text.clone(),
            media: self.media.as_ref().map(AttachmentContent::payload).transpose()?,
            parameters: self.parameters.clone(),
        })
    }

    fn from_wire(wire: HeaderWire) -> CodecResult<Self> {
        Ok(Self {
            header_type: wire.header_type.parse()?,
            text: wire.text,
            media: wire.media.map(AttachmentContent::from_payload).transpose()?,
            parameters: wire.parameters,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationBody {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", with = "parameters")]
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationFooter {
    #[serde(default)]
    pub text: String,
}

/// A pre-approved message template
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationContent {
    pub id: Option<String>,
    pub language: String,
    pub header: Option<NotificationHeader>,
    pub body: NotificationBody,
    pub footer: Option<NotificationFooter>,
    pub text: String,
}

#[derive(Serialize, Deserialize)]
struct NotificationWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default)]
    language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    header: Option<HeaderWire>,
    #[serde(default)]
    body: NotificationBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    footer: Option<NotificationFooter>,
    #[serde(default)]
    text: String,
}

impl ContentVariant for NotificationContent {
    const CONTENT_TYPE: &'static str = "Notification";
    const KEY: &'static str = "template";

    fn encode_payload(&self) -> CodecResult<Value> {
        payload_to_value(&NotificationWire {
            id: self.id.clone(),
            language: self.language.clone(),
            header: self
                .header
                .as_ref()
                .map(NotificationHeader::to_wire)
                .transpose()?,
            body: self.body.clone(),
            footer: self.footer.clone(),
            text: self.text.clone(),
        })
    }

    fn decode_payload(payload: Value, _config: &CodecConfig) -> CodecResult<Self> {
        let wire: NotificationWire = payload_from_value(payload)?;
        Ok(Self {
            id: wire.id,
            language: wire.language,
            header: wire.header.map(NotificationHeader::from_wire).transpose()?,
            body: wire.body,
            footer: wire.footer,
            text: wire.text,
        })
    }

    fn validate(&self) -> CodecResult<()> {
        if self.language.is_empty() {
            return Err(CodecError::missing("language"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use url::Url;

    use crate::protocol::content::MediaType;

    use super::*;

    #[test]
    fn test_parameters_travel_as_array() {
        let notification = NotificationContent {
            language: "en-US".to_string(),
            body: NotificationBody {
                text: "Hello {{1}}, your order {{2}} shipped".to_string(),
                parameters: BTreeMap::from([
                    ("1".to_string(), "Bob".to_string()),
                    ("2".to_string(), "#42".to_string()),
                ]),
            },
            text: "Hello Bob, your order #42 shipped".to_string(),
            ..NotificationContent::default()
        };
        let value = notification.to_content_value().unwrap();
        assert_eq!(value["contentType"], "Notification");
        assert_eq!(
            value["template"]["body"]["parameters"],
            json!([{"name": "1", "text": "Bob"}, {"name": "2", "text": "#42"}])
        );
        let decoded = NotificationContent::from_content_value(value, &CodecConfig::default()).unwrap();
        assert_eq!(decoded, notification);
    }

    #[test]
    fn test_media_header() {
        let header = NotificationHeader {
            header_type: HeaderType::Media,
            text: None,
            media: Some(AttachmentContent::new(
                MediaType::Image,
                Url::parse("https://www.acme.com/banner.png").ok(),
            )),
            parameters: BTreeMap::new(),
        };
        let notification = NotificationContent {
            language: "fr-FR".to_string(),
            header: Some(header),
            footer: Some(NotificationFooter {
                text: "Acme".to_string(),
            }),
            ..NotificationContent::default()
        };
        let value = notification.to_content_value().unwrap();
        assert_eq!(value["template"]["header"]["media"]["mediaType"], "Image");
        let decoded = NotificationContent::from_content_value(value, &CodecConfig::default()).unwrap();
        assert_eq!(decoded, notification);
    }

    #[test]
    fn test_language_is_required() {
        let err = NotificationContent::default().to_content_value().unwrap_err();
        assert_eq!(err.missing_argument(), Some("language"));
    }
}
