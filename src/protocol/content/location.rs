//! Location and story content

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::{
    config::CodecConfig,
    protocol::error::{CodecError, CodecResult},
};

use super::{payload_from_value, payload_to_value, ContentVariant};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocationContent {
    #[serde(default)]
    pub text: String,
    #[serde(default, with = "crate::protocol::scalar::url_opt")]
    pub url: Option<Url>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

impl ContentVariant for LocationContent {
    const CONTENT_TYPE: &'static str = "Location";
    const KEY: &'static str = "location";

    fn encode_payload(&self) -> CodecResult<Value> {
        payload_to_value(self)
    }

    fn decode_payload(payload: Value, _config: &CodecConfig) -> CodecResult<Self> {
        payload_from_value(payload)
    }

    fn validate(&self) -> CodecResult<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CodecError::invalid("latitude", self.latitude, "-90..90"));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CodecError::invalid("longitude", self.longitude, "-180..180"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryType {
    Mention,
    Reply,
}

impl fmt::Display for StoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoryType::Mention => f.write_str("Mention"),
            StoryType::Reply => f.write_str("Reply"),
        }
    }
}

impl FromStr for StoryType {
    type Err = CodecError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Mention" => Ok(StoryType::Mention),
            "Reply" => Ok(StoryType::Reply),
            other => Err(CodecError::invalid_type(other, &["Mention", "Reply"])),
        }
    }
}

/// A mention of, or a reply to, a social media story
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryContent {
    pub story_type: StoryType,
    pub url: Option<Url>,
    pub reply_to_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoryWire {
    #[serde(rename = "type", default)]
    story_type: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::protocol::scalar::url_opt"
    )]
    url: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reply_to_id: Option<String>,
}

impl ContentVariant for StoryContent {
    const CONTENT_TYPE: &'static str = "Story";
    const KEY: &'static str = "story";

    fn encode_payload(&self) -> CodecResult<Value> {
        payload_to_value(&StoryWire {
            story_type: self.story_type.to_string(),
            url: self.url.clone(),
            reply_to_id: self.reply_to_id.clone(),
        })
    }

    fn decode_payload(payload: Value, _config: &CodecConfig) -> CodecResult<Self> {
        let wire: StoryWire = payload_from_value(payload)?;
        Ok(Self {
            story_type: wire.story_type.parse()?,
            url: wire.url,
            reply_to_id: wire.reply_to_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_location_keeps_null_url() {
        let location = LocationContent {
            text: "Head office".to_string(),
            url: None,
            address: "1 Acme Way".to_string(),
            latitude: 48.8566,
            longitude: 2.3522,
        };
        let value = location.to_content_value().unwrap();
        assert_eq!(value["location"]["url"], Value::Null);
        let decoded = LocationContent::from_content_value(value, &CodecConfig::default()).unwrap();
        assert_eq!(decoded, location);
    }

    #[test]
    fn test_location_coordinates_are_bounded() {
        let location = LocationContent {
            latitude: 120.0,
            ..LocationContent::default()
        };
        assert!(location.to_content_value().unwrap_err().is_argument_invalid());
    }

    #[test]
    fn test_story() {
        let value = json!({
            "contentType": "Story",
            "story": {"type": "Reply", "replyToId": "1234"}
        });
        let story = StoryContent::from_content_value(value.clone(), &CodecConfig::default()).unwrap();
        assert_eq!(story.story_type, StoryType::Reply);
        assert_eq!(story.reply_to_id.as_deref(), Some("1234"));
        assert_eq!(story.to_content_value().unwrap(), value);
    }
}
