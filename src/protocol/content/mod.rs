//! Normalized message content variants
//!
//! Every content element is an object `{"contentType": <type>, <key>: {...}}`
//! where `<key>` depends on the variant (`text`, `attachment`, `card`, ...).
//! The open messaging API uses the exact same shapes, so both envelopes share
//! this family.

pub mod attachment;
pub mod card;
pub mod datepicker;
pub mod location;
pub mod notification;
pub mod reply;

use std::sync::OnceLock;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

pub use attachment::{AttachmentContent, MediaDescriptor, MediaType};
pub use card::{CardAction, CardContent, CarouselContent, LinkAction, PostbackAction};
pub use datepicker::{AvailableTime, DatePickerContent};
pub use location::{LocationContent, StoryContent, StoryType};
pub use notification::{
    HeaderType, NotificationBody, NotificationContent, NotificationFooter, NotificationHeader,
};
pub use reply::{
    ButtonResponseContent, ButtonType, QuickReplyAction, QuickReplyContent, QuickReplyV2Content,
};

use crate::{
    codec::{serde_via_codec, Decode, Encode},
    config::CodecConfig,
};

use super::{
    error::{CodecError, CodecResult},
    redact::{redact_non_empty, Redact},
    registry::TypeRegistry,
};

/// Wire contract of one content variant
pub trait ContentVariant: Sized {
    /// Value of `contentType`
    const CONTENT_TYPE: &'static str;

    /// Name of the key holding the variant payload
    const KEY: &'static str;

    fn encode_payload(&self) -> CodecResult<Value>;

    fn decode_payload(payload: Value, config: &CodecConfig) -> CodecResult<Self>;

    /// Structural checks, run before encoding and after decoding
    fn validate(&self) -> CodecResult<()> {
        Ok(())
    }

    /// Encode as a complete content element
    fn to_content_value(&self) -> CodecResult<Value> {
        self.validate().map_err(CodecError::marshal)?;
        let mut object = Map::new();
        object.insert("contentType".to_string(), Value::from(Self::CONTENT_TYPE));
        object.insert(
            Self::KEY.to_string(),
            self.encode_payload().map_err(CodecError::marshal)?,
        );
        Ok(Value::Object(object))
    }

    /// Decode a complete content element of this exact variant
    fn from_content_value(mut value: Value, config: &CodecConfig) -> CodecResult<Self> {
        match value.get("contentType").and_then(Value::as_str) {
            Some(content_type) if content_type == Self::CONTENT_TYPE => {}
            Some(content_type) => {
                return Err(CodecError::unmarshal(CodecError::invalid_type(
                    content_type,
                    &[Self::CONTENT_TYPE],
                )))
            }
            None => return Err(CodecError::unmarshal(CodecError::missing("contentType"))),
        }
        let payload = value
            .get_mut(Self::KEY)
            .map(Value::take)
            .ok_or_else(|| CodecError::unmarshal(CodecError::missing(Self::KEY)))?;
        let variant = Self::decode_payload(payload, config).map_err(CodecError::unmarshal)?;
        variant.validate().map_err(CodecError::unmarshal)?;
        Ok(variant)
    }
}

pub(crate) fn payload_to_value<T: Serialize>(payload: &T) -> CodecResult<Value> {
    Ok(serde_json::to_value(payload)?)
}

pub(crate) fn payload_from_value<T: DeserializeOwned>(payload: Value) -> CodecResult<T> {
    Ok(serde_json::from_value(payload)?)
}

/// Plain text content, `{"text": {"body": ...}}`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub body: String,
}

impl TextContent {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

impl ContentVariant for TextContent {
    const CONTENT_TYPE: &'static str = "Text";
    const KEY: &'static str = "text";

    fn encode_payload(&self) -> CodecResult<Value> {
        payload_to_value(self)
    }

    fn decode_payload(payload: Value, _config: &CodecConfig) -> CodecResult<Self> {
        payload_from_value(payload)
    }
}

/// One element of a message content list
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(TextContent),
    Attachment(AttachmentContent),
    Card(CardContent),
    Carousel(CarouselContent),
    QuickReply(QuickReplyContent),
    QuickReplyV2(QuickReplyV2Content),
    DatePicker(DatePickerContent),
    Location(LocationContent),
    Story(StoryContent),
    Notification(NotificationContent),
    ButtonResponse(ButtonResponseContent),
}

fn decode_as<V>(value: Value, config: &CodecConfig) -> CodecResult<Content>
where
    V: ContentVariant + Into<Content>,
{
    V::from_content_value(value, config).map(Into::into)
}

fn registry() -> &'static TypeRegistry<Content> {
    static REGISTRY: OnceLock<TypeRegistry<Content>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        TypeRegistry::new("content", "contentType")
            .with(TextContent::CONTENT_TYPE, decode_as::<TextContent>)
            .with(AttachmentContent::CONTENT_TYPE, decode_as::<AttachmentContent>)
            .with(CardContent::CONTENT_TYPE, decode_as::<CardContent>)
            .with(CarouselContent::CONTENT_TYPE, decode_as::<CarouselContent>)
            .with(QuickReplyContent::CONTENT_TYPE, decode_as::<QuickReplyContent>)
            .with(QuickReplyV2Content::CONTENT_TYPE, decode_as::<QuickReplyV2Content>)
            .with(DatePickerContent::CONTENT_TYPE, decode_as::<DatePickerContent>)
            .with(LocationContent::CONTENT_TYPE, decode_as::<LocationContent>)
            .with(StoryContent::CONTENT_TYPE, decode_as::<StoryContent>)
            .with(NotificationContent::CONTENT_TYPE, decode_as::<NotificationContent>)
            .with(ButtonResponseContent::CONTENT_TYPE, decode_as::<ButtonResponseContent>)
    })
}

impl Content {
    /// The `contentType` discriminator of this element
    pub fn content_type(&self) -> &'static str {
        match self {
            Content::Text(_) => TextContent::CONTENT_TYPE,
            Content::Attachment(_) => AttachmentContent::CONTENT_TYPE,
            Content::Card(_) => CardContent::CONTENT_TYPE,
            Content::Carousel(_) => CarouselContent::CONTENT_TYPE,
            Content::QuickReply(_) => QuickReplyContent::CONTENT_TYPE,
            Content::QuickReplyV2(_) => QuickReplyV2Content::CONTENT_TYPE,
            Content::DatePicker(_) => DatePickerContent::CONTENT_TYPE,
            Content::Location(_) => LocationContent::CONTENT_TYPE,
            Content::Story(_) => StoryContent::CONTENT_TYPE,
            Content::Notification(_) => NotificationContent::CONTENT_TYPE,
            Content::ButtonResponse(_) => ButtonResponseContent::CONTENT_TYPE,
        }
    }

    /// Discriminators known to the content registry
    pub fn supported_types() -> Vec<&'static str> {
        registry().supported_types()
    }

    /// Decode a content list, honouring the configured unmarshal mode
    pub fn decode_list(values: Vec<Value>, config: &CodecConfig) -> CodecResult<Vec<Content>> {
        registry().unmarshal_list(values, config)
    }

    /// Encode a content list
    pub fn encode_list(contents: &[Content]) -> CodecResult<Vec<Value>> {
        contents.iter().map(Encode::to_value).collect()
    }

    pub fn validate(&self) -> CodecResult<()> {
        match self {
            Content::Text(content) => content.validate(),
            Content::Attachment(content) => content.validate(),
            Content::Card(content) => content.validate(),
            Content::Carousel(content) => content.validate(),
            Content::QuickReply(content) => content.validate(),
            Content::QuickReplyV2(content) => content.validate(),
            Content::DatePicker(content) => content.validate(),
            Content::Location(content) => content.validate(),
            Content::Story(content) => content.validate(),
            Content::Notification(content) => content.validate(),
            Content::ButtonResponse(content) => content.validate(),
        }
    }

    pub fn as_button_response(&self) -> Option<&ButtonResponseContent> {
        match self {
            Content::ButtonResponse(content) => Some(content),
            _ => None,
        }
    }
}

impl Encode for Content {
    fn to_value(&self) -> CodecResult<Value> {
        match self {
            Content::Text(content) => content.to_content_value(),
            Content::Attachment(content) => content.to_content_value(),
            Content::Card(content) => content.to_content_value(),
            Content::Carousel(content) => content.to_content_value(),
            Content::QuickReply(content) => content.to_content_value(),
            Content::QuickReplyV2(content) => content.to_content_value(),
            Content::DatePicker(content) => content.to_content_value(),
            Content::Location(content) => content.to_content_value(),
            Content::Story(content) => content.to_content_value(),
            Content::Notification(content) => content.to_content_value(),
            Content::ButtonResponse(content) => content.to_content_value(),
        }
    }
}

impl Decode for Content {
    fn from_value_with(value: Value, config: &CodecConfig) -> CodecResult<Self> {
        registry().unmarshal(value, config)
    }
}

serde_via_codec!(Content);

impl Redact for Content {
    fn redact_with(&self, config: &CodecConfig) -> Self {
        match self {
            Content::Text(content) if config.redact_message_text => {
                Content::Text(TextContent::new(redact_non_empty(&content.body)))
            }
            Content::QuickReply(content) if config.redact_message_text => {
                let mut redacted = content.clone();
                redacted.text = redact_non_empty(&content.text);
                Content::QuickReply(redacted)
            }
            Content::ButtonResponse(content) => {
                let mut redacted = content.clone();
                if config.redact_message_text {
                    redacted.text = redact_non_empty(&content.text);
                }
                redacted.payload = redact_non_empty(&content.payload);
                Content::ButtonResponse(redacted)
            }
            other => other.clone(),
        }
    }
}

macro_rules! content_from {
    ($($variant:ident($ty:ty)),+ $(,)?) => {
        $(
            impl From<$ty> for Content {
                fn from(content: $ty) -> Self {
                    Content::$variant(content)
                }
            }
        )+
    };
}

content_from!(
    Text(TextContent),
    Attachment(AttachmentContent),
    Card(CardContent),
    Carousel(CarouselContent),
    QuickReply(QuickReplyContent),
    QuickReplyV2(QuickReplyV2Content),
    DatePicker(DatePickerContent),
    Location(LocationContent),
    Story(StoryContent),
    Notification(NotificationContent),
    ButtonResponse(ButtonResponseContent),
);
