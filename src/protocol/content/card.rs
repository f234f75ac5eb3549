//! Card and carousel content, with their actions

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;

use crate::{
    codec::{serde_via_codec, Decode, Encode},
    config::CodecConfig,
    protocol::{
        error::{CodecError, CodecResult, MultiError},
        registry::TypeRegistry,
    },
};

use super::{payload_from_value, payload_to_value, ContentVariant};

/// Opens a URL when selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAction {
    pub text: String,
    pub url: Option<Url>,
}

/// Sends a payload back when selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostbackAction {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub payload: String,
}

/// Action attached to a card, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardAction {
    Link(LinkAction),
    Postback(PostbackAction),
}

#[derive(Serialize, Deserialize)]
struct LinkWire {
    #[serde(default)]
    text: String,
    #[serde(default, with = "crate::protocol::scalar::url_opt")]
    url: Option<Url>,
}

impl CardAction {
    pub fn link(text: impl Into<String>, url: Url) -> Self {
        CardAction::Link(LinkAction {
            text: text.into(),
            url: Some(url),
        })
    }

    pub fn postback(text: impl Into<String>, payload: impl Into<String>) -> Self {
        CardAction::Postback(PostbackAction {
            text: text.into(),
            payload: payload.into(),
        })
    }

    pub fn action_type(&self) -> &'static str {
        match self {
            CardAction::Link(_) => "Link",
            CardAction::Postback(_) => "Postback",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            CardAction::Link(action) => &action.text,
            CardAction::Postback(action) => &action.text,
        }
    }

    pub fn validate(&self) -> CodecResult<()> {
        let mut merr = MultiError::new();
        if self.text().is_empty() {
            merr.push(CodecError::missing("text"));
        }
        if let CardAction::Link(LinkAction { url: None, .. }) = self {
            merr.push(CodecError::missing("url"));
        }
        merr.into_result()
    }
}

fn action_registry() -> &'static TypeRegistry<CardAction> {
    static REGISTRY: OnceLock<TypeRegistry<CardAction>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        TypeRegistry::new("card action", "type")
            .with("Link", |value, _| {
                let wire: LinkWire = payload_from_value(value)?;
                Ok(CardAction::Link(LinkAction {
                    text: wire.text,
                    url: wire.url,
                }))
            })
            .with("Postback", |value, _| {
                payload_from_value(value).map(CardAction::Postback)
            })
    })
}

impl Encode for CardAction {
    fn to_value(&self) -> CodecResult<Value> {
        self.validate().map_err(CodecError::marshal)?;
        let value = match self {
            CardAction::Link(action) => json!({
                "type": self.action_type(),
                "text": action.text,
                "url": action.url.as_ref().map(Url::as_str),
            }),
            CardAction::Postback(action) => json!({
                "type": self.action_type(),
                "text": action.text,
                "payload": action.payload,
            }),
        };
        Ok(value)
    }
}

impl Decode for CardAction {
    fn from_value_with(value: Value, config: &CodecConfig) -> CodecResult<Self> {
        let action = action_registry().unmarshal(value, config)?;
        action.validate().map_err(CodecError::unmarshal)?;
        Ok(action)
    }
}

serde_via_codec!(CardAction);

/// A card with a title, media and actions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardContent {
    pub title: String,
    pub description: Option<String>,
    pub image: Option<Url>,
    pub video: Option<Url>,
    pub default_action: Option<CardAction>,
    pub actions: Vec<CardAction>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardWire {
    #[serde(default)]
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::protocol::scalar::url_opt"
    )]
    image: Option<Url>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::protocol::scalar::url_opt"
    )]
    video: Option<Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_action: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    actions: Vec<Value>,
}

impl CardContent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image(mut self, image: Url) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_video(mut self, video: Url) -> Self {
        self.video = Some(video);
        self
    }

    pub fn with_default_action(mut self, action: CardAction) -> Self {
        self.default_action = Some(action);
        self
    }

    pub fn with_action(mut self, action: CardAction) -> Self {
        self.actions.push(action);
        self
    }

    fn to_wire(&self) -> CodecResult<CardWire> {
        Ok(CardWire {
            title: self.title.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            video: self.video.clone(),
            default_action: self
                .default_action
                .as_ref()
                .map(Encode::to_value)
                .transpose()?,
            actions: self
                .actions
                .iter()
                .map(Encode::to_value)
                .collect::<CodecResult<_>>()?,
        })
    }

    fn from_wire(wire: CardWire, config: &CodecConfig) -> CodecResult<Self> {
        Ok(Self {
            title: wire.title,
            description: wire.description,
            image: wire.image,
            video: wire.video,
            default_action: wire
                .default_action
                .map(|value| CardAction::from_value_with(value, config))
                .transpose()?,
            actions: wire
                .actions
                .into_iter()
                .map(|value| CardAction::from_value_with(value, config))
                .collect::<CodecResult<_>>()?,
        })
    }
}

impl ContentVariant for CardContent {
    const CONTENT_TYPE: &'static str = "Card";
    const KEY: &'static str = "card";

    fn encode_payload(&self) -> CodecResult<Value> {
        payload_to_value(&self.to_wire()?)
    }

    fn decode_payload(payload: Value, config: &CodecConfig) -> CodecResult<Self> {
        Self::from_wire(payload_from_value(payload)?, config)
    }
}

/// An ordered sequence of cards
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CarouselContent {
    pub cards: Vec<CardContent>,
}

#[derive(Serialize, Deserialize)]
struct CarouselWire {
    #[serde(default)]
    cards: Vec<CardWire>,
}

impl CarouselContent {
    pub fn new(cards: Vec<CardContent>) -> Self {
        Self { cards }
    }
}

impl ContentVariant for CarouselContent {
    const CONTENT_TYPE: &'static str = "Carousel";
    const KEY: &'static str = "carousel";

    fn encode_payload(&self) -> CodecResult<Value> {
        let cards = self
            .cards
            .iter()
            .map(CardContent::to_wire)
            .collect::<CodecResult<_>>()?;
        payload_to_value(&CarouselWire { cards })
    }

    fn decode_payload(payload: Value, config: &CodecConfig) -> CodecResult<Self> {
        let wire: CarouselWire = payload_from_value(payload)?;
        let cards = wire
            .cards
            .into_iter()
            .map(|card| CardContent::from_wire(card, config))
            .collect::<CodecResult<_>>()?;
        Ok(Self { cards })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(text: &str) -> Url {
        Url::parse(text).unwrap()
    }

    #[test]
    fn test_action_wire_shapes() {
        let link = CardAction::link("Option3", url("https://www.acme.com/option3"));
        assert_eq!(
            link.to_value().unwrap(),
            json!({"type": "Link", "text": "Option3", "url": "https://www.acme.com/option3"})
        );
        let postback = CardAction::postback("Option1", "Option1");
        assert_eq!(
            postback.to_value().unwrap(),
            json!({"type": "Postback", "text": "Option1", "payload": "Option1"})
        );
    }

    #[test]
    fn test_link_action_requires_url() {
        let action = CardAction::Link(LinkAction {
            text: "Go".to_string(),
            url: None,
        });
        let err = action.to_value().unwrap_err();
        assert!(err.is_json_marshal());
        assert_eq!(err.missing_argument(), Some("url"));

        let err = CardAction::from_value_with(
            json!({"type": "Link", "text": "Go"}),
            &CodecConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.missing_argument(), Some("url"));
    }

    #[test]
    fn test_postback_action_requires_text() {
        let err = CardAction::from_value_with(
            json!({"type": "Postback", "payload": "x"}),
            &CodecConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.missing_argument(), Some("text"));
    }

    #[test]
    fn test_unknown_action_type() {
        let err = CardAction::from_value_with(json!({"type": "Call"}), &CodecConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("Link,Postback"));
    }

    #[test]
    fn test_card_omits_absent_media() {
        let card = CardContent::new("Card 1")
            .with_description("Description 1")
            .with_image(url("https://www.acme.com/image1.png"))
            .with_action(CardAction::postback("Option1", "Option1"));
        assert_eq!(
            card.to_content_value().unwrap(),
            json!({
                "contentType": "Card",
                "card": {
                    "title": "Card 1",
                    "description": "Description 1",
                    "image": "https://www.acme.com/image1.png",
                    "actions": [{"type": "Postback", "text": "Option1", "payload": "Option1"}]
                }
            })
        );
    }

    #[test]
    fn test_carousel_preserves_order() {
        let carousel = CarouselContent::new(vec![
            CardContent::new("Card 1"),
            CardContent::new("Card 2")
                .with_default_action(CardAction::link("Visit", url("https://www.acme.com"))),
            CardContent::new("Card 3").with_video(url("https://www.acme.com/video3.mp4")),
        ]);
        let value = carousel.to_content_value().unwrap();
        let decoded = CarouselContent::from_content_value(value, &CodecConfig::default()).unwrap();
        let titles: Vec<_> = decoded.cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Card 1", "Card 2", "Card 3"]);
        assert_eq!(decoded, carousel);
    }
}
