//! Topic frames and the typed events decoded from them

use std::{collections::HashMap, sync::OnceLock};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    codec::Decode,
    config::CodecConfig,
    protocol::{
        error::{CodecError, CodecResult},
        redact::{redact_non_empty, Redact},
        registry::TypeRegistry,
    },
};

use super::{
    entity::{ChatMember, Participant, RoutingStatus, UserPresence},
    NotificationTopic, TopicKind,
};

/// Message of the keep-alive frames sent on `channel.metadata`
pub const HEARTBEAT_MESSAGE: &str = "WebSocket Heartbeat";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMetadata {
    #[serde(default, alias = "CorrelationId", skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

/// One JSON frame of the notification stream
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicFrame {
    #[serde(default)]
    pub topic_name: String,
    #[serde(default)]
    pub event_body: Value,
    #[serde(default)]
    pub metadata: FrameMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl TopicFrame {
    pub fn new(topic_name: impl Into<String>, event_body: Value) -> Self {
        Self {
            topic_name: topic_name.into(),
            event_body,
            ..Self::default()
        }
    }
}

/// Body of a topic event, built from the frame's `eventBody`
trait TopicPayload: Sized {
    fn from_body(topic: &NotificationTopic, body: Value) -> CodecResult<Self>;
}

fn body<T: DeserializeOwned>(body: Value) -> CodecResult<T> {
    match body {
        Value::Null => serde_json::from_value(Value::Object(Default::default())),
        body => serde_json::from_value(body),
    }
    .map_err(CodecError::unmarshal)
}

fn target(topic: &NotificationTopic) -> CodecResult<Uuid> {
    topic.target().ok_or_else(|| {
        CodecError::unmarshal(CodecError::invalid(
            "topicName",
            topic,
            "a topic bound to its target",
        ))
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct MetadataEvent {
    #[serde(default)]
    pub message: String,
}

impl TopicPayload for MetadataEvent {
    fn from_body(_topic: &NotificationTopic, value: Value) -> CodecResult<Self> {
        body(value)
    }
}

/// Analytics detail event about a conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationDetailEvent {
    pub conversation_id: Uuid,
    pub participant_id: Option<Uuid>,
    /// Only set by attribute change events
    pub attributes: HashMap<String, String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversationDetailWire {
    #[serde(default, with = "crate::protocol::scalar::uuid_opt")]
    conversation_id: Option<Uuid>,
    #[serde(default, with = "crate::protocol::scalar::uuid_opt")]
    participant_id: Option<Uuid>,
    #[serde(default)]
    attributes: HashMap<String, String>,
}

impl TopicPayload for ConversationDetailEvent {
    fn from_body(topic: &NotificationTopic, value: Value) -> CodecResult<Self> {
        let wire: ConversationDetailWire = body(value)?;
        Ok(Self {
            conversation_id: match wire.conversation_id {
                Some(id) => id,
                None => target(topic)?,
            },
            participant_id: wire.participant_id,
            attributes: wire.attributes,
        })
    }
}

/// A member joined, left or changed state in a chat
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMemberEvent {
    pub conversation_id: Uuid,
    pub member: Option<ChatMember>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ChatMemberWire {
    #[serde(default)]
    member: Option<ChatMember>,
    #[serde(default, with = "crate::protocol::scalar::instant_opt")]
    timestamp: Option<DateTime<Utc>>,
}

impl TopicPayload for ChatMemberEvent {
    fn from_body(topic: &NotificationTopic, value: Value) -> CodecResult<Self> {
        let wire: ChatMemberWire = body(value)?;
        Ok(Self {
            conversation_id: target(topic)?,
            member: wire.member,
            timestamp: wire.timestamp,
        })
    }
}

/// A chat message or typing indicator
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessageEvent {
    pub conversation_id: Uuid,
    pub sender: Option<ChatMember>,
    pub body: String,
    /// `standard`, `notice`, `member-join`, ...
    pub body_type: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatMessageWire {
    #[serde(default)]
    sender: Option<ChatMember>,
    #[serde(default)]
    body: String,
    #[serde(default)]
    body_type: String,
    #[serde(default, with = "crate::protocol::scalar::instant_opt")]
    timestamp: Option<DateTime<Utc>>,
}

impl TopicPayload for ChatMessageEvent {
    fn from_body(topic: &NotificationTopic, value: Value) -> CodecResult<Self> {
        let wire: ChatMessageWire = body(value)?;
        Ok(Self {
            conversation_id: target(topic)?,
            sender: wire.sender,
            body: wire.body,
            body_type: wire.body_type,
            timestamp: wire.timestamp,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserPresenceEvent {
    pub user_id: Uuid,
    pub presence: UserPresence,
}

impl TopicPayload for UserPresenceEvent {
    fn from_body(topic: &NotificationTopic, value: Value) -> CodecResult<Self> {
        Ok(Self {
            user_id: target(topic)?,
            presence: body(value)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserActivityEvent {
    pub user_id: Uuid,
    pub routing_status: Option<RoutingStatus>,
    pub presence: Option<UserPresence>,
    pub active_queue_ids: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserActivityWire {
    #[serde(default)]
    routing_status: Option<RoutingStatus>,
    #[serde(default)]
    presence: Option<UserPresence>,
    #[serde(default)]
    active_queue_ids: Vec<String>,
}

impl TopicPayload for UserActivityEvent {
    fn from_body(topic: &NotificationTopic, value: Value) -> CodecResult<Self> {
        let wire: UserActivityWire = body(value)?;
        Ok(Self {
            user_id: target(topic)?,
            routing_status: wire.routing_status,
            presence: wire.presence,
            active_queue_ids: wire.active_queue_ids,
        })
    }
}

/// A chat conversation of a user changed
#[derive(Debug, Clone, PartialEq)]
pub struct UserConversationChatEvent {
    pub user_id: Uuid,
    pub conversation_id: Option<Uuid>,
    pub name: String,
    pub participants: Vec<Participant>,
}

#[derive(Deserialize)]
struct UserConversationChatWire {
    #[serde(default, with = "crate::protocol::scalar::uuid_opt")]
    id: Option<Uuid>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    participants: Vec<Participant>,
}

impl TopicPayload for UserConversationChatEvent {
    fn from_body(topic: &NotificationTopic, value: Value) -> CodecResult<Self> {
        let wire: UserConversationChatWire = body(value)?;
        Ok(Self {
            user_id: target(topic)?,
            conversation_id: wire.id,
            name: wire.name,
            participants: wire.participants,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TopicBody {
    Metadata(MetadataEvent),
    /// Shared by the eight `v2.detail.events.conversation` kinds
    ConversationDetail(ConversationDetailEvent),
    ChatMember(ChatMemberEvent),
    ChatMessage(ChatMessageEvent),
    UserPresence(UserPresenceEvent),
    UserActivity(UserActivityEvent),
    UserConversationChat(UserConversationChatEvent),
}

/// A decoded notification
#[derive(Debug, Clone, PartialEq)]
pub struct TopicEvent {
    pub topic: NotificationTopic,
    pub correlation_id: Option<String>,
    /// The frame's `metadata.type`, e.g. `message` or `typing-indicator`
    pub event_type: Option<String>,
    pub version: Option<String>,
    pub body: TopicBody,
}

fn decode_frame<P: TopicPayload>(value: Value, wrap: fn(P) -> TopicBody) -> CodecResult<TopicEvent> {
    let frame: TopicFrame = serde_json::from_value(value).map_err(CodecError::unmarshal)?;
    let topic = NotificationTopic::parse(&frame.topic_name).map_err(CodecError::unmarshal)?;
    let body = P::from_body(&topic, frame.event_body)?;
    Ok(TopicEvent {
        topic,
        correlation_id: frame.metadata.correlation_id,
        event_type: frame.metadata.event_type,
        version: frame.version,
        body: wrap(body),
    })
}

fn decode_kind(kind: TopicKind, value: Value) -> CodecResult<TopicEvent> {
    match kind {
        TopicKind::Metadata => decode_frame(value, TopicBody::Metadata),
        TopicKind::ConversationAcdStart
        | TopicKind::ConversationAcdEnd
        | TopicKind::ConversationAttributes
        | TopicKind::ConversationContact
        | TopicKind::ConversationCustomerStart
        | TopicKind::ConversationFlowStart
        | TopicKind::ConversationUserStart
        | TopicKind::ConversationVoicemailEnd => {
            decode_frame(value, TopicBody::ConversationDetail)
        }
        TopicKind::ConversationChatMember => decode_frame(value, TopicBody::ChatMember),
        TopicKind::ConversationChatMessage => decode_frame(value, TopicBody::ChatMessage),
        TopicKind::UserPresence => decode_frame(value, TopicBody::UserPresence),
        TopicKind::UserActivity => decode_frame(value, TopicBody::UserActivity),
        TopicKind::UserConversationChats => decode_frame(value, TopicBody::UserConversationChat),
    }
}

fn registry() -> &'static TypeRegistry<TopicEvent> {
    static REGISTRY: OnceLock<TypeRegistry<TopicEvent>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        TopicKind::ALL
            .into_iter()
            .fold(TypeRegistry::new("topic", "topicName"), |registry, kind| {
                registry.with(kind.template(), move |value, _| decode_kind(kind, value))
            })
    })
}

impl TopicEvent {
    pub fn kind(&self) -> TopicKind {
        self.topic.kind
    }

    /// A keep-alive frame of the channel itself
    pub fn is_heartbeat(&self) -> bool {
        matches!(&self.body, TopicBody::Metadata(event) if event.message == HEARTBEAT_MESSAGE)
    }

    /// Templates known to the topic registry
    pub fn supported_topics() -> Vec<&'static str> {
        registry().supported_types()
    }
}

impl Decode for TopicEvent {
    fn from_value_with(value: Value, config: &CodecConfig) -> CodecResult<Self> {
        let kind = match value.get("topicName") {
            Some(Value::String(name)) => {
                TopicKind::find(name).ok_or_else(|| CodecError::unsupported("Topic", name.clone()))?
            }
            _ => return Err(CodecError::unmarshal(CodecError::missing("topicName"))),
        };
        registry().unmarshal_as(kind.template(), value, config)
    }
}

impl Redact for TopicBody {
    fn redact_with(&self, config: &CodecConfig) -> Self {
        match self {
            TopicBody::ChatMember(event) => TopicBody::ChatMember(ChatMemberEvent {
                member: event.member.as_ref().map(|member| member.redact_with(config)),
                ..event.clone()
            }),
            TopicBody::ChatMessage(event) => TopicBody::ChatMessage(ChatMessageEvent {
                sender: event.sender.as_ref().map(|sender| sender.redact_with(config)),
                body: if config.redact_message_text {
                    redact_non_empty(&event.body)
                } else {
                    event.body.clone()
                },
                ..event.clone()
            }),
            TopicBody::UserConversationChat(event) => {
                TopicBody::UserConversationChat(UserConversationChatEvent {
                    participants: event
                        .participants
                        .iter()
                        .map(|participant| participant.redact_with(config))
                        .collect(),
                    ..event.clone()
                })
            }
            other => other.clone(),
        }
    }
}

impl Redact for TopicEvent {
    fn redact_with(&self, config: &CodecConfig) -> Self {
        Self {
            body: self.body.redact_with(config),
            ..self.clone()
        }
    }
}
