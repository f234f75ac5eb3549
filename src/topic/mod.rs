//! Notification topics
//!
//! A topic name is a dotted path where some segments are entity UUIDs, e.g.
//! `v2.users.{id}.presence`. Each [`TopicKind`] owns one template and
//! [`NotificationTopic`] pairs a kind with the UUIDs filling its `{id}`
//! placeholders.

pub mod entity;
pub mod event;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

pub use entity::{ChatMember, Participant, PresenceDefinition, RoutingStatus, UserPresence};
pub use event::{
    ChatMemberEvent, ChatMessageEvent, ConversationDetailEvent, FrameMetadata, MetadataEvent,
    TopicBody, TopicEvent, TopicFrame, UserActivityEvent, UserConversationChatEvent,
    UserPresenceEvent,
};

use crate::{
    codec::{serde_via_codec, Decode, Encode},
    config::CodecConfig,
    protocol::error::{CodecError, CodecResult},
};

/// Placeholder for a target UUID in a topic template
pub const PLACEHOLDER: &str = "{id}";

/// Topic name of the channel's own events (heartbeats, ...)
pub const METADATA_TOPIC: &str = "channel.metadata";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TopicKind {
    Metadata,
    ConversationAcdStart,
    ConversationAcdEnd,
    ConversationAttributes,
    ConversationContact,
    ConversationCustomerStart,
    ConversationFlowStart,
    ConversationUserStart,
    ConversationVoicemailEnd,
    ConversationChatMember,
    ConversationChatMessage,
    UserPresence,
    UserActivity,
    UserConversationChats,
}

impl TopicKind {
    pub const ALL: [TopicKind; 14] = [
        TopicKind::Metadata,
        TopicKind::ConversationAcdStart,
        TopicKind::ConversationAcdEnd,
        TopicKind::ConversationAttributes,
        TopicKind::ConversationContact,
        TopicKind::ConversationCustomerStart,
        TopicKind::ConversationFlowStart,
        TopicKind::ConversationUserStart,
        TopicKind::ConversationVoicemailEnd,
        TopicKind::ConversationChatMember,
        TopicKind::ConversationChatMessage,
        TopicKind::UserPresence,
        TopicKind::UserActivity,
        TopicKind::UserConversationChats,
    ];

    pub fn template(&self) -> &'static str {
        match self {
            TopicKind::Metadata => METADATA_TOPIC,
            TopicKind::ConversationAcdStart => "v2.detail.events.conversation.{id}.acd.start",
            TopicKind::ConversationAcdEnd => "v2.detail.events.conversation.{id}.acd.end",
            TopicKind::ConversationAttributes => "v2.detail.events.conversation.{id}.attributes",
            TopicKind::ConversationContact => "v2.detail.events.conversation.{id}.contact",
            TopicKind::ConversationCustomerStart => {
                "v2.detail.events.conversation.{id}.customer.start"
            }
            TopicKind::ConversationFlowStart => "v2.detail.events.conversation.{id}.flow.start",
            TopicKind::ConversationUserStart => "v2.detail.events.conversation.{id}.user.start",
            TopicKind::ConversationVoicemailEnd => {
                "v2.detail.events.conversation.{id}.voicemail.end"
            }
            TopicKind::ConversationChatMember => "v2.conversations.chats.{id}.members",
            TopicKind::ConversationChatMessage => "v2.conversations.chats.{id}.messages",
            TopicKind::UserPresence => "v2.users.{id}.presence",
            TopicKind::UserActivity => "v2.users.{id}.activity",
            TopicKind::UserConversationChats => "v2.users.{id}.conversations.chats",
        }
    }

    /// Number of `{id}` placeholders in the template
    pub fn target_count(&self) -> usize {
        self.template().matches(PLACEHOLDER).count()
    }

    /// Analytics detail events about one conversation
    pub fn is_conversation_detail(&self) -> bool {
        self.template().starts_with("v2.detail.events.conversation.")
    }

    /// Segments of `name` standing where the template has `{id}`
    ///
    /// Segments still spelled `{id}` are skipped. `None` when the literal
    /// segments differ.
    fn capture<'a>(&self, name: &'a str) -> Option<Vec<&'a str>> {
        let mut expected = self.template().split('.');
        let mut actual = name.split('.');
        let mut ids = Vec::new();
        loop {
            match (expected.next(), actual.next()) {
                (None, None) => return Some(ids),
                (Some(PLACEHOLDER), Some(PLACEHOLDER)) => {}
                (Some(PLACEHOLDER), Some(segment)) => ids.push(segment),
                (Some(literal), Some(segment)) if literal == segment => {}
                _ => return None,
            }
        }
    }

    /// The kind whose template matches `name`
    pub fn find(name: &str) -> Option<TopicKind> {
        TopicKind::ALL
            .into_iter()
            .find(|kind| kind.capture(name).is_some())
    }
}

impl fmt::Display for TopicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template())
    }
}

/// A topic, possibly bound to its targets
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationTopic {
    pub kind: TopicKind,
    pub targets: Vec<Uuid>,
}

impl NotificationTopic {
    pub fn new(kind: TopicKind) -> Self {
        Self {
            kind,
            targets: Vec::new(),
        }
    }

    /// Bind the topic to its targets, in placeholder order
    pub fn with(mut self, targets: impl IntoIterator<Item = Uuid>) -> Self {
        self.targets = targets.into_iter().collect();
        self
    }

    /// Parse a topic name
    ///
    /// A name matching no template, or carrying something other than a UUID
    /// in an `{id}` position, is an invalid argument.
    pub fn parse(name: &str) -> CodecResult<Self> {
        for kind in TopicKind::ALL {
            if let Some(ids) = kind.capture(name) {
                let targets = ids
                    .into_iter()
                    .map(Uuid::parse_str)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| CodecError::invalid("topicName", name, kind.template()))?;
                return Ok(Self { kind, targets });
            }
        }
        Err(CodecError::invalid("topicName", name, "a known topic"))
    }

    /// Every placeholder has a target
    pub fn is_complete(&self) -> bool {
        self.targets.len() == self.kind.target_count()
    }

    pub fn target(&self) -> Option<Uuid> {
        self.targets.first().copied()
    }
}

impl fmt::Display for NotificationTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut targets = self.targets.iter().peekable();
        for (index, segment) in self.kind.template().split('.').enumerate() {
            if index > 0 {
                f.write_str(".")?;
            }
            match (segment, targets.next_if(|_| segment == PLACEHOLDER)) {
                (PLACEHOLDER, Some(target)) => write!(f, "{}", target.hyphenated())?,
                (segment, _) => f.write_str(segment)?,
            }
        }
        Ok(())
    }
}

impl FromStr for NotificationTopic {
    type Err = CodecError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        NotificationTopic::parse(name)
    }
}

impl From<TopicKind> for NotificationTopic {
    fn from(kind: TopicKind) -> Self {
        NotificationTopic::new(kind)
    }
}

impl Serialize for NotificationTopic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NotificationTopic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        let name = String::deserialize(deserializer)?;
        NotificationTopic::parse(&name).map_err(D::Error::custom)
    }
}

/// Subscription state of one topic, as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicState {
    pub topic: NotificationTopic,
    pub state: Option<String>,
    pub reject_reason: Option<String>,
    pub self_uri: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicStateWire {
    #[serde(default)]
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reject_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    self_uri: Option<String>,
}

impl TopicState {
    pub fn new(topic: NotificationTopic) -> Self {
        Self {
            topic,
            state: None,
            reject_reason: None,
            self_uri: None,
        }
    }

    pub fn rejected(topic: NotificationTopic, reason: impl Into<String>) -> Self {
        Self {
            state: Some("Rejected".to_string()),
            reject_reason: Some(reason.into()),
            ..Self::new(topic)
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.state.as_deref() == Some("Rejected")
    }
}

impl Encode for TopicState {
    fn to_value(&self) -> CodecResult<Value> {
        let wire = TopicStateWire {
            id: self.topic.to_string(),
            state: self.state.clone(),
            reject_reason: self.reject_reason.clone(),
            self_uri: self.self_uri.clone(),
        };
        serde_json::to_value(wire).map_err(CodecError::marshal)
    }
}

impl Decode for TopicState {
    fn from_value_with(value: Value, _config: &CodecConfig) -> CodecResult<Self> {
        let wire: TopicStateWire = serde_json::from_value(value).map_err(CodecError::unmarshal)?;
        Ok(Self {
            topic: NotificationTopic::parse(&wire.id).map_err(CodecError::unmarshal)?,
            state: wire.state,
            reject_reason: wire.reject_reason,
            self_uri: wire.self_uri,
        })
    }
}

serde_via_codec!(TopicState);
