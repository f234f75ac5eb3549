//! # Tower GCloudCX
//!
//! Typed JSON codec and notification dispatch for the Genesys Cloud CX
//! platform.
//!
//! Platform payloads are discriminator-tagged JSON objects. This crate maps
//! each payload family onto a closed Rust enum, validates it on the way in
//! and out, and routes live notification events to consumers.
//!
//! ## Families
//!
//! - **Normalized content**: text, attachments, quick replies, cards,
//!   carousels, date pickers, locations, stories and notifications
//! - **Bot connector**: incoming and outgoing bot messages and results
//! - **Slot entities**: typed values recognised by a bot
//! - **Open messaging**: text, structured, button response, receipt and
//!   event envelopes
//! - **Notification topics**: conversation, chat, presence and activity
//!   events pushed on a notification channel
//!
//! ## Example
//!
//! ```rust
//! use tower_gcloudcx::prelude::*;
//!
//! let message: NormalizedMessage = tower_gcloudcx::codec::unmarshal(
//!     br#"{"type":"Text","text":"Hello"}"#,
//! )?;
//! assert_eq!(message.message_type, MessageType::Text);
//! # Ok::<(), CodecError>(())
//! ```

pub mod channel;
pub mod codec;
pub mod config;
pub mod openmessaging;
pub mod protocol;
pub mod topic;
pub mod transport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        channel::{ChannelInfo, NotificationChannel},
        codec::{Decode, Encode},
        config::{CodecConfig, UnmarshalMode},
        openmessaging::{OpenMessage, OpenMessageChannel, OpenMessageHeader},
        protocol::{
            BotResult, BotState, CodecError, CodecResult, Content, IncomingMessageRequest,
            MessageType, NormalizedMessage, OutgoingMessageRequest, Redact, SlotEntity,
        },
        topic::{NotificationTopic, TopicEvent, TopicKind},
        transport::{HttpTransport, Transport},
    };
}
