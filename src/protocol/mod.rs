//! Core platform data model: errors, scalar codecs, registries and the
//! message families exchanged with bots

pub mod botconnector;
pub mod content;
pub mod error;
pub mod message;
pub mod redact;
pub mod registry;
pub mod scalar;
pub mod settings;
pub mod slot;

pub use botconnector::{
    BotResult, BotState, ErrorInfo, IncomingMessageRequest, IncomingMessageResponse,
    OutgoingMessageRequest, OutgoingMessageResponse,
};
pub use content::Content;
pub use error::{CodecError, CodecResult, DeliveryFailure, MultiError};
pub use message::{MessageType, NormalizedMessage};
pub use redact::Redact;
pub use registry::TypeRegistry;
pub use settings::{AcwSettings, MediaSetting, MediaSettings, RecordingAnnotation, ServiceLevel};
pub use slot::{Currency, SlotEntity, SlotKind, SlotValue};
