//! Encoding seam shared by every polymorphic family

pub mod json;

pub use json::{marshal, unmarshal, unmarshal_with, JsonCodec};

use bytes::Bytes;
use serde_json::Value;

use crate::{config::CodecConfig, protocol::error::CodecResult};

/// Value-level encoder
///
/// Polymorphic types encode through this trait rather than through serde so
/// that validation failures surface as typed [`CodecError`](crate::protocol::error::CodecError)s.
pub trait Encode {
    /// Produce the wire representation, refusing values that fail validation
    fn to_value(&self) -> CodecResult<Value>;
}

/// Value-level decoder, the inverse of [`Encode`]
pub trait Decode: Sized {
    /// Decode with an explicit configuration
    fn from_value_with(value: Value, config: &CodecConfig) -> CodecResult<Self>;

    /// Decode with the process-wide configuration
    fn from_value(value: Value) -> CodecResult<Self> {
        Self::from_value_with(value, CodecConfig::global())
    }
}

/// Codec trait for turning items into bytes for a transport
///
/// Different codecs implement different wire encodings. Only JSON is used by
/// the platform today.
pub trait Codec<T>: Send + Sync {
    /// Serialize an item to bytes for transport
    ///
    /// # Arguments
    ///
    /// * `item` - The item to encode
    ///
    /// # Returns
    ///
    /// The serialized bytes or a json-marshal error
    fn encode(&self, item: &T) -> CodecResult<Bytes>;

    /// Deserialize transport bytes into an item
    ///
    /// # Arguments
    ///
    /// * `body` - The payload bytes
    ///
    /// # Returns
    ///
    /// The decoded item or a json-unmarshal error
    fn decode(&self, body: &[u8]) -> CodecResult<T>;

    /// Get the content type for this codec
    fn content_type(&self) -> &str;
}

/// Implement `Serialize`/`Deserialize` in terms of [`Encode`]/[`Decode`]
///
/// Lets polymorphic values nest inside plain serde structs. Error kinds are
/// flattened to text on this path, use [`unmarshal`] to keep them.
macro_rules! serde_via_codec {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl serde::Serialize for $ty {
                fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    use serde::ser::Error;
                    let value = $crate::codec::Encode::to_value(self).map_err(S::Error::custom)?;
                    serde::Serialize::serialize(&value, serializer)
                }
            }

            impl<'de> serde::Deserialize<'de> for $ty {
                fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    use serde::de::Error;
                    let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                    <$ty as $crate::codec::Decode>::from_value(value).map_err(D::Error::custom)
                }
            }
        )+
    };
}

/// Implement [`Encode`]/[`Decode`] for plain serde types
macro_rules! codec_via_serde {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::codec::Encode for $ty {
                fn to_value(&self) -> $crate::protocol::error::CodecResult<serde_json::Value> {
                    serde_json::to_value(self).map_err($crate::protocol::error::CodecError::marshal)
                }
            }

            impl $crate::codec::Decode for $ty {
                fn from_value_with(
                    value: serde_json::Value,
                    _config: &$crate::config::CodecConfig,
                ) -> $crate::protocol::error::CodecResult<Self> {
                    serde_json::from_value(value).map_err($crate::protocol::error::CodecError::unmarshal)
                }
            }
        )+
    };
}

pub(crate) use codec_via_serde;
pub(crate) use serde_via_codec;
