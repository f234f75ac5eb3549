//! JSON codec

use std::marker::PhantomData;

use bytes::Bytes;
use serde_json::Value;

use crate::{
    codec::{Codec, Decode, Encode},
    config::CodecConfig,
    protocol::error::{CodecError, CodecResult},
};

/// JSON codec for any encodable family
#[derive(Debug, Clone)]
pub struct JsonCodec<T> {
    config: CodecConfig,
    _item: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    /// Create a JSON codec using the process-wide configuration
    pub fn new() -> Self {
        Self::with_config(CodecConfig::global().clone())
    }

    /// Create a JSON codec with its own configuration
    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            config,
            _item: PhantomData,
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Encode + Decode> Codec<T> for JsonCodec<T> {
    fn encode(&self, item: &T) -> CodecResult<Bytes> {
        let value = item.to_value().map_err(CodecError::marshal)?;
        let bytes = serde_json::to_vec(&value).map_err(CodecError::marshal)?;
        Ok(Bytes::from(bytes))
    }

    fn decode(&self, body: &[u8]) -> CodecResult<T> {
        let value: Value = serde_json::from_slice(body).map_err(CodecError::unmarshal)?;
        T::from_value_with(value, &self.config).map_err(CodecError::unmarshal)
    }

    fn content_type(&self) -> &str {
        "application/json"
    }
}

/// Encode an item to JSON bytes
pub fn marshal<T: Encode + Decode>(item: &T) -> CodecResult<Bytes> {
    JsonCodec::<T>::new().encode(item)
}

/// Decode JSON bytes with the process-wide configuration
pub fn unmarshal<T: Encode + Decode>(body: &[u8]) -> CodecResult<T> {
    JsonCodec::<T>::new().decode(body)
}

/// Decode JSON bytes with an explicit configuration
pub fn unmarshal_with<T: Encode + Decode>(body: &[u8], config: &CodecConfig) -> CodecResult<T> {
    JsonCodec::<T>::with_config(config.clone()).decode(body)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::protocol::settings::AcwSettings;

    use super::*;

    #[test]
    fn test_codec_content_type() {
        let codec = JsonCodec::<AcwSettings>::new();
        assert_eq!(codec.content_type(), "application/json");
    }

    #[test]
    fn test_marshal_unmarshal_bytes() {
        let settings = AcwSettings::new(Duration::from_secs(15), "OPTIONAL");
        let bytes = marshal(&settings).unwrap();
        let decoded: AcwSettings = unmarshal(&bytes).unwrap();
        assert_eq!(decoded, settings);
    }

    #[test]
    fn test_malformed_json_is_unmarshal_error() {
        let err = unmarshal::<AcwSettings>(b"{not json").unwrap_err();
        assert!(matches!(err, CodecError::JsonUnmarshal(_)));
    }
}
