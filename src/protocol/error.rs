//! Error types for codec operations

use std::fmt;

use thiserror::Error;

/// Main error type for codec operations
#[derive(Debug, Error)]
pub enum CodecError {
    /// A required field is absent or empty
    #[error("Argument {0} is missing")]
    ArgumentMissing(String),

    /// A field carries a value outside its allowed domain
    #[error("Argument {field} is invalid (got: {got}, expected: {expected})")]
    ArgumentInvalid {
        field: String,
        got: String,
        expected: String,
    },

    /// A discriminator value is not known by the family registry
    #[error("Invalid type: {got} (supported: {})", supported.join(","))]
    InvalidType { got: String, supported: Vec<String> },

    /// Encoding refused or failed
    #[error("JSON marshal error: {0}")]
    JsonMarshal(#[source] Box<CodecError>),

    /// Decoding failed
    #[error("JSON unmarshal error: {0}")]
    JsonUnmarshal(#[source] Box<CodecError>),

    /// Low level serde failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Several field level faults reported together
    #[error(transparent)]
    Multi(MultiError),

    /// Something that is well formed but not handled
    #[error("Unsupported {what}: {value}")]
    Unsupported { what: String, value: String },

    /// A variant was registered twice in the same family
    #[error("Duplicate registration of {name} in the {family} registry")]
    DuplicateRegistration { family: String, name: String },

    /// The notification channel no longer accepts work
    #[error("Channel is closed")]
    ChannelClosed,

    /// A subscriber did not accept an event within the configured bound
    #[error("Delivery timed out after {0:?}")]
    DeliveryTimeout(std::time::Duration),

    /// Transport-level error (network, connection, status)
    #[error("Transport error: {0}")]
    Transport(String),

    /// A failure reported by the platform in a delivery receipt
    #[error("{kind}: {message}")]
    Delivery {
        kind: DeliveryFailure,
        message: String,
    },
}

impl CodecError {
    /// Build an [`CodecError::ArgumentMissing`]
    pub fn missing(field: impl Into<String>) -> Self {
        CodecError::ArgumentMissing(field.into())
    }

    /// Build an [`CodecError::ArgumentInvalid`]
    pub fn invalid(
        field: impl Into<String>,
        got: impl fmt::Display,
        expected: impl Into<String>,
    ) -> Self {
        CodecError::ArgumentInvalid {
            field: field.into(),
            got: got.to_string(),
            expected: expected.into(),
        }
    }

    /// Build an [`CodecError::InvalidType`] from the registry's supported list
    pub fn invalid_type<S: AsRef<str>>(got: impl Into<String>, supported: &[S]) -> Self {
        CodecError::InvalidType {
            got: got.into(),
            supported: supported.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    /// Build an [`CodecError::Unsupported`]
    pub fn unsupported(what: impl Into<String>, value: impl Into<String>) -> Self {
        CodecError::Unsupported {
            what: what.into(),
            value: value.into(),
        }
    }

    /// Wrap into a json-unmarshal error, unless it already is one
    pub fn unmarshal(err: impl Into<CodecError>) -> Self {
        match err.into() {
            err @ CodecError::JsonUnmarshal(_) => err,
            err => CodecError::JsonUnmarshal(Box::new(err)),
        }
    }

    /// Wrap into a json-marshal error, unless it already is one
    pub fn marshal(err: impl Into<CodecError>) -> Self {
        match err.into() {
            err @ CodecError::JsonMarshal(_) => err,
            err => CodecError::JsonMarshal(Box::new(err)),
        }
    }

    /// Check this error, its wrapped causes and multi-error members
    pub fn any(&self, predicate: &dyn Fn(&CodecError) -> bool) -> bool {
        if predicate(self) {
            return true;
        }
        match self {
            CodecError::JsonMarshal(inner) | CodecError::JsonUnmarshal(inner) => {
                inner.any(predicate)
            }
            CodecError::Multi(multi) => multi.errors.iter().any(|err| err.any(predicate)),
            _ => false,
        }
    }

    pub fn is_argument_missing(&self) -> bool {
        self.any(&|err| matches!(err, CodecError::ArgumentMissing(_)))
    }

    pub fn is_argument_invalid(&self) -> bool {
        self.any(&|err| matches!(err, CodecError::ArgumentInvalid { .. }))
    }

    pub fn is_invalid_type(&self) -> bool {
        self.any(&|err| matches!(err, CodecError::InvalidType { .. }))
    }

    pub fn is_json_marshal(&self) -> bool {
        self.any(&|err| matches!(err, CodecError::JsonMarshal(_)))
    }

    pub fn is_json_unmarshal(&self) -> bool {
        self.any(&|err| matches!(err, CodecError::JsonUnmarshal(_)))
    }

    pub fn is_unsupported(&self) -> bool {
        self.any(&|err| matches!(err, CodecError::Unsupported { .. }))
    }

    /// Name of the missing argument, if this is (or wraps) an argument-missing error
    pub fn missing_argument(&self) -> Option<&str> {
        match self {
            CodecError::ArgumentMissing(field) => Some(field),
            CodecError::JsonMarshal(inner) | CodecError::JsonUnmarshal(inner) => {
                inner.missing_argument()
            }
            CodecError::Multi(multi) => multi.errors.iter().find_map(|e| e.missing_argument()),
            _ => None,
        }
    }
}

/// Accumulates field-level faults found while validating one value
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<CodecError>,
}

impl MultiError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fault
    pub fn push(&mut self, err: CodecError) {
        self.errors.push(err);
    }

    /// Record the fault of a fallible check, if any
    pub fn check(&mut self, result: CodecResult<()>) {
        if let Err(err) = result {
            self.push(err);
        }
    }

    /// Absorb the faults of another accumulator
    pub fn merge(&mut self, other: MultiError) {
        self.errors.extend(other.errors);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[CodecError] {
        &self.errors
    }

    /// Nothing when empty, the composite error otherwise
    pub fn into_error(self) -> Option<CodecError> {
        if self.errors.is_empty() {
            None
        } else {
            Some(CodecError::Multi(self))
        }
    }

    pub fn into_result(self) -> CodecResult<()> {
        match self.into_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, err) in self.errors.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

/// Failure kinds reported by open messaging receipts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    MessageExpired,
    RateLimited,
    MessageNotAllowed,
    GeneralError,
    UnsupportedMessage,
    UnknownMessage,
    InvalidMessageStructure,
    InvalidDestination,
    ServerError,
    MediaTypeNotAllowed,
    InvalidMediaContentLength,
    RecipientOptedOut,
}

impl DeliveryFailure {
    /// Map a receipt reason code, unknown codes are general errors
    pub fn from_code(code: &str) -> Self {
        match code {
            "MessageExpired" => Self::MessageExpired,
            "RateLimited" => Self::RateLimited,
            "MessageNotAllowed" => Self::MessageNotAllowed,
            "UnsupportedMessage" => Self::UnsupportedMessage,
            "UnknownMessage" => Self::UnknownMessage,
            "InvalidMessageStructure" => Self::InvalidMessageStructure,
            "InvalidDestination" => Self::InvalidDestination,
            "ServerError" => Self::ServerError,
            "MediaTypeNotAllowed" => Self::MediaTypeNotAllowed,
            "InvalidMediaContentLength" => Self::InvalidMediaContentLength,
            "RecipientOptedOut" => Self::RecipientOptedOut,
            _ => Self::GeneralError,
        }
    }

    /// Platform error code, e.g. `message.expired`
    pub fn code(&self) -> &'static str {
        match self {
            Self::MessageExpired => "message.expired",
            Self::RateLimited => "rate.limited",
            Self::MessageNotAllowed => "message.not.allowed",
            Self::GeneralError => "general.error",
            Self::UnsupportedMessage => "unsupported.message",
            Self::UnknownMessage => "unknown.message",
            Self::InvalidMessageStructure => "invalid.message.structure",
            Self::InvalidDestination => "invalid.destination",
            Self::ServerError => "server.error",
            Self::MediaTypeNotAllowed => "media.type.not.allowed",
            Self::InvalidMediaContentLength => "invalid.media.content.length",
            Self::RecipientOptedOut => "recipient.opted.out",
        }
    }
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Result type alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

impl From<reqwest::Error> for CodecError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CodecError::Transport(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            CodecError::Transport(format!("Connection error: {}", err))
        } else {
            CodecError::Transport(err.to_string())
        }
    }
}

impl From<MultiError> for CodecError {
    fn from(err: MultiError) -> Self {
        CodecError::Multi(err)
    }
}
