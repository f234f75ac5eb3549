//! Process-wide codec configuration

use std::{sync::OnceLock, time::Duration};

/// How list decoders react to an unknown discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmarshalMode {
    /// Unknown variants are fatal
    #[default]
    Strict,

    /// Unknown variants are dropped from the list
    IgnoreUnknownKeys,
}

impl UnmarshalMode {
    /// Parse `strict` or `ignore_unknown_keys`, anything else is strict
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "ignore_unknown_keys" => UnmarshalMode::IgnoreUnknownKeys,
            _ => UnmarshalMode::Strict,
        }
    }
}

/// Configuration for decoding and for notification channels
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Policy for unknown content, event and message types in lists
    pub unmarshal_mode: UnmarshalMode,

    /// Hash message text when redacting for logs
    pub redact_message_text: bool,

    /// Deliver and log channel heartbeats
    pub log_heartbeat: bool,

    /// Number of events buffered per channel consumer
    pub channel_buffer: usize,

    /// How long a delivery may wait on a full buffer
    pub delivery_timeout: Duration,
}

impl CodecConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self {
            unmarshal_mode: UnmarshalMode::Strict,
            redact_message_text: true,
            log_heartbeat: false,
            channel_buffer: 64,
            delivery_timeout: Duration::from_secs(5),
        }
    }

    /// Read `JSON_UNMARSHAL_MODE`, `REDACT_MESSAGE_TEXT` and `PURECLOUD_LOG_HEARTBEAT`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::new();
        Self {
            unmarshal_mode: lookup("JSON_UNMARSHAL_MODE")
                .map(|value| UnmarshalMode::parse(&value))
                .unwrap_or(defaults.unmarshal_mode),
            redact_message_text: lookup("REDACT_MESSAGE_TEXT")
                .and_then(|value| parse_bool(&value))
                .unwrap_or(defaults.redact_message_text),
            log_heartbeat: lookup("PURECLOUD_LOG_HEARTBEAT")
                .and_then(|value| parse_bool(&value))
                .unwrap_or(defaults.log_heartbeat),
            ..defaults
        }
    }

    /// The process-wide configuration, read from the environment on first use
    pub fn global() -> &'static CodecConfig {
        static GLOBAL: OnceLock<CodecConfig> = OnceLock::new();
        GLOBAL.get_or_init(CodecConfig::from_env)
    }

    /// Set the unmarshal mode
    pub fn with_unmarshal_mode(mut self, mode: UnmarshalMode) -> Self {
        self.unmarshal_mode = mode;
        self
    }

    /// Enable or disable message text redaction
    pub fn with_redact_message_text(mut self, enabled: bool) -> Self {
        self.redact_message_text = enabled;
        self
    }

    /// Enable or disable heartbeat delivery
    pub fn with_log_heartbeat(mut self, enabled: bool) -> Self {
        self.log_heartbeat = enabled;
        self
    }

    /// Set the per-consumer buffer size, at least 1
    pub fn with_channel_buffer(mut self, size: usize) -> Self {
        self.channel_buffer = size.max(1);
        self
    }

    /// Set the delivery timeout
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    pub fn ignores_unknown_keys(&self) -> bool {
        self.unmarshal_mode == UnmarshalMode::IgnoreUnknownKeys
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
