//! Redaction of personal data before it reaches a log sink

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::config::CodecConfig;

/// Values that can produce a log-safe copy of themselves
///
/// The copy keeps its shape, only sensitive leaves are replaced by
/// [`redact_with_hash`] tags. Downstream handlers always receive the original.
pub trait Redact: Sized {
    /// Redact according to `config` (message text is only hashed when
    /// `redact_message_text` is set)
    fn redact_with(&self, config: &CodecConfig) -> Self;

    fn redact(&self) -> Self {
        self.redact_with(CodecConfig::global())
    }
}

/// Deterministic tag for a sensitive value
pub fn redact_with_hash(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    format!("REDACTED-{}", hex::encode(digest))
}

/// Redact a string only when it carries something
pub fn redact_non_empty(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        redact_with_hash(value)
    }
}

/// Redact the given keys of a string map
pub fn redact_keys(map: &HashMap<String, String>, keys: &[String]) -> HashMap<String, String> {
    map.iter()
        .map(|(key, value)| {
            if keys.iter().any(|k| k == key) {
                (key.clone(), redact_with_hash(value))
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}
