//! Queue and recording settings with millisecond durations

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::codec_via_serde;

/// After call work settings of a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcwSettings {
    #[serde(rename = "timeoutMs", with = "crate::protocol::scalar::duration_ms")]
    pub timeout: Duration,
    #[serde(rename = "wrapupPrompt", default)]
    pub wrapup_prompt: String,
}

impl AcwSettings {
    pub fn new(timeout: Duration, wrapup_prompt: impl Into<String>) -> Self {
        Self {
            timeout,
            wrapup_prompt: wrapup_prompt.into(),
        }
    }
}

/// Target percentage of interactions answered within a duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceLevel {
    #[serde(default)]
    pub percentage: f64,
    #[serde(rename = "durationMs", with = "crate::protocol::scalar::duration_ms")]
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSetting {
    #[serde(rename = "durationMs", with = "crate::protocol::scalar::duration_ms")]
    pub alerting_timeout: Duration,
    #[serde(rename = "serviceLevel")]
    pub service_level: ServiceLevel,
}

/// Media settings keyed by media type (`call`, `chat`, `email`, ...)
pub type MediaSettings = BTreeMap<String, MediaSetting>;

/// A note attached to a point of a recording
///
/// Locations are offsets from the start of the recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingAnnotation {
    #[serde(default, with = "crate::protocol::scalar::uuid_opt")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub annotation_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub annotations: Vec<RecordingAnnotation>,
    #[serde(default, with = "crate::protocol::scalar::duration_ms")]
    pub location: Duration,
    #[serde(rename = "durationMs", default, with = "crate::protocol::scalar::duration_ms")]
    pub duration: Duration,
    #[serde(default, with = "crate::protocol::scalar::duration_ms")]
    pub absolute_location: Duration,
    #[serde(
        rename = "absoluteDurationMs",
        default,
        with = "crate::protocol::scalar::duration_ms"
    )]
    pub absolute_duration: Duration,
    #[serde(default, with = "crate::protocol::scalar::duration_ms")]
    pub recording_location: Duration,
    #[serde(
        rename = "recordingDurationMs",
        default,
        with = "crate::protocol::scalar::duration_ms"
    )]
    pub recording_duration: Duration,
    #[serde(default, with = "crate::protocol::scalar::duration_ms")]
    pub realtime_location: Duration,
    #[serde(default)]
    pub self_uri: String,
}

codec_via_serde!(AcwSettings, ServiceLevel, MediaSetting, RecordingAnnotation);
