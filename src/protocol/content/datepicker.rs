//! Date picker content

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::{
    config::CodecConfig,
    protocol::error::{CodecError, CodecResult, MultiError},
};

use super::{payload_from_value, payload_to_value, ContentVariant};

/// A slot offered by a date picker, the duration travels in whole seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableTime {
    #[serde(rename = "dateTime", with = "crate::protocol::scalar::instant")]
    pub date_time: DateTime<Utc>,
    #[serde(with = "crate::protocol::scalar::duration_secs")]
    pub duration: Duration,
}

impl AvailableTime {
    pub fn new(date_time: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            date_time,
            duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatePickerContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::protocol::scalar::url_opt"
    )]
    pub image_url: Option<Url>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::protocol::scalar::instant_opt"
    )]
    pub date_minimum: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::protocol::scalar::instant_opt"
    )]
    pub date_maximum: Option<DateTime<Utc>>,
    pub available_times: Vec<AvailableTime>,
}

impl DatePickerContent {
    pub fn new(title: impl Into<String>, available_times: Vec<AvailableTime>) -> Self {
        Self {
            title: Some(title.into()),
            available_times,
            ..Self::default()
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

impl ContentVariant for DatePickerContent {
    const CONTENT_TYPE: &'static str = "DatePicker";
    const KEY: &'static str = "datePicker";

    fn encode_payload(&self) -> CodecResult<Value> {
        payload_to_value(self)
    }

    fn decode_payload(payload: Value, _config: &CodecConfig) -> CodecResult<Self> {
        if payload.get("availableTimes").is_none() {
            return Err(CodecError::missing("availableTimes"));
        }
        payload_from_value(payload)
    }

    fn validate(&self) -> CodecResult<()> {
        let mut merr = MultiError::new();
        if let (Some(minimum), Some(maximum)) = (self.date_minimum, self.date_maximum) {
            if minimum > maximum {
                merr.push(CodecError::invalid(
                    "dateMaximum",
                    maximum.to_rfc3339(),
                    "a date after dateMinimum",
                ));
            }
        }
        for slot in &self.available_times {
            if slot.duration.is_zero() || slot.duration.subsec_nanos() != 0 {
                merr.push(CodecError::invalid(
                    "availableTimes.duration",
                    format!("{:?}", slot.duration),
                    "a positive whole number of seconds",
                ));
            }
        }
        merr.into_result()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn at(text: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_available_times_in_seconds() {
        let picker = DatePickerContent::new(
            "When would you be available?",
            vec![
                AvailableTime::new(at("2025-05-30T12:00:00Z"), Duration::from_secs(30 * 60)),
                AvailableTime::new(at("2025-06-30T13:00:00Z"), Duration::from_secs(15 * 60)),
            ],
        )
        .with_subtitle("Pick a date and time");

        let value = picker.to_content_value().unwrap();
        assert_eq!(
            value["datePicker"]["availableTimes"],
            json!([
                {"dateTime": "2025-05-30T12:00:00Z", "duration": 1800},
                {"dateTime": "2025-06-30T13:00:00Z", "duration": 900}
            ])
        );

        let decoded = DatePickerContent::from_content_value(value, &CodecConfig::default()).unwrap();
        assert_eq!(decoded, picker);
    }

    #[test]
    fn test_available_times_are_mandatory() {
        let err = DatePickerContent::from_content_value(
            json!({"contentType": "DatePicker", "datePicker": {"title": "When?"}}),
            &CodecConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.missing_argument(), Some("availableTimes"));
    }

    #[test]
    fn test_durations_must_be_whole_seconds() {
        for duration in [Duration::from_millis(1500), Duration::ZERO] {
            let picker = DatePickerContent::new(
                "When?",
                vec![AvailableTime::new(at("2025-05-30T12:00:00Z"), duration)],
            );
            let err = picker.to_content_value().unwrap_err();
            assert!(err.is_argument_invalid(), "{duration:?}");
            assert!(err.to_string().contains("availableTimes.duration"));
        }

        let err = DatePickerContent::from_content_value(
            json!({"contentType": "DatePicker", "datePicker": {
                "availableTimes": [{"dateTime": "2025-05-30T12:00:00Z", "duration": 0}]
            }}),
            &CodecConfig::default(),
        )
        .unwrap_err();
        assert!(err.is_argument_invalid());
    }

    #[test]
    fn test_date_range_is_ordered() {
        let mut picker = DatePickerContent::new("When?", vec![]);
        picker.date_minimum = Some(at("2025-06-01T00:00:00Z"));
        picker.date_maximum = Some(at("2025-05-01T00:00:00Z"));
        assert!(picker.to_content_value().unwrap_err().is_argument_invalid());
    }
}
