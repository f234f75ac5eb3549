//! Leaf codecs shared by every variant
//!
//! Durations, instants, URLs and UUIDs are converted here and nowhere else.
//! Each conversion exists as a plain function (value level) and as a serde
//! `with` module so wire structs can annotate a field with its unit.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use super::error::{CodecError, CodecResult};

const MILLIS_PER_SECOND: f64 = 1_000.0;
const MILLIS_PER_MINUTE: f64 = 60.0 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: f64 = 60.0 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: f64 = 24.0 * MILLIS_PER_HOUR;
const MILLIS_PER_WEEK: f64 = 7.0 * MILLIS_PER_DAY;

/// Wire unit of a duration field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Milliseconds,
    Seconds,
    Iso8601,
}

/// Encode a duration in the requested unit
pub fn encode_duration(duration: Duration, unit: DurationUnit) -> Value {
    match unit {
        DurationUnit::Milliseconds => Value::from(duration.as_millis() as u64),
        DurationUnit::Seconds => Value::from(duration.as_secs()),
        DurationUnit::Iso8601 => Value::from(format_iso8601(duration)),
    }
}

/// Decode a duration, numeric units reject anything but a non-negative integer
pub fn decode_duration(value: &Value, unit: DurationUnit) -> CodecResult<Duration> {
    match unit {
        DurationUnit::Iso8601 => match value {
            Value::String(text) => parse_iso8601(text),
            other => Err(CodecError::invalid(
                "duration",
                other,
                "an ISO-8601 duration string",
            )),
        },
        DurationUnit::Milliseconds => Ok(Duration::from_millis(whole_number(value)?)),
        DurationUnit::Seconds => Ok(Duration::from_secs(whole_number(value)?)),
    }
}

fn whole_number(value: &Value) -> CodecResult<u64> {
    if let Some(number) = value.as_u64() {
        return Ok(number);
    }
    match value.as_f64() {
        Some(number) if number < 0.0 => Err(CodecError::invalid(
            "duration",
            number,
            "a positive duration",
        )),
        Some(number) if number.fract() == 0.0 => Ok(number as u64),
        _ => Err(CodecError::invalid("duration", value, "an integer")),
    }
}

/// Format as an ISO-8601 duration, e.g. `PT1H30M` or `P1DT0.5S`
pub fn format_iso8601(duration: Duration) -> String {
    let total = duration.as_millis();
    if total == 0 {
        return "PT0S".to_string();
    }
    let days = total / 86_400_000;
    let hours = (total / 3_600_000) % 24;
    let minutes = (total / 60_000) % 60;
    let seconds = (total / 1_000) % 60;
    let millis = total % 1_000;

    let mut text = String::from("P");
    if days > 0 {
        text.push_str(&format!("{days}D"));
    }
    if hours + minutes + seconds + millis > 0 {
        text.push('T');
        if hours > 0 {
            text.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            text.push_str(&format!("{minutes}M"));
        }
        if millis > 0 {
            let fraction = format!("{millis:03}");
            text.push_str(&format!("{seconds}.{}S", fraction.trim_end_matches('0')));
        } else if seconds > 0 {
            text.push_str(&format!("{seconds}S"));
        }
    }
    text
}

/// Parse an ISO-8601 duration with week, day and time components
///
/// Years and months have no fixed length and are rejected.
pub fn parse_iso8601(text: &str) -> CodecResult<Duration> {
    let invalid = || CodecError::invalid("duration", text, "an ISO-8601 duration");
    let rest = text.trim().strip_prefix('P').ok_or_else(invalid)?;

    let mut total = 0.0_f64;
    let mut in_time = false;
    let mut number = String::new();
    let mut components = 0;

    for c in rest.chars() {
        match c {
            'T' if !in_time && number.is_empty() => in_time = true,
            '0'..='9' | '.' => number.push(c),
            ',' => number.push('.'),
            unit => {
                let factor = match (in_time, unit) {
                    (false, 'W') => MILLIS_PER_WEEK,
                    (false, 'D') => MILLIS_PER_DAY,
                    (true, 'H') => MILLIS_PER_HOUR,
                    (true, 'M') => MILLIS_PER_MINUTE,
                    (true, 'S') => MILLIS_PER_SECOND,
                    _ => return Err(invalid()),
                };
                let amount: f64 = number.parse().map_err(|_| invalid())?;
                total += amount * factor;
                number.clear();
                components += 1;
            }
        }
    }
    if !number.is_empty() || components == 0 {
        return Err(invalid());
    }
    Ok(Duration::from_millis(total.round() as u64))
}

/// Encode an instant as RFC 3339, absent instants are `null`
pub fn encode_instant(instant: Option<&DateTime<Utc>>) -> Value {
    match instant {
        Some(instant) => Value::from(instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        None => Value::Null,
    }
}

/// Decode an RFC 3339 instant with any offset, `null` and `""` are absent
pub fn decode_instant(value: &Value) -> CodecResult<Option<DateTime<Utc>>> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) if text.is_empty() => Ok(None),
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|instant| Some(instant.with_timezone(&Utc)))
            .map_err(|_| CodecError::invalid("time", text, "an RFC 3339 timestamp")),
        other => Err(CodecError::invalid("time", other, "an RFC 3339 timestamp")),
    }
}

/// Encode a URL, absent URLs are `null`
pub fn encode_url(url: Option<&Url>) -> Value {
    match url {
        Some(url) => Value::from(url.as_str()),
        None => Value::Null,
    }
}

/// Decode an absolute URL, `null` and `""` are absent
pub fn decode_url(value: &Value) -> CodecResult<Option<Url>> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) if text.is_empty() => Ok(None),
        Value::String(text) => Url::parse(text)
            .map(Some)
            .map_err(|e| CodecError::invalid("url", text, format!("an absolute URL ({e})"))),
        other => Err(CodecError::invalid("url", other, "a URL string")),
    }
}

/// Encode a UUID, the nil UUID is absent
pub fn encode_uuid(id: &Uuid) -> Option<String> {
    if id.is_nil() {
        None
    } else {
        Some(id.hyphenated().to_string())
    }
}

/// Decode a UUID, `null`, `""` and the nil UUID are absent
pub fn decode_uuid(value: &Value) -> CodecResult<Option<Uuid>> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) if text.is_empty() => Ok(None),
        Value::String(text) => Uuid::parse_str(text)
            .map(|id| if id.is_nil() { None } else { Some(id) })
            .map_err(|_| CodecError::invalid("uuid", text, "an RFC 4122 UUID")),
        other => Err(CodecError::invalid("uuid", other, "a UUID string")),
    }
}

/// `Duration` as whole milliseconds
pub mod duration_ms {
    use super::*;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let value = Value::deserialize(deserializer)?;
        decode_duration(&value, DurationUnit::Milliseconds).map_err(D::Error::custom)
    }
}

/// `Duration` as whole seconds
pub mod duration_secs {
    use super::*;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let value = Value::deserialize(deserializer)?;
        decode_duration(&value, DurationUnit::Seconds).map_err(D::Error::custom)
    }
}

/// `DateTime<Utc>` as RFC 3339, the field is required
pub mod instant {
    use super::*;
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        encode_instant(Some(instant)).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        decode_instant(&value)
            .and_then(|instant| instant.ok_or_else(|| CodecError::missing("time")))
            .map_err(D::Error::custom)
    }
}

/// `Option<DateTime<Utc>>` as RFC 3339, empty strings decode to `None`
pub mod instant_opt {
    use super::*;
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        instant: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        encode_instant(instant.as_ref()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        decode_instant(&value).map_err(D::Error::custom)
    }
}

/// `Option<Url>`, `None` is `null` and empty strings decode to `None`
pub mod url_opt {
    use super::*;
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(url: &Option<Url>, serializer: S) -> Result<S::Ok, S::Error> {
        encode_url(url.as_ref()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Url>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        decode_url(&value).map_err(D::Error::custom)
    }
}

/// `Option<Uuid>`, the nil UUID and empty strings decode to `None`
pub mod uuid_opt {
    use super::*;
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(id: &Option<Uuid>, serializer: S) -> Result<S::Ok, S::Error> {
        id.as_ref().and_then(encode_uuid).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Uuid>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        decode_uuid(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_duration_millisecond_precision() {
        for millis in [0_u64, 1, 999, 15_000, 86_400_001, u32::MAX as u64] {
            let duration = Duration::from_millis(millis);
            let wire = encode_duration(duration, DurationUnit::Milliseconds);
            assert_eq!(wire, json!(millis));
            assert_eq!(
                decode_duration(&wire, DurationUnit::Milliseconds).unwrap(),
                duration
            );
        }
    }

    #[test]
    fn test_duration_seconds() {
        let wire = encode_duration(Duration::from_secs(30 * 60), DurationUnit::Seconds);
        assert_eq!(wire, json!(1800));
        assert_eq!(
            decode_duration(&json!(900), DurationUnit::Seconds).unwrap(),
            Duration::from_secs(900)
        );
    }

    #[test]
    fn test_duration_rejects_negative_and_text() {
        let err = decode_duration(&json!(-5), DurationUnit::Milliseconds).unwrap_err();
        assert!(err.is_argument_invalid());

        let err = decode_duration(&json!("15000"), DurationUnit::Milliseconds).unwrap_err();
        assert!(err.is_argument_invalid());

        let err = decode_duration(&json!(1.5), DurationUnit::Seconds).unwrap_err();
        assert!(err.is_argument_invalid());
    }

    #[test]
    fn test_iso8601_format() {
        assert_eq!(format_iso8601(Duration::ZERO), "PT0S");
        assert_eq!(format_iso8601(Duration::from_secs(90 * 60)), "PT1H30M");
        assert_eq!(format_iso8601(Duration::from_millis(1_500)), "PT1.5S");
        assert_eq!(
            format_iso8601(Duration::from_secs(86_400 + 5)),
            "P1DT5S"
        );
        assert_eq!(format_iso8601(Duration::from_secs(2 * 86_400)), "P2D");
    }

    #[test]
    fn test_iso8601_parse() {
        assert_eq!(parse_iso8601("PT1H30M").unwrap(), Duration::from_secs(5_400));
        assert_eq!(parse_iso8601("PT0.25S").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_iso8601("P1W").unwrap(), Duration::from_secs(7 * 86_400));
        assert_eq!(parse_iso8601("P1DT1S").unwrap(), Duration::from_secs(86_401));

        for bad in ["", "P", "PT", "1H", "P1M", "P1Y", "PT1X", "PT5", "PTT1S"] {
            assert!(parse_iso8601(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_iso8601_survives_formatting() {
        for millis in [1_u64, 1_000, 61_001, 3_600_000, 90_061_500] {
            let duration = Duration::from_millis(millis);
            assert_eq!(parse_iso8601(&format_iso8601(duration)).unwrap(), duration);
        }
    }

    #[test]
    fn test_instant() {
        let instant = decode_instant(&json!("2025-05-30T14:00:00+02:00"))
            .unwrap()
            .unwrap();
        assert_eq!(encode_instant(Some(&instant)), json!("2025-05-30T12:00:00Z"));
        assert_eq!(decode_instant(&json!("")).unwrap(), None);
        assert!(decode_instant(&json!("yesterday")).is_err());
    }

    #[test]
    fn test_url() {
        assert_eq!(decode_url(&json!("")).unwrap(), None);
        assert_eq!(decode_url(&Value::Null).unwrap(), None);
        assert_eq!(encode_url(None), Value::Null);

        let url = decode_url(&json!("https://www.acme.com/image1.png"))
            .unwrap()
            .unwrap();
        assert_eq!(encode_url(Some(&url)), json!("https://www.acme.com/image1.png"));

        let err = decode_url(&json!("not a url")).unwrap_err();
        assert!(err.is_argument_invalid());
    }

    #[test]
    fn test_uuid() {
        let id = Uuid::parse_str("AA06A6FC-1FDF-4E59-B8A1-DF3CA44F523E").unwrap();
        assert_eq!(
            encode_uuid(&id).as_deref(),
            Some("aa06a6fc-1fdf-4e59-b8a1-df3ca44f523e")
        );
        assert_eq!(encode_uuid(&Uuid::nil()), None);
        assert_eq!(
            decode_uuid(&json!("00000000-0000-0000-0000-000000000000")).unwrap(),
            None
        );
        assert!(decode_uuid(&json!("1234")).unwrap_err().is_argument_invalid());
    }
}
