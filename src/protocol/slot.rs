//! Typed slot entities extracted from a bot conversation turn
//!
//! On the wire every entity is `{type, name, value}` or, for collections,
//! `{type, name, values}`. Values always travel as strings that parse back to
//! the typed value.

use std::{fmt, sync::OnceLock, time::Duration};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    codec::{serde_via_codec, Decode, Encode},
    config::CodecConfig,
};

use super::{
    error::{CodecError, CodecResult, MultiError},
    registry::TypeRegistry,
    scalar::{format_iso8601, parse_iso8601},
};

const MAX_NAME_LENGTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Boolean,
    BooleanCollection,
    Currency,
    CurrencyCollection,
    Datetime,
    DatetimeCollection,
    Decimal,
    DecimalCollection,
    Duration,
    DurationCollection,
    Integer,
    IntegerCollection,
    String,
    StringCollection,
}

impl SlotKind {
    pub const ALL: [SlotKind; 14] = [
        SlotKind::Boolean,
        SlotKind::BooleanCollection,
        SlotKind::Currency,
        SlotKind::CurrencyCollection,
        SlotKind::Datetime,
        SlotKind::DatetimeCollection,
        SlotKind::Decimal,
        SlotKind::DecimalCollection,
        SlotKind::Duration,
        SlotKind::DurationCollection,
        SlotKind::Integer,
        SlotKind::IntegerCollection,
        SlotKind::String,
        SlotKind::StringCollection,
    ];

    /// Wire discriminator
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKind::Boolean => "Boolean",
            SlotKind::BooleanCollection => "BooleanCollection",
            SlotKind::Currency => "Currency",
            SlotKind::CurrencyCollection => "CurrencyCollection",
            SlotKind::Datetime => "Datetime",
            SlotKind::DatetimeCollection => "DatetimeCollection",
            SlotKind::Decimal => "Decimal",
            SlotKind::DecimalCollection => "DecimalCollection",
            SlotKind::Duration => "Duration",
            SlotKind::DurationCollection => "DurationCollection",
            SlotKind::Integer => "Integer",
            SlotKind::IntegerCollection => "IntegerCollection",
            SlotKind::String => "String",
            SlotKind::StringCollection => "StringCollection",
        }
    }

    pub fn is_collection(&self) -> bool {
        self.as_str().ends_with("Collection")
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An amount of money in an ISO 4217 currency
#[derive(Debug, Clone, PartialEq)]
pub struct Currency {
    pub amount: f64,
    pub code: String,
}

impl Currency {
    pub fn new(amount: f64, code: impl Into<String>) -> Self {
        Self {
            amount,
            code: code.into(),
        }
    }

    /// Amounts carry at most two decimals and codes are three uppercase letters
    pub fn validate(&self, field: &str) -> CodecResult<()> {
        let mut merr = MultiError::new();
        let cents = (self.amount * 100.0).round();
        if !self.amount.is_finite() || cents / 100.0 != self.amount {
            merr.push(CodecError::invalid(
                format!("{field}.amount"),
                self.amount,
                "a finite amount with at most two decimals",
            ));
        }
        if self.code.len() != 3 || !self.code.bytes().all(|byte| byte.is_ascii_uppercase()) {
            merr.push(CodecError::invalid(
                format!("{field}.code"),
                &self.code,
                "an ISO 4217 currency code",
            ));
        }
        merr.into_result()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.code)
    }
}

#[derive(Serialize, Deserialize)]
struct CurrencyWire {
    amount: f64,
    code: String,
}

/// Element type of a slot value
trait SlotScalar: Sized {
    const EXPECTED: &'static str;

    /// Parse user input
    fn parse_input(raw: &str) -> Option<Self>;

    /// Parse the wire string
    fn parse_wire(raw: &str) -> Option<Self> {
        Self::parse_input(raw)
    }

    fn to_wire(&self) -> String;

    /// Human form accepted back by [`parse_input`](Self::parse_input)
    fn format(&self) -> String {
        self.to_wire()
    }
}

impl SlotScalar for bool {
    const EXPECTED: &'static str = "a boolean";

    fn parse_input(raw: &str) -> Option<Self> {
        match raw {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
            _ => None,
        }
    }

    fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl SlotScalar for i64 {
    const EXPECTED: &'static str = "an integer";

    fn parse_input(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }

    fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl SlotScalar for f64 {
    const EXPECTED: &'static str = "a decimal";

    fn parse_input(raw: &str) -> Option<Self> {
        raw.parse::<f64>().ok().filter(|value| value.is_finite())
    }

    fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl SlotScalar for Duration {
    const EXPECTED: &'static str = "an ISO-8601 duration";

    fn parse_input(raw: &str) -> Option<Self> {
        parse_iso8601(raw).ok()
    }

    fn to_wire(&self) -> String {
        format_iso8601(*self)
    }
}

impl SlotScalar for DateTime<Utc> {
    const EXPECTED: &'static str = "an RFC 3339 timestamp";

    fn parse_input(raw: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|instant| instant.with_timezone(&Utc))
    }

    fn to_wire(&self) -> String {
        self.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

impl SlotScalar for Currency {
    const EXPECTED: &'static str = "an amount followed by a currency code";

    fn parse_input(raw: &str) -> Option<Self> {
        let mut parts = raw.split_whitespace();
        let amount = parts.next()?.parse::<f64>().ok()?;
        let code = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        let currency = Currency::new(amount, code);
        currency.validate("value").is_ok().then_some(currency)
    }

    fn parse_wire(raw: &str) -> Option<Self> {
        let wire = serde_json::from_str::<CurrencyWire>(raw).ok()?;
        let currency = Currency::new(wire.amount, wire.code);
        currency.validate("value").is_ok().then_some(currency)
    }

    fn to_wire(&self) -> String {
        let wire = CurrencyWire {
            amount: self.amount,
            code: self.code.clone(),
        };
        // a plain f64 and String never fail to serialize
        serde_json::to_string(&wire).unwrap_or_default()
    }

    fn format(&self) -> String {
        self.to_string()
    }
}

impl SlotScalar for String {
    const EXPECTED: &'static str = "a string";

    fn parse_input(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }

    fn to_wire(&self) -> String {
        self.clone()
    }
}

fn one<T: SlotScalar>(raw: &str, parse: fn(&str) -> Option<T>) -> CodecResult<T> {
    parse(raw.trim()).ok_or_else(|| CodecError::invalid("value", raw, T::EXPECTED))
}

fn many<T: SlotScalar>(raw: &str) -> CodecResult<Vec<T>> {
    raw.split(',')
        .enumerate()
        .map(|(index, item)| {
            T::parse_input(item.trim())
                .ok_or_else(|| CodecError::invalid(format!("value[{index}]"), raw, T::EXPECTED))
        })
        .collect()
}

fn many_wire<T: SlotScalar>(raws: &[String]) -> CodecResult<Vec<T>> {
    raws.iter()
        .enumerate()
        .map(|(index, raw)| {
            T::parse_wire(raw)
                .ok_or_else(|| CodecError::invalid(format!("values[{index}]"), raw, T::EXPECTED))
        })
        .collect()
}

fn join<T: SlotScalar>(values: &[T]) -> String {
    values.iter().map(T::format).collect::<Vec<_>>().join(",")
}

fn wires<T: SlotScalar>(values: &[T]) -> Vec<String> {
    values.iter().map(T::to_wire).collect()
}

/// Typed value of a slot entity
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    Boolean(bool),
    BooleanCollection(Vec<bool>),
    Currency(Currency),
    CurrencyCollection(Vec<Currency>),
    Datetime(DateTime<Utc>),
    DatetimeCollection(Vec<DateTime<Utc>>),
    Decimal(f64),
    DecimalCollection(Vec<f64>),
    Duration(Duration),
    DurationCollection(Vec<Duration>),
    Integer(i64),
    IntegerCollection(Vec<i64>),
    String(String),
    StringCollection(Vec<String>),
}

/// `value` or `values` as carried on the wire
enum WireValue {
    One(String),
    Many(Vec<String>),
}

impl SlotValue {
    pub fn kind(&self) -> SlotKind {
        match self {
            SlotValue::Boolean(_) => SlotKind::Boolean,
            SlotValue::BooleanCollection(_) => SlotKind::BooleanCollection,
            SlotValue::Currency(_) => SlotKind::Currency,
            SlotValue::CurrencyCollection(_) => SlotKind::CurrencyCollection,
            SlotValue::Datetime(_) => SlotKind::Datetime,
            SlotValue::DatetimeCollection(_) => SlotKind::DatetimeCollection,
            SlotValue::Decimal(_) => SlotKind::Decimal,
            SlotValue::DecimalCollection(_) => SlotKind::DecimalCollection,
            SlotValue::Duration(_) => SlotKind::Duration,
            SlotValue::DurationCollection(_) => SlotKind::DurationCollection,
            SlotValue::Integer(_) => SlotKind::Integer,
            SlotValue::IntegerCollection(_) => SlotKind::IntegerCollection,
            SlotValue::String(_) => SlotKind::String,
            SlotValue::StringCollection(_) => SlotKind::StringCollection,
        }
    }

    /// Parse user input for `kind`, collections are comma separated
    pub fn parse(kind: SlotKind, raw: &str) -> CodecResult<Self> {
        let value = match kind {
            SlotKind::Boolean => SlotValue::Boolean(one(raw, bool::parse_input)?),
            SlotKind::BooleanCollection => SlotValue::BooleanCollection(many(raw)?),
            SlotKind::Currency => SlotValue::Currency(one(raw, Currency::parse_input)?),
            SlotKind::CurrencyCollection => SlotValue::CurrencyCollection(many(raw)?),
            SlotKind::Datetime => SlotValue::Datetime(one(raw, DateTime::<Utc>::parse_input)?),
            SlotKind::DatetimeCollection => SlotValue::DatetimeCollection(many(raw)?),
            SlotKind::Decimal => SlotValue::Decimal(one(raw, f64::parse_input)?),
            SlotKind::DecimalCollection => SlotValue::DecimalCollection(many(raw)?),
            SlotKind::Duration => SlotValue::Duration(one(raw, Duration::parse_input)?),
            SlotKind::DurationCollection => SlotValue::DurationCollection(many(raw)?),
            SlotKind::Integer => SlotValue::Integer(one(raw, i64::parse_input)?),
            SlotKind::IntegerCollection => SlotValue::IntegerCollection(many(raw)?),
            SlotKind::String => SlotValue::String(raw.to_string()),
            SlotKind::StringCollection => SlotValue::StringCollection(many(raw)?),
        };
        Ok(value)
    }

    /// Human form, parsing it back yields the same value
    pub fn format(&self) -> String {
        match self {
            SlotValue::Boolean(value) => SlotScalar::format(value),
            SlotValue::BooleanCollection(values) => join(values),
            SlotValue::Currency(value) => SlotScalar::format(value),
            SlotValue::CurrencyCollection(values) => join(values),
            SlotValue::Datetime(value) => SlotScalar::format(value),
            SlotValue::DatetimeCollection(values) => join(values),
            SlotValue::Decimal(value) => SlotScalar::format(value),
            SlotValue::DecimalCollection(values) => join(values),
            SlotValue::Duration(value) => SlotScalar::format(value),
            SlotValue::DurationCollection(values) => join(values),
            SlotValue::Integer(value) => SlotScalar::format(value),
            SlotValue::IntegerCollection(values) => join(values),
            SlotValue::String(value) => value.clone(),
            SlotValue::StringCollection(values) => join(values),
        }
    }

    fn to_wire(&self) -> WireValue {
        match self {
            SlotValue::Boolean(value) => WireValue::One(value.to_wire()),
            SlotValue::BooleanCollection(values) => WireValue::Many(wires(values)),
            SlotValue::Currency(value) => WireValue::One(value.to_wire()),
            SlotValue::CurrencyCollection(values) => WireValue::Many(wires(values)),
            SlotValue::Datetime(value) => WireValue::One(value.to_wire()),
            SlotValue::DatetimeCollection(values) => WireValue::Many(wires(values)),
            SlotValue::Decimal(value) => WireValue::One(value.to_wire()),
            SlotValue::DecimalCollection(values) => WireValue::Many(wires(values)),
            SlotValue::Duration(value) => WireValue::One(value.to_wire()),
            SlotValue::DurationCollection(values) => WireValue::Many(wires(values)),
            SlotValue::Integer(value) => WireValue::One(value.to_wire()),
            SlotValue::IntegerCollection(values) => WireValue::Many(wires(values)),
            SlotValue::String(value) => WireValue::One(value.clone()),
            SlotValue::StringCollection(values) => WireValue::Many(values.clone()),
        }
    }

    fn from_wire(kind: SlotKind, wire: WireValue) -> CodecResult<Self> {
        let value = match (kind, wire) {
            (SlotKind::Boolean, WireValue::One(raw)) => SlotValue::Boolean(one(&raw, bool::parse_wire)?),
            (SlotKind::BooleanCollection, WireValue::Many(raws)) => {
                SlotValue::BooleanCollection(many_wire(&raws)?)
            }
            (SlotKind::Currency, WireValue::One(raw)) => {
                SlotValue::Currency(one(&raw, Currency::parse_wire)?)
            }
            (SlotKind::CurrencyCollection, WireValue::Many(raws)) => {
                SlotValue::CurrencyCollection(many_wire(&raws)?)
            }
            (SlotKind::Datetime, WireValue::One(raw)) => {
                SlotValue::Datetime(one(&raw, DateTime::<Utc>::parse_wire)?)
            }
            (SlotKind::DatetimeCollection, WireValue::Many(raws)) => {
                SlotValue::DatetimeCollection(many_wire(&raws)?)
            }
            (SlotKind::Decimal, WireValue::One(raw)) => SlotValue::Decimal(one(&raw, f64::parse_wire)?),
            (SlotKind::DecimalCollection, WireValue::Many(raws)) => {
                SlotValue::DecimalCollection(many_wire(&raws)?)
            }
            (SlotKind::Duration, WireValue::One(raw)) => {
                SlotValue::Duration(one(&raw, Duration::parse_wire)?)
            }
            (SlotKind::DurationCollection, WireValue::Many(raws)) => {
                SlotValue::DurationCollection(many_wire(&raws)?)
            }
            (SlotKind::Integer, WireValue::One(raw)) => SlotValue::Integer(one(&raw, i64::parse_wire)?),
            (SlotKind::IntegerCollection, WireValue::Many(raws)) => {
                SlotValue::IntegerCollection(many_wire(&raws)?)
            }
            (SlotKind::String, WireValue::One(raw)) => SlotValue::String(raw),
            (SlotKind::StringCollection, WireValue::Many(raws)) => SlotValue::StringCollection(raws),
            (kind, _) if kind.is_collection() => return Err(CodecError::missing("values")),
            _ => return Err(CodecError::missing("value")),
        };
        Ok(value)
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// A named, typed slot
#[derive(Debug, Clone, PartialEq)]
pub struct SlotEntity {
    pub name: String,
    pub value: SlotValue,
}

#[derive(Serialize, Deserialize)]
struct SlotEntityWire {
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    values: Option<Vec<String>>,
}

fn registry() -> &'static TypeRegistry<SlotEntity> {
    static REGISTRY: OnceLock<TypeRegistry<SlotEntity>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        SlotKind::ALL
            .into_iter()
            .fold(TypeRegistry::new("slot entity", "type"), |registry, kind| {
                registry.with(kind.as_str(), move |value, _| SlotEntity::decode_as(kind, value))
            })
    })
}

impl SlotEntity {
    pub fn new(name: impl Into<String>, value: SlotValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Parse `raw` into a new entity of the given kind
    pub fn parse(kind: SlotKind, name: impl Into<String>, raw: &str) -> CodecResult<Self> {
        Ok(Self::new(name, SlotValue::parse(kind, raw)?))
    }

    /// Parse `raw` into a new entity with this entity's name and kind
    pub fn parse_value(&self, raw: &str) -> CodecResult<Self> {
        Self::parse(self.kind(), self.name.clone(), raw)
    }

    pub fn kind(&self) -> SlotKind {
        self.value.kind()
    }

    pub fn format(&self) -> String {
        self.value.format()
    }

    pub fn validate(&self) -> CodecResult<()> {
        let mut merr = MultiError::new();
        if self.name.is_empty() {
            merr.push(CodecError::missing("entity.name"));
        }
        let length = self.name.chars().count();
        if length > MAX_NAME_LENGTH {
            merr.push(CodecError::invalid(
                "entity.name",
                length,
                "must be less than 100 characters",
            ));
        }
        match &self.value {
            SlotValue::Currency(currency) => merr.check(currency.validate("entity.value")),
            SlotValue::CurrencyCollection(currencies) => {
                for (index, currency) in currencies.iter().enumerate() {
                    merr.check(currency.validate(&format!("entity.values[{index}]")));
                }
            }
            _ => {}
        }
        merr.into_result()
    }

    /// Discriminators known to the slot entity registry
    pub fn supported_types() -> Vec<&'static str> {
        registry().supported_types()
    }

    fn decode_as(kind: SlotKind, value: Value) -> CodecResult<Self> {
        let wire: SlotEntityWire = serde_json::from_value(value)?;
        let raw = match (wire.value, wire.values) {
            (_, Some(values)) if kind.is_collection() => WireValue::Many(values),
            (Some(value), _) if !kind.is_collection() => WireValue::One(value),
            (_, _) if kind.is_collection() => return Err(CodecError::missing("values")),
            _ => return Err(CodecError::missing("value")),
        };
        let entity = Self {
            name: wire.name,
            value: SlotValue::from_wire(kind, raw)?,
        };
        entity.validate()?;
        Ok(entity)
    }
}

impl Encode for SlotEntity {
    fn to_value(&self) -> CodecResult<Value> {
        self.validate().map_err(CodecError::marshal)?;
        let mut object = Map::new();
        object.insert("type".to_string(), Value::from(self.kind().as_str()));
        object.insert("name".to_string(), Value::from(self.name.clone()));
        match self.value.to_wire() {
            WireValue::One(value) => object.insert("value".to_string(), Value::from(value)),
            WireValue::Many(values) => object.insert("values".to_string(), Value::from(values)),
        };
        Ok(Value::Object(object))
    }
}

impl Decode for SlotEntity {
    fn from_value_with(value: Value, config: &CodecConfig) -> CodecResult<Self> {
        registry().unmarshal(value, config)
    }
}

serde_via_codec!(SlotEntity);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_currency_wire_value() {
        let entity = SlotEntity::new("price", SlotValue::Currency(Currency::new(12.5, "EUR")));
        let value = entity.to_value().unwrap();
        assert_eq!(
            value,
            json!({"type": "Currency", "name": "price", "value": r#"{"amount":12.5,"code":"EUR"}"#})
        );
        assert_eq!(SlotEntity::from_value(value).unwrap(), entity);
        assert_eq!(entity.format(), "12.50 EUR");
    }

    #[test]
    fn test_currency_rejects_unrepresentable_values() {
        let err = SlotEntity::new("price", SlotValue::Currency(Currency::new(12.345, "EUR")))
            .to_value()
            .unwrap_err();
        assert!(err.is_json_marshal());
        assert!(err.is_argument_invalid());

        for currency in [
            Currency::new(f64::NAN, "EUR"),
            Currency::new(1.0, r#"E"R"#),
            Currency::new(1.0, "eur"),
            Currency::new(1.0, "EURO"),
        ] {
            let entity = SlotEntity::new("price", SlotValue::CurrencyCollection(vec![currency]));
            assert!(entity.validate().unwrap_err().is_argument_invalid());
        }

        assert!(SlotValue::parse(SlotKind::Currency, "12.345 EUR").is_err());
        assert!(SlotValue::parse(SlotKind::Currency, "12.34 eur").is_err());

        let wire = json!({"type": "Currency", "name": "price", "value": r#"{"amount":1.005,"code":"EUR"}"#});
        assert!(SlotEntity::from_value(wire).unwrap_err().is_argument_invalid());
    }

    #[test]
    fn test_currency_wire_value_is_valid_json() {
        let entity = SlotEntity::new("price", SlotValue::Currency(Currency::new(3.49, "USD")));
        let value = entity.to_value().unwrap();
        let inner: Value = serde_json::from_str(value["value"].as_str().unwrap()).unwrap();
        assert_eq!(inner, json!({"amount": 3.49, "code": "USD"}));
        assert_eq!(SlotEntity::from_value(value).unwrap(), entity);
        assert_eq!(SlotValue::parse(SlotKind::Currency, &entity.format()).unwrap(), entity.value);
    }

    #[test]
    fn test_duration_wire_value_is_iso8601() {
        let entity = SlotEntity::new("wait", SlotValue::Duration(Duration::from_secs(5_400)));
        let value = entity.to_value().unwrap();
        assert_eq!(value["value"], "PT1H30M");
        assert_eq!(SlotEntity::from_value(value).unwrap(), entity);
    }

    #[test]
    fn test_collections_use_values() {
        let entity = SlotEntity::parse(SlotKind::IntegerCollection, "counts", "1, 2,3").unwrap();
        assert_eq!(entity.value, SlotValue::IntegerCollection(vec![1, 2, 3]));
        let value = entity.to_value().unwrap();
        assert_eq!(value["values"], json!(["1", "2", "3"]));
        assert!(value.get("value").is_none());
    }

    #[test]
    fn test_parse_format_identity() {
        let samples = [
            (SlotKind::Boolean, "true"),
            (SlotKind::BooleanCollection, "true,false"),
            (SlotKind::Currency, "3.99 USD"),
            (SlotKind::CurrencyCollection, "1.00 EUR,2.50 JPY"),
            (SlotKind::Datetime, "2025-05-30T12:00:00Z"),
            (SlotKind::DatetimeCollection, "2025-05-30T12:00:00Z,2025-06-30T13:00:00Z"),
            (SlotKind::Decimal, "3.1415"),
            (SlotKind::DecimalCollection, "0.5,-2.25"),
            (SlotKind::Duration, "PT15M"),
            (SlotKind::DurationCollection, "PT1S,P1DT2H"),
            (SlotKind::Integer, "-42"),
            (SlotKind::IntegerCollection, "1,2,3"),
            (SlotKind::String, "hello world"),
            (SlotKind::StringCollection, "red,green"),
        ];
        for (kind, raw) in samples {
            let value = SlotValue::parse(kind, raw).unwrap();
            assert_eq!(value.kind(), kind);
            assert_eq!(SlotValue::parse(kind, &value.format()).unwrap(), value, "{kind}");

            let entity = SlotEntity::new("slot", value);
            let decoded = SlotEntity::from_value(entity.to_value().unwrap()).unwrap();
            assert_eq!(decoded, entity, "{kind}");
        }
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let err = SlotValue::parse(SlotKind::Integer, "forty-two").unwrap_err();
        assert!(err.is_argument_invalid());

        let err = SlotValue::parse(SlotKind::BooleanCollection, "true,maybe").unwrap_err();
        assert!(err.to_string().contains("value[1]"));

        assert!(SlotValue::parse(SlotKind::Currency, "12.50").is_err());
    }

    #[test]
    fn test_name_validation() {
        let err = SlotEntity::new("", SlotValue::Integer(1)).to_value().unwrap_err();
        assert!(err.is_json_marshal());
        assert_eq!(err.missing_argument(), Some("entity.name"));

        let err = SlotEntity::new("n".repeat(101), SlotValue::Integer(1))
            .to_value()
            .unwrap_err();
        assert!(err.is_argument_invalid());

        let err = SlotEntity::from_value(json!({"type": "Boolean", "name": "", "value": "true"}))
            .unwrap_err();
        assert!(err.is_json_unmarshal());
        assert!(err.is_argument_missing());
    }

    #[test]
    fn test_unknown_slot_type() {
        let err = SlotEntity::from_value(json!({"type": "Color", "name": "c", "value": "red"}))
            .unwrap_err();
        assert!(err.is_invalid_type());
        assert_eq!(SlotEntity::supported_types().len(), 14);
    }
}
