//! Discriminator-keyed registries for polymorphic families
//!
//! Each family (content, card action, slot entity, open message, open
//! message event, notification topic) owns one registry. Registries are built
//! once behind a `OnceLock` and only read afterwards, so lookups need no lock.

use std::{collections::BTreeMap, fmt};

use serde_json::Value;

use crate::config::CodecConfig;

use super::error::{CodecError, CodecResult};

/// Decoder for one variant of a family
pub type Decoder<T> = Box<dyn Fn(Value, &CodecConfig) -> CodecResult<T> + Send + Sync>;

/// Maps discriminator strings to variant decoders
pub struct TypeRegistry<T> {
    family: &'static str,
    discriminator: &'static str,
    decoders: BTreeMap<&'static str, Decoder<T>>,
}

impl<T> TypeRegistry<T> {
    /// Create an empty registry for a family keyed on `discriminator`
    pub fn new(family: &'static str, discriminator: &'static str) -> Self {
        Self {
            family,
            discriminator,
            decoders: BTreeMap::new(),
        }
    }

    /// Index a decoder under its discriminator string
    pub fn register<F>(&mut self, name: &'static str, decoder: F) -> CodecResult<()>
    where
        F: Fn(Value, &CodecConfig) -> CodecResult<T> + Send + Sync + 'static,
    {
        if self.decoders.contains_key(name) {
            return Err(CodecError::DuplicateRegistration {
                family: self.family.to_string(),
                name: name.to_string(),
            });
        }
        self.decoders.insert(name, Box::new(decoder));
        Ok(())
    }

    /// Builder form of [`register`](Self::register) used by static initialisers
    ///
    /// # Panics
    ///
    /// Panics when `name` is already registered, a programming error that
    /// must surface at startup.
    pub fn with<F>(mut self, name: &'static str, decoder: F) -> Self
    where
        F: Fn(Value, &CodecConfig) -> CodecResult<T> + Send + Sync + 'static,
    {
        if let Err(err) = self.register(name, decoder) {
            panic!("{}", err);
        }
        self
    }

    pub fn family(&self) -> &'static str {
        self.family
    }

    pub fn discriminator(&self) -> &'static str {
        self.discriminator
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decoders.contains_key(name)
    }

    /// Registered discriminators, sorted
    pub fn supported_types(&self) -> Vec<&'static str> {
        self.decoders.keys().copied().collect()
    }

    /// Decode `value` by peeking at the family discriminator
    pub fn unmarshal(&self, value: Value, config: &CodecConfig) -> CodecResult<T> {
        let name = match value.get(self.discriminator) {
            Some(Value::String(name)) => name.clone(),
            Some(Value::Null) | None => {
                return Err(CodecError::unmarshal(CodecError::missing(self.discriminator)))
            }
            Some(other) => {
                return Err(CodecError::unmarshal(CodecError::invalid(
                    self.discriminator,
                    other,
                    "a string",
                )))
            }
        };
        self.unmarshal_as(&name, value, config)
    }

    /// Decode `value` as the variant registered under `name`
    pub fn unmarshal_as(&self, name: &str, value: Value, config: &CodecConfig) -> CodecResult<T> {
        match self.decoders.get(name) {
            Some(decoder) => decoder(value, config).map_err(CodecError::unmarshal),
            None => Err(CodecError::unmarshal(CodecError::invalid_type(
                name,
                &self.supported_types(),
            ))),
        }
    }

    /// Decode a list, dropping unknown variants when the configuration allows it
    pub fn unmarshal_list(&self, values: Vec<Value>, config: &CodecConfig) -> CodecResult<Vec<T>> {
        let mut items = Vec::with_capacity(values.len());
        for value in values {
            match self.unmarshal(value, config) {
                Ok(item) => items.push(item),
                Err(err) if config.ignores_unknown_keys() && err.is_invalid_type() => {
                    tracing::debug!(family = self.family, error = %err, "skipping unknown variant");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(items)
    }
}

impl<T> fmt::Debug for TypeRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("family", &self.family)
            .field("discriminator", &self.discriminator)
            .field("types", &self.supported_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::config::UnmarshalMode;

    use super::*;

    #[derive(Debug, PartialEq)]
    enum Shape {
        Circle(u64),
        Square(u64),
    }

    fn registry() -> TypeRegistry<Shape> {
        TypeRegistry::new("shape", "kind")
            .with("Square", |value, _| {
                Ok(Shape::Square(value["side"].as_u64().unwrap_or_default()))
            })
            .with("Circle", |value, _| {
                value["radius"]
                    .as_u64()
                    .map(Shape::Circle)
                    .ok_or_else(|| CodecError::missing("radius"))
            })
    }

    #[test]
    fn test_dispatch_on_discriminator() {
        let shape = registry()
            .unmarshal(json!({"kind": "Circle", "radius": 3}), &CodecConfig::default())
            .unwrap();
        assert_eq!(shape, Shape::Circle(3));
    }

    #[test]
    fn test_supported_types_are_sorted() {
        assert_eq!(registry().supported_types(), vec!["Circle", "Square"]);
    }

    #[test]
    fn test_missing_discriminator() {
        let err = registry()
            .unmarshal(json!({"radius": 3}), &CodecConfig::default())
            .unwrap_err();
        assert!(err.is_json_unmarshal());
        assert_eq!(err.missing_argument(), Some("kind"));
    }

    #[test]
    fn test_unknown_discriminator() {
        let err = registry()
            .unmarshal(json!({"kind": "Triangle"}), &CodecConfig::default())
            .unwrap_err();
        assert!(err.is_invalid_type());
        assert!(err.to_string().contains("Circle,Square"));
    }

    #[test]
    fn test_variant_errors_are_wrapped_once() {
        let err = registry()
            .unmarshal(json!({"kind": "Circle"}), &CodecConfig::default())
            .unwrap_err();
        match err {
            CodecError::JsonUnmarshal(inner) => {
                assert!(matches!(*inner, CodecError::ArgumentMissing(_)))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = registry();
        let err = registry
            .register("Circle", |_, _| Ok(Shape::Circle(0)))
            .unwrap_err();
        assert!(matches!(err, CodecError::DuplicateRegistration { .. }));
    }

    #[test]
    fn test_list_policy() {
        let values = vec![
            json!({"kind": "Square", "side": 2}),
            json!({"kind": "Hexagon"}),
            json!({"kind": "Circle", "radius": 1}),
        ];

        let strict = CodecConfig::default();
        assert!(registry()
            .unmarshal_list(values.clone(), &strict)
            .unwrap_err()
            .is_invalid_type());

        let lenient = CodecConfig::default().with_unmarshal_mode(UnmarshalMode::IgnoreUnknownKeys);
        let shapes = registry().unmarshal_list(values, &lenient).unwrap();
        assert_eq!(shapes, vec![Shape::Square(2), Shape::Circle(1)]);
    }

    #[test]
    fn test_lenient_mode_still_reports_missing_discriminator() {
        let lenient = CodecConfig::default().with_unmarshal_mode(UnmarshalMode::IgnoreUnknownKeys);
        let err = registry()
            .unmarshal_list(vec![json!({"side": 2})], &lenient)
            .unwrap_err();
        assert!(err.is_argument_missing());
    }
}
