//! The immutable type configuration shared by related schemas

use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::debug;

use super::conversions::{StringConversion, default_string_conversions};
use crate::error::{Error, Result};
use crate::properties::{
    BooleanProperty, DateProperty, DateTimeProperty, DecimalProperty, DictProperty, FloatProperty,
    IntegerProperty, ListProperty, Property, SetProperty, StringProperty, TimeProperty, boxed,
};
use crate::value::{Value, ValueKind};

/// Constructor for the property that governs a native kind
pub type PropertyCtor = fn() -> Box<dyn Property>;

static DEFAULT_TYPE_CONFIG: Lazy<Arc<TypeConfig>> = Lazy::new(|| Arc::new(TypeConfig::default()));

fn default_properties() -> Vec<(ValueKind, PropertyCtor)> {
    vec![
        (ValueKind::Decimal, boxed::<DecimalProperty> as PropertyCtor),
        (ValueKind::DateTime, boxed::<DateTimeProperty>),
        (ValueKind::Date, boxed::<DateProperty>),
        (ValueKind::Time, boxed::<TimeProperty>),
        (ValueKind::String, boxed::<StringProperty>),
        (ValueKind::Bool, boxed::<BooleanProperty>),
        (ValueKind::Integer, boxed::<IntegerProperty>),
        (ValueKind::Float, boxed::<FloatProperty>),
        (ValueKind::List, boxed::<ListProperty>),
        (ValueKind::Dict, boxed::<DictProperty>),
        (ValueKind::Set, boxed::<SetProperty>),
    ]
}

/// Kind → property mapping plus string inference rules
#[derive(Debug, Clone)]
pub struct TypeConfig {
    properties: Vec<(ValueKind, PropertyCtor)>,
    string_conversions: Vec<StringConversion>,
    strict_string_conversions: bool,
}

impl Default for TypeConfig {
    fn default() -> Self {
        Self {
            properties: default_properties(),
            string_conversions: default_string_conversions(),
            strict_string_conversions: false,
        }
    }
}

impl TypeConfig {
    /// Create a config from explicit parts
    pub fn new(
        properties: Vec<(ValueKind, PropertyCtor)>,
        string_conversions: Vec<StringConversion>,
    ) -> Self {
        Self {
            properties,
            string_conversions,
            strict_string_conversions: false,
        }
    }

    /// The process-wide default config
    pub fn shared_default() -> Arc<TypeConfig> {
        Arc::clone(&DEFAULT_TYPE_CONFIG)
    }

    /// Create a builder starting from an empty config
    pub fn builder() -> TypeConfigBuilder {
        TypeConfigBuilder::default()
    }

    pub fn properties(&self) -> &[(ValueKind, PropertyCtor)] {
        &self.properties
    }

    pub fn string_conversions(&self) -> &[StringConversion] {
        &self.string_conversions
    }

    pub fn strict_string_conversions(&self) -> bool {
        self.strict_string_conversions
    }

    /// A copy with the given parts fully replaced
    pub fn replace(
        &self,
        properties: Option<Vec<(ValueKind, PropertyCtor)>>,
        string_conversions: Option<Vec<StringConversion>>,
    ) -> TypeConfig {
        TypeConfig {
            properties: properties.unwrap_or_else(|| self.properties.clone()),
            string_conversions: string_conversions
                .unwrap_or_else(|| self.string_conversions.clone()),
            strict_string_conversions: self.strict_string_conversions,
        }
    }

    /// A copy with `properties` merged on top of this config's mapping
    ///
    /// Existing kinds keep their position; new kinds are appended.
    pub fn updated(
        &self,
        properties: Vec<(ValueKind, PropertyCtor)>,
        string_conversions: Option<Vec<StringConversion>>,
    ) -> TypeConfig {
        let mut merged = self.properties.clone();
        for (kind, ctor) in properties {
            match merged.iter_mut().find(|(k, _)| *k == kind) {
                Some(entry) => entry.1 = ctor,
                None => merged.push((kind, ctor)),
            }
        }
        self.replace(Some(merged), string_conversions)
    }

    /// A copy with converter failures turned into errors
    pub fn with_strict_string_conversions(&self, strict: bool) -> TypeConfig {
        TypeConfig {
            strict_string_conversions: strict,
            ..self.clone()
        }
    }

    /// Property constructor for `kind`: exact match first, then the first
    /// registered supertype in declaration order
    pub fn property_ctor(&self, kind: ValueKind) -> Option<PropertyCtor> {
        self.properties
            .iter()
            .find(|(k, _)| *k == kind)
            .or_else(|| self.properties.iter().find(|(k, _)| kind.is_a(*k)))
            .map(|(_, ctor)| *ctor)
    }

    pub fn recognizes(&self, kind: ValueKind) -> bool {
        self.property_ctor(kind).is_some()
    }

    /// Comma separated list of the registered kinds, for error messages
    pub fn allowed_kinds(&self) -> String {
        self.properties
            .iter()
            .map(|(kind, _)| kind.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Run the string rules against `value`
    ///
    /// Returns the converted value of the first matching rule. A failing
    /// converter leaves the string as it is, unless strict conversions are
    /// enabled.
    pub fn convert_string(&self, value: &str) -> Result<Option<Value>> {
        let Some(rule) = self.string_conversions.iter().find(|r| r.matches(value)) else {
            return Ok(None);
        };
        match rule.convert(value) {
            Ok(converted) => Ok(Some(converted)),
            Err(e) if self.strict_string_conversions => Err(e),
            Err(e) => {
                debug!(
                    "String {:?} matched {} but did not convert, keeping it as a string: {}",
                    value,
                    rule.pattern().as_str(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// Property governing `value`, bound to this config
    pub(crate) fn property_for_kind(
        self: &Arc<Self>,
        kind: ValueKind,
    ) -> Result<Option<Box<dyn Property>>> {
        let Some(ctor) = self.property_ctor(kind) else {
            return Ok(None);
        };
        let mut property = ctor();
        property.init_property("", self).map_err(Error::from)?;
        Ok(Some(property))
    }
}

/// Builder for [`TypeConfig`]
#[derive(Debug, Default)]
pub struct TypeConfigBuilder {
    properties: Vec<(ValueKind, PropertyCtor)>,
    string_conversions: Vec<StringConversion>,
    strict_string_conversions: bool,
}

impl TypeConfigBuilder {
    /// Start from the default mapping and rules
    pub fn from_defaults() -> Self {
        Self {
            properties: default_properties(),
            string_conversions: default_string_conversions(),
            strict_string_conversions: false,
        }
    }

    /// Map `kind` to `ctor`, replacing an earlier mapping for the same kind
    pub fn property(mut self, kind: ValueKind, ctor: PropertyCtor) -> Self {
        match self.properties.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = ctor,
            None => self.properties.push((kind, ctor)),
        }
        self
    }

    /// Append a string rule
    pub fn string_conversion(mut self, conversion: StringConversion) -> Self {
        self.string_conversions.push(conversion);
        self
    }

    /// Drop every string rule
    pub fn no_string_conversions(mut self) -> Self {
        self.string_conversions.clear();
        self
    }

    /// Treat converter failures as errors instead of keeping the string
    pub fn strict_string_conversions(mut self, strict: bool) -> Self {
        self.strict_string_conversions = strict;
        self
    }

    pub fn build(self) -> TypeConfig {
        TypeConfig {
            properties: self.properties,
            string_conversions: self.string_conversions,
            strict_string_conversions: self.strict_string_conversions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lookup() {
        let config = TypeConfig::default();
        assert!(config.recognizes(ValueKind::String));
        assert!(config.recognizes(ValueKind::DateTime));
        assert!(!config.recognizes(ValueKind::Object));
        let property = config.property_ctor(ValueKind::Date).unwrap()();
        assert_eq!(property.type_name(), "DateProperty");
    }

    fn exact_datetime() -> Box<dyn Property> {
        Box::new(DateTimeProperty::new().exact())
    }

    #[test]
    fn test_supertype_fallback() {
        let config = TypeConfig::builder()
            .property(ValueKind::Date, boxed::<DateProperty>)
            .property(ValueKind::Integer, boxed::<IntegerProperty>)
            .build();
        let property = config.property_ctor(ValueKind::DateTime).unwrap()();
        assert_eq!(property.type_name(), "DateProperty");
        let property = config.property_ctor(ValueKind::Bool).unwrap()();
        assert_eq!(property.type_name(), "IntegerProperty");
        assert!(config.property_ctor(ValueKind::Float).is_none());
    }

    #[test]
    fn test_updated_keeps_positions() {
        let base = TypeConfig::default();
        let updated = base.updated(vec![(ValueKind::DateTime, exact_datetime as PropertyCtor)], None);
        assert_eq!(updated.properties().len(), base.properties().len());
        assert_eq!(updated.properties()[1].0, ValueKind::DateTime);

        let loose = serde_json::json!("2014-01-03T01:02:03Z");
        let exact = updated.property_ctor(ValueKind::DateTime).unwrap()();
        assert!(exact.wrap(&loose).is_err());
        // the original is untouched
        let original = base.property_ctor(ValueKind::DateTime).unwrap()();
        assert!(original.wrap(&loose).is_ok());
    }

    #[test]
    fn test_convert_string_advisory() {
        let config = TypeConfig::default();
        assert_eq!(config.convert_string("hello").unwrap(), None);
        // matches the time rule, but "1234" is not a time
        assert_eq!(config.convert_string("1234").unwrap(), None);
        let strict = config.with_strict_string_conversions(true);
        assert!(strict.convert_string("1234").is_err());
    }
}
