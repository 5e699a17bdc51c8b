//! The registration pass that turns declarations into a [`Schema`]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use super::{Schema, SchemaOptions};
use crate::config::{PropertyCtor, StringConversion, TypeConfig};
use crate::error::SchemaError;
use crate::properties::{DefaultValue, Property};
use crate::value::{Value, ValueKind};

#[derive(Debug)]
enum Declaration {
    Property(Box<dyn Property>),
    /// Promoted through the type config, with the literal as default
    Literal(Value),
}

/// Collects field declarations and schema settings
///
/// ```
/// use docshape::{PropertyOptionsExt, Schema, StringProperty};
///
/// let person = Schema::builder("Person")
///     .property("first_name", StringProperty::new().named("first").required())
///     .literal("version", 1)
///     .build()
///     .unwrap();
/// assert_eq!(person.key_for_attr("first_name"), Some("first"));
/// assert_eq!(person.key_for_attr("version"), Some("version"));
/// ```
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    declarations: Vec<(String, Declaration)>,
    bases: Vec<Arc<Schema>>,
    replace_properties: Option<Vec<(ValueKind, PropertyCtor)>>,
    update_properties: Option<Vec<(ValueKind, PropertyCtor)>>,
    string_conversions: Option<Vec<StringConversion>>,
    strict_string_conversions: Option<bool>,
    reserved: BTreeSet<String>,
    allow_dynamic_properties: Option<bool>,
    validate_required_lazily: Option<bool>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declarations: Vec::new(),
            bases: Vec::new(),
            replace_properties: None,
            update_properties: None,
            string_conversions: None,
            strict_string_conversions: None,
            reserved: BTreeSet::new(),
            allow_dynamic_properties: None,
            validate_required_lazily: None,
        }
    }

    /// Declare `attr` with an explicit property
    pub fn property(mut self, attr: impl Into<String>, property: impl Property + 'static) -> Self {
        self.declarations
            .push((attr.into(), Declaration::Property(Box::new(property))));
        self
    }

    /// Declare `attr` from a literal value
    ///
    /// The property registered for the literal's kind is used, with the
    /// literal as its default.
    pub fn literal(mut self, attr: impl Into<String>, value: impl Into<Value>) -> Self {
        self.declarations
            .push((attr.into(), Declaration::Literal(value.into())));
        self
    }

    /// Inherit from `base`; the first base decides type config and options
    pub fn extends(mut self, base: &Arc<Schema>) -> Self {
        self.bases.push(Arc::clone(base));
        self
    }

    /// Replace the inherited kind → property mapping
    pub fn properties(mut self, properties: Vec<(ValueKind, PropertyCtor)>) -> Self {
        self.replace_properties = Some(properties);
        self
    }

    /// Merge into the inherited kind → property mapping
    pub fn update_properties(mut self, properties: Vec<(ValueKind, PropertyCtor)>) -> Self {
        self.update_properties = Some(properties);
        self
    }

    /// Replace the inherited string rules
    pub fn string_conversions(mut self, conversions: Vec<StringConversion>) -> Self {
        self.string_conversions = Some(conversions);
        self
    }

    pub fn strict_string_conversions(mut self, strict: bool) -> Self {
        self.strict_string_conversions = Some(strict);
        self
    }

    /// Keep `attr` out of reach of dynamic properties
    pub fn reserve(mut self, attr: impl Into<String>) -> Self {
        self.reserved.insert(attr.into());
        self
    }

    pub fn allow_dynamic_properties(mut self, allow: bool) -> Self {
        self.allow_dynamic_properties = Some(allow);
        self
    }

    pub fn validate_required_lazily(mut self, lazily: bool) -> Self {
        self.validate_required_lazily = Some(lazily);
        self
    }

    /// Set both switches at once
    pub fn options(mut self, options: SchemaOptions) -> Self {
        self.allow_dynamic_properties = Some(options.allow_dynamic_properties);
        self.validate_required_lazily = Some(options.validate_required_lazily);
        self
    }

    fn resolve_type_config(&mut self) -> Result<Arc<TypeConfig>, SchemaError> {
        let base = self
            .bases
            .first()
            .map(|b| Arc::clone(b.type_config()))
            .unwrap_or_else(TypeConfig::shared_default);
        let conversions = self.string_conversions.take();
        let derived = match (self.replace_properties.take(), self.update_properties.take()) {
            (Some(_), Some(_)) => return Err(SchemaError::ConflictingTypeConfig(self.name.clone())),
            (Some(properties), None) => Some(base.replace(Some(properties), conversions)),
            (None, Some(properties)) => Some(base.updated(properties, conversions)),
            (None, None) => conversions.map(|c| base.replace(None, Some(c))),
        };
        let config = derived.map(Arc::new).unwrap_or(base);
        Ok(match self.strict_string_conversions {
            Some(strict) if strict != config.strict_string_conversions() => {
                Arc::new(config.with_strict_string_conversions(strict))
            }
            _ => config,
        })
    }

    fn resolve_options(&self) -> SchemaOptions {
        let mut options = self
            .bases
            .first()
            .map(|b| b.options().clone())
            .unwrap_or_default();
        if let Some(allow) = self.allow_dynamic_properties {
            options.allow_dynamic_properties = allow;
        }
        if let Some(lazily) = self.validate_required_lazily {
            options.validate_required_lazily = lazily;
        }
        options
    }

    /// Run the registration pass
    pub fn build(mut self) -> Result<Arc<Schema>, SchemaError> {
        let mut seen = BTreeSet::new();
        for (attr, _) in &self.declarations {
            if !seen.insert(attr.as_str()) {
                return Err(SchemaError::DuplicateAttribute(attr.clone()));
            }
        }

        let type_config = self.resolve_type_config()?;
        let options = self.resolve_options();

        let mut properties: BTreeMap<String, Arc<dyn Property>> = BTreeMap::new();
        let mut keys: BTreeMap<String, String> = BTreeMap::new();

        for (attr, declaration) in std::mem::take(&mut self.declarations) {
            let mut property = match declaration {
                Declaration::Property(property) => property,
                Declaration::Literal(value) => promote_literal(&attr, value, &type_config)?,
            };
            property.init_property(&attr, &type_config)?;
            register_key(&mut keys, property.name().unwrap_or(&attr), &attr)?;
            properties.insert(attr, Arc::from(property));
        }

        let declared = properties.len();
        let mut reserved = std::mem::take(&mut self.reserved);
        for base in &self.bases {
            for (attr, property) in base.properties() {
                if properties.contains_key(attr) {
                    continue;
                }
                register_key(&mut keys, property.name().unwrap_or(attr), attr)?;
                properties.insert(attr.clone(), Arc::clone(property));
            }
            reserved.extend(base.reserved.iter().cloned());
        }

        debug!(
            "Registered schema {} with {} declared and {} inherited properties",
            self.name,
            declared,
            properties.len() - declared
        );

        Ok(Arc::new(Schema {
            name: self.name,
            properties,
            keys,
            bases: self.bases,
            type_config,
            options,
            reserved,
        }))
    }
}

fn promote_literal(
    attr: &str,
    value: Value,
    type_config: &TypeConfig,
) -> Result<Box<dyn Property>, SchemaError> {
    let ctor = value
        .kind()
        .and_then(|kind| type_config.property_ctor(kind))
        .ok_or_else(|| SchemaError::UnrecognizedLiteral {
            attr: attr.to_string(),
            kind: value.type_name().to_string(),
        })?;
    let mut property = ctor();
    property.options_mut().default = Some(DefaultValue::Value(value));
    Ok(property)
}

fn register_key(
    keys: &mut BTreeMap<String, String>,
    key: &str,
    attr: &str,
) -> Result<(), SchemaError> {
    if let Some(first) = keys.get(key) {
        return Err(SchemaError::DuplicateKey {
            key: key.to_string(),
            first: first.clone(),
            second: attr.to_string(),
        });
    }
    keys.insert(key.to_string(), attr.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::{IntegerProperty, PropertyOptionsExt, StringProperty};

    #[test]
    fn test_duplicate_key() {
        let err = Schema::builder("Foo")
            .property("a", StringProperty::new().named("x"))
            .property("b", StringProperty::new().named("x"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateKey {
                key: "x".into(),
                first: "a".into(),
                second: "b".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_key_against_inherited() {
        let base = Schema::builder("Base")
            .property("a", StringProperty::new().named("x"))
            .build()
            .unwrap();
        let err = Schema::builder("Child")
            .extends(&base)
            .property("b", StringProperty::new().named("x"))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateKey { .. }));
    }

    #[test]
    fn test_override_replaces_inherited_key() {
        let base = Schema::builder("Base")
            .property("a", StringProperty::new().named("x"))
            .build()
            .unwrap();
        let child = Schema::builder("Child")
            .extends(&base)
            .property("a", IntegerProperty::new())
            .build()
            .unwrap();
        assert_eq!(child.key_for_attr("a"), Some("a"));
        assert!(child.property_for_key("x").is_none());
        assert_eq!(child.property("a").unwrap().type_name(), "IntegerProperty");
    }

    #[test]
    fn test_duplicate_attribute() {
        let err = Schema::builder("Foo")
            .property("a", StringProperty::new())
            .literal("a", 1)
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateAttribute("a".into()));
    }

    #[test]
    fn test_literal_promotion() {
        let schema = Schema::builder("Foo").literal("count", 3).build().unwrap();
        let property = schema.property("count").unwrap();
        assert_eq!(property.type_name(), "IntegerProperty");
        assert_eq!(property.default_value(None).unwrap(), Value::from(3));

        let err = Schema::builder("Foo").literal("nothing", Value::Null).build().unwrap_err();
        assert!(matches!(err, SchemaError::UnrecognizedLiteral { .. }));
    }

    #[test]
    fn test_conflicting_type_config() {
        let err = Schema::builder("Foo")
            .properties(Vec::new())
            .update_properties(Vec::new())
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::ConflictingTypeConfig("Foo".into()));
    }

    #[test]
    fn test_first_base_wins() {
        let lazy = Schema::builder("Lazy")
            .validate_required_lazily(true)
            .string_conversions(Vec::new())
            .build()
            .unwrap();
        let eager = Schema::builder("Eager").build().unwrap();
        let child = Schema::builder("Child")
            .extends(&lazy)
            .extends(&eager)
            .build()
            .unwrap();
        assert!(child.options().validate_required_lazily);
        assert!(Arc::ptr_eq(child.type_config(), lazy.type_config()));
        assert!(child.is_subschema_of(&eager));
        assert!(!eager.is_subschema_of(&child));
    }

    #[test]
    fn test_untouched_config_is_shared() {
        let schema = Schema::builder("Foo").build().unwrap();
        assert!(Arc::ptr_eq(schema.type_config(), &TypeConfig::shared_default()));
    }
}
