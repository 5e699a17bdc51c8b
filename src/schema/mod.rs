//! Schemas: registered document shapes
//!
//! A [`Schema`] is produced once by [`SchemaBuilder::build`] and is
//! immutable afterwards. It holds two views of its declarations:
//!
//! - attribute name → property (what callers use)
//! - JSON key → attribute name (what canonical documents use)
//!
//! plus its effective [`TypeConfig`] and [`SchemaOptions`]. Schemas are
//! shared behind `Arc` and may be referenced by container properties of
//! other schemas, or lazily by their own properties for recursive shapes.

mod builder;
mod options;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::de::{self, DeserializeSeed, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::config::TypeConfig;
use crate::error::{Error, Result};
use crate::object::JsonObject;
use crate::properties::Property;
use crate::value::Value;

pub use builder::SchemaBuilder;
pub use options::{SchemaOptions, SchemaOptionsBuilder};

/// A registered document shape
pub struct Schema {
    name: String,
    properties: BTreeMap<String, Arc<dyn Property>>,
    keys: BTreeMap<String, String>,
    bases: Vec<Arc<Schema>>,
    type_config: Arc<TypeConfig>,
    options: SchemaOptions,
    reserved: BTreeSet<String>,
}

impl Schema {
    /// Start declaring a schema called `name`
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared and inherited properties by attribute name
    pub fn properties(&self) -> &BTreeMap<String, Arc<dyn Property>> {
        &self.properties
    }

    pub fn property(&self, attr: &str) -> Option<&Arc<dyn Property>> {
        self.properties.get(attr)
    }

    pub fn property_for_key(&self, key: &str) -> Option<&Arc<dyn Property>> {
        self.keys.get(key).and_then(|attr| self.properties.get(attr))
    }

    /// JSON key of a declared attribute
    pub fn key_for_attr(&self, attr: &str) -> Option<&str> {
        self.property(attr).and_then(|p| p.name())
    }

    /// Attribute name of a declared JSON key
    pub fn attr_for_key(&self, key: &str) -> Option<&str> {
        self.keys.get(key).map(String::as_str)
    }

    /// Declared JSON keys, in key order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn bases(&self) -> &[Arc<Schema>] {
        &self.bases
    }

    pub fn type_config(&self) -> &Arc<TypeConfig> {
        &self.type_config
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// Attribute names owned by code outside the schema
    pub fn is_reserved(&self, attr: &str) -> bool {
        self.reserved.contains(attr)
    }

    /// True when `self` is `other` or extends it, directly or not
    pub fn is_subschema_of(&self, other: &Schema) -> bool {
        std::ptr::eq(self, other) || self.bases.iter().any(|base| base.is_subschema_of(other))
    }

    /// A new instance with every field at its default
    pub fn instance(self: &Arc<Self>) -> Result<JsonObject> {
        JsonObject::new(self)
    }

    /// Decode a canonical JSON object into an instance
    pub fn wrap(self: &Arc<Self>, json: &JsonValue) -> Result<JsonObject> {
        match json {
            JsonValue::Object(raw) => {
                JsonObject::construct(self, raw.clone(), std::iter::empty::<(&str, Value)>())
            }
            other => Err(Error::bad_value(format!(
                "{} is not an object of {}",
                other, self.name
            ))),
        }
    }

    /// Decode `raw`, then apply attribute `overrides`
    pub fn construct<I, K, V>(
        self: &Arc<Self>,
        raw: Map<String, JsonValue>,
        overrides: I,
    ) -> Result<JsonObject>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        JsonObject::construct(self, raw, overrides)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .field(
                "bases",
                &self.bases.iter().map(|b| b.name()).collect::<Vec<_>>(),
            )
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Deserialize straight into an instance of a schema
///
/// ```
/// use serde::de::DeserializeSeed;
/// use docshape::{Schema, SchemaSeed, StringProperty};
///
/// let schema = Schema::builder("Note")
///     .property("text", StringProperty::new())
///     .build()
///     .unwrap();
/// let mut de = serde_json::Deserializer::from_str(r#"{"text": "hi"}"#);
/// let note = SchemaSeed(&schema).deserialize(&mut de).unwrap();
/// assert_eq!(note.attr("text").unwrap().as_str(), Some("hi"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SchemaSeed<'a>(pub &'a Arc<Schema>);

impl<'de> DeserializeSeed<'de> for SchemaSeed<'_> {
    type Value = JsonObject;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<JsonObject, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json = JsonValue::deserialize(deserializer)?;
        self.0.wrap(&json).map_err(de::Error::custom)
    }
}
