//! Polymorphic nested documents
//!
//! A [`TypeFactory`] picks the schema of a nested document from a
//! discriminator field. Each registered schema declares that field with
//! [`type_property`], whose default is the schema's type id.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{Error, Result, SchemaError};
use crate::object::JsonObject;
use crate::properties::{PropertyOptionsExt, StringProperty};
use crate::schema::Schema;

/// A required string property that only ever holds `type_name`
pub fn type_property(type_name: &str) -> StringProperty {
    StringProperty::new()
        .with_default(type_name)
        .required()
        .choices([type_name])
}

#[derive(Debug, Default)]
struct Registry {
    types: BTreeMap<String, Arc<Schema>>,
    default_type: Option<Arc<Schema>>,
}

/// Registry of schemas keyed by the value of their identifier field
///
/// Registration goes through `&self`, so a factory can be shared with
/// [`ObjectProperty::from_factory`](crate::ObjectProperty::from_factory)
/// before every type is registered.
#[derive(Debug)]
pub struct TypeFactory {
    identifier_field: String,
    registry: RwLock<Registry>,
}

impl TypeFactory {
    pub fn new(identifier_field: impl Into<String>) -> Self {
        Self {
            identifier_field: identifier_field.into(),
            registry: RwLock::new(Registry::default()),
        }
    }

    pub fn identifier_field(&self) -> &str {
        &self.identifier_field
    }

    /// Register `schema` under the default of its identifier property
    pub fn register_type(&self, schema: &Arc<Schema>, is_default: bool) -> Result<(), SchemaError> {
        let property = schema.property(&self.identifier_field).ok_or_else(|| {
            SchemaError::Factory(format!(
                "Missing identifier field '{}' for type '{}'",
                self.identifier_field,
                schema.name()
            ))
        })?;
        let type_id = property
            .default_value(None)
            .ok()
            .and_then(|value| value.as_str().map(str::to_string))
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                SchemaError::Factory(format!(
                    "Identifier field for type '{}' must have a default value: {}",
                    schema.name(),
                    self.identifier_field
                ))
            })?;

        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = registry.types.get(&type_id) {
            return Err(SchemaError::Factory(format!(
                "Type '{}' already registered by '{}'",
                type_id,
                existing.name()
            )));
        }
        if is_default {
            if let Some(current) = &registry.default_type {
                return Err(SchemaError::Factory(format!(
                    "Attempt to register multiple default types: {}, {}",
                    current.name(),
                    schema.name()
                )));
            }
            registry.default_type = Some(Arc::clone(schema));
        }
        registry.types.insert(type_id.clone(), Arc::clone(schema));
        debug!(
            "Registered type '{}' as {} (default: {})",
            type_id,
            schema.name(),
            is_default
        );
        Ok(())
    }

    pub fn default_type(&self) -> Option<Arc<Schema>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .default_type
            .clone()
    }

    /// Registered schema with id `type_id`
    pub fn get(&self, type_id: &str) -> Option<Arc<Schema>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .types
            .get(type_id)
            .cloned()
    }

    /// Schema for a raw document; null selects the default type
    pub fn type_for_object(&self, json: &JsonValue) -> Result<Option<Arc<Schema>>> {
        let raw = match json {
            JsonValue::Null => return Ok(self.default_type()),
            JsonValue::Object(raw) => raw,
            other => return Err(Error::bad_value(format!("{} is not an object", other))),
        };
        let id = raw.get(&self.identifier_field).ok_or_else(|| {
            Error::bad_value(format!(
                "Missing identifier field '{}' in object source: {}",
                self.identifier_field, json
            ))
        })?;
        id.as_str()
            .and_then(|id| self.get(id))
            .map(Some)
            .ok_or_else(|| Error::bad_value(format!("Unknown object type {}: {}", id, json)))
    }

    /// Decode `json` with the schema its identifier selects
    pub fn wrap(&self, json: &JsonValue) -> Result<JsonObject> {
        match self.type_for_object(json)? {
            Some(schema) if json.is_null() => schema.instance(),
            Some(schema) => schema.wrap(json),
            None => Err(Error::bad_value(format!(
                "No default type registered for '{}'",
                self.identifier_field
            ))),
        }
    }

    /// True when `schema` is, or extends, a registered type
    pub fn accepts(&self, schema: &Schema) -> bool {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .types
            .values()
            .any(|registered| schema.is_subschema_of(registered))
    }
}
