//! Schema instances
//!
//! A [`JsonObject`] owns three things:
//!
//! - the canonical map, keyed by JSON key, which is what [`JsonObject::to_json`]
//!   hands out
//! - the typed view, also keyed by JSON key
//! - the set of dynamic keys, fields present on this instance that the
//!   schema does not declare
//!
//! Every key in the typed view has its canonical unwrap in the canonical
//! map, except keys whose property excludes falsy values. Declared fields
//! are reachable by attribute name (`attr`, `set_attr`, ...) and by JSON key
//! (`get`, `set`, ...); dynamic fields use the same name for both.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::ser::{Error as _, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use tracing::trace;

use crate::containers::ValueMut;
use crate::error::{Error, Result};
use crate::properties::{DefaultProperty, Property};
use crate::schema::Schema;
use crate::value::Value;

/// An instance of a [`Schema`]
#[derive(Debug, Clone)]
pub struct JsonObject {
    schema: Arc<Schema>,
    obj: Map<String, JsonValue>,
    wrapped: BTreeMap<String, Value>,
    dynamic: BTreeSet<String>,
}

impl JsonObject {
    /// A new instance with every declared field at its default
    pub fn new(schema: &Arc<Schema>) -> Result<Self> {
        Self::construct(schema, Map::new(), std::iter::empty::<(&str, Value)>())
    }

    /// Build an instance from a raw canonical map plus attribute overrides
    ///
    /// Raw keys are wrapped first, then overrides are assigned, then every
    /// declared field still missing receives its default.
    pub fn construct<I, K, V>(
        schema: &Arc<Schema>,
        raw: Map<String, JsonValue>,
        overrides: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut object = Self {
            schema: Arc::clone(schema),
            obj: Map::new(),
            wrapped: BTreeMap::new(),
            dynamic: BTreeSet::new(),
        };

        for (key, json) in &raw {
            object.set_raw(key, json, &raw)?;
        }
        for (attr, value) in overrides {
            object.set_attr(attr.as_ref(), value)?;
        }

        let schema = Arc::clone(&object.schema);
        for property in schema.properties().values() {
            let Some(key) = property.name() else {
                continue;
            };
            if object.wrapped.contains_key(key) {
                continue;
            }
            let default = property.default_value(Some(&object))?;
            object.assign(key, property.as_ref(), default)?;
        }

        trace!(
            "Constructed {} with {} fields ({} dynamic)",
            schema.name(),
            object.wrapped.len(),
            object.dynamic.len()
        );
        Ok(object)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The canonical map; excluded falsy fields are absent
    pub fn canonical(&self) -> &Map<String, JsonValue> {
        &self.obj
    }

    /// The typed view, keyed by JSON key
    pub fn entries(&self) -> &BTreeMap<String, Value> {
        &self.wrapped
    }

    pub fn len(&self) -> usize {
        self.wrapped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wrapped.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.wrapped.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.wrapped.keys().map(String::as_str)
    }

    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, String, Value> {
        self.wrapped.iter()
    }

    /// Keys of the fields the schema does not declare
    pub fn dynamic_properties(&self) -> impl Iterator<Item = &str> {
        self.dynamic.iter().map(String::as_str)
    }

    pub fn is_dynamic(&self, key: &str) -> bool {
        self.dynamic.contains(key)
    }

    /// Read by JSON key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.wrapped.get(key)
    }

    /// Assign by JSON key
    ///
    /// An undeclared key becomes a dynamic property unless the schema
    /// forbids them.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        match self.schema.property_for_key(key).cloned() {
            Some(property) => self.assign(key, property.as_ref(), value),
            None => {
                self.check_dynamic(key)?;
                self.assign_dynamic(key, value)
            }
        }
    }

    /// Delete by JSON key; only dynamic fields can be deleted
    pub fn delete(&mut self, key: &str) -> Result<()> {
        if self.schema.property_for_key(key).is_some() {
            return Err(Error::DeleteNotAllowed(key.to_string()));
        }
        if !self.dynamic.remove(key) {
            return Err(Error::NoSuchKey(key.to_string()));
        }
        self.obj.remove(key);
        self.wrapped.remove(key);
        Ok(())
    }

    /// Mutable access by JSON key to a nested container or document
    pub fn get_mut(&mut self, key: &str) -> Option<ValueMut<'_>> {
        let exclude_if_none = self
            .schema
            .property_for_key(key)
            .is_some_and(|property| property.options().exclude_if_none);
        let value = self.wrapped.get_mut(key)?;
        Some(ValueMut::keyed(value, &mut self.obj, key, exclude_if_none))
    }

    /// Read by attribute name
    pub fn attr(&self, attr: &str) -> Result<&Value> {
        let key = self.key_for(attr)?;
        self.wrapped
            .get(&key)
            .ok_or_else(|| self.no_such_attribute(attr))
    }

    /// Assign by attribute name
    pub fn set_attr(&mut self, attr: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        match self.schema.property(attr).cloned() {
            Some(property) => {
                let key = property.name().unwrap_or(attr).to_string();
                self.assign(&key, property.as_ref(), value)
            }
            None => {
                self.check_dynamic(attr)?;
                self.assign_dynamic(attr, value)
            }
        }
    }

    /// Delete by attribute name; only dynamic fields can be deleted
    pub fn delete_attr(&mut self, attr: &str) -> Result<()> {
        if self.schema.property(attr).is_some() {
            return Err(Error::DeleteNotAllowed(attr.to_string()));
        }
        if !self.dynamic.contains(attr) {
            return Err(self.no_such_attribute(attr));
        }
        self.delete(attr)
    }

    /// Mutable access by attribute name to a nested container or document
    pub fn attr_mut(&mut self, attr: &str) -> Result<ValueMut<'_>> {
        let key = self.key_for(attr)?;
        let missing = self.no_such_attribute(attr);
        self.get_mut(&key).ok_or(missing)
    }

    /// Check every field; `required` enables the required check
    pub fn validate(&self, required: bool) -> Result<()> {
        for property in self.schema.properties().values() {
            let value = property
                .name()
                .and_then(|key| self.wrapped.get(key))
                .unwrap_or(&Value::Null);
            property.validate(value, required, true)?;
        }
        for key in &self.dynamic {
            if let Some(value) = self.wrapped.get(key) {
                value.validate_nested(required)?;
            }
        }
        Ok(())
    }

    /// Validate, then return a deep copy of the canonical map
    pub fn to_json(&self) -> Result<JsonValue> {
        self.validate(true)?;
        Ok(JsonValue::Object(self.obj.clone()))
    }

    fn key_for(&self, attr: &str) -> Result<String> {
        match self.schema.property(attr) {
            Some(property) => Ok(property.name().unwrap_or(attr).to_string()),
            None if self.dynamic.contains(attr) => Ok(attr.to_string()),
            None => Err(self.no_such_attribute(attr)),
        }
    }

    fn no_such_attribute(&self, attr: &str) -> Error {
        Error::NoSuchAttribute {
            schema: self.schema.name().to_string(),
            attr: attr.to_string(),
        }
    }

    /// A dynamic name must not shadow a declared attribute, a declared key
    /// or a reserved attribute
    fn check_dynamic(&self, name: &str) -> Result<()> {
        if self.schema.property(name).is_some()
            || self.schema.property_for_key(name).is_some()
            || self.schema.is_reserved(name)
        {
            return Err(Error::AttributeNotSettable {
                schema: self.schema.name().to_string(),
                attr: name.to_string(),
            });
        }
        if !self.schema.options().allow_dynamic_properties {
            return Err(Error::DynamicNotAllowed {
                schema: self.schema.name().to_string(),
                key: name.to_string(),
            });
        }
        Ok(())
    }

    fn set_raw(
        &mut self,
        key: &str,
        json: &JsonValue,
        raw: &Map<String, JsonValue>,
    ) -> Result<()> {
        if let Some(property) = self.schema.property_for_key(key).cloned() {
            let value = if json.is_null() && !property.wraps_null() {
                Value::Null
            } else {
                property.wrap(json)?
            };
            return self.assign(key, property.as_ref(), value);
        }

        self.check_dynamic(key)
            .map_err(|_| Error::WrappingAttribute {
                key: key.to_string(),
                schema: self.schema.name().to_string(),
                data: JsonValue::Object(raw.clone()).to_string(),
            })?;
        let value = self.catch_all().validate_and_wrap(json)?;
        self.assign_dynamic(key, value)
    }

    fn catch_all(&self) -> DefaultProperty {
        DefaultProperty::bound(self.schema.type_config())
    }

    fn assign(&mut self, key: &str, property: &dyn Property, value: Value) -> Result<()> {
        let lazily = self.schema.options().validate_required_lazily;
        let (value, json) = property.validate_and_unwrap(value, lazily)?;
        if property.exclude(&value) {
            self.obj.remove(key);
        } else {
            self.obj.insert(key.to_string(), json);
        }
        self.wrapped.insert(key.to_string(), value);
        Ok(())
    }

    fn assign_dynamic(&mut self, key: &str, value: Value) -> Result<()> {
        let property = self.catch_all();
        self.assign(key, &property, value)?;
        self.dynamic.insert(key.to_string());
        Ok(())
    }
}

/// Documents are equal when they share a schema and hold equal typed data
impl PartialEq for JsonObject {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema) && self.wrapped == other.wrapped
    }
}

impl fmt::Display for JsonObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.schema.name())?;
        let mut first = true;
        let mut field = |f: &mut fmt::Formatter<'_>, name: &str, value: &Value| {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}={}", name, value)
        };
        for (attr, property) in self.schema.properties() {
            if let Some(value) = property.name().and_then(|key| self.wrapped.get(key)) {
                field(f, attr, value)?;
            }
        }
        for key in &self.dynamic {
            if let Some(value) = self.wrapped.get(key) {
                field(f, key, value)?;
            }
        }
        f.write_str(")")
    }
}

impl Serialize for JsonObject {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.validate(true).map_err(S::Error::custom)?;
        self.obj.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::{IntegerProperty, ListProperty, PropertyOptionsExt, StringProperty};
    use crate::value::ValueKind;
    use serde_json::json;

    fn person() -> Arc<Schema> {
        Schema::builder("Person")
            .property("first_name", StringProperty::new().named("first").required())
            .property("age", IntegerProperty::new())
            .property("nicknames", ListProperty::of(ValueKind::String))
            .build()
            .unwrap()
    }

    #[test]
    fn test_attr_and_key_views_agree() {
        let mut p = person()
            .wrap(&json!({"first": "Danny", "age": 30}))
            .unwrap();
        assert_eq!(p.attr("first_name").unwrap(), &Value::from("Danny"));
        assert_eq!(p.get("first"), Some(&Value::from("Danny")));
        p.set_attr("first_name", "Dan").unwrap();
        assert_eq!(p.get("first"), Some(&Value::from("Dan")));
        assert_eq!(p.canonical().get("first"), Some(&json!("Dan")));
        assert!(p.attr("first").is_err());
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let p = Schema::construct(&person(), Map::new(), [("first_name", "Alex")]).unwrap();
        assert_eq!(
            p.to_json().unwrap(),
            json!({"first": "Alex", "age": null, "nicknames": []})
        );
    }

    #[test]
    fn test_required_is_eager_by_default() {
        let err = person().instance().unwrap_err();
        assert_eq!(err, Error::BadValue("Property first is required.".into()));
    }

    #[test]
    fn test_dynamic_properties() {
        let mut p = person().wrap(&json!({"first": "Danny", "color": "red"})).unwrap();
        assert!(p.is_dynamic("color"));
        p.set_attr("height", 180).unwrap();
        assert_eq!(p.dynamic_properties().collect::<Vec<_>>(), ["color", "height"]);
        p.delete_attr("color").unwrap();
        assert!(p.canonical().get("color").is_none());
        assert!(matches!(p.delete("first"), Err(Error::DeleteNotAllowed(_))));
        assert!(matches!(p.delete_attr("first_name"), Err(Error::DeleteNotAllowed(_))));
        assert!(matches!(p.delete("color"), Err(Error::NoSuchKey(_))));
    }

    #[test]
    fn test_dynamic_cannot_shadow_declared_names() {
        let mut p = person().wrap(&json!({"first": "Danny"})).unwrap();
        let err = p.set("first_name", "x").unwrap_err();
        assert!(matches!(err, Error::AttributeNotSettable { .. }));
        let err = person()
            .wrap(&json!({"first": "Danny", "first_name": "x"}))
            .unwrap_err();
        assert!(matches!(err, Error::WrappingAttribute { .. }));
    }

    #[test]
    fn test_display() {
        let p = person()
            .wrap(&json!({"first": "Danny", "age": 3, "x": true}))
            .unwrap();
        assert_eq!(
            p.to_string(),
            r#"Person(age=3, first_name="Danny", nicknames=[], x=true)"#
        );
    }

    #[test]
    fn test_serialize_validates() {
        let p = person().wrap(&json!({"first": "Danny"})).unwrap();
        let text = serde_json::to_string(&p).unwrap();
        assert_eq!(text, r#"{"age":null,"first":"Danny","nicknames":[]}"#);
    }
}
