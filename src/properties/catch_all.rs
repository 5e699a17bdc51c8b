//! The catch-all property used for undeclared fields and untyped containers

use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{ObjectProperty, Property, PropertyOptions};
use crate::config::TypeConfig;
use crate::error::{Error, Result};
use crate::value::{Value, ValueKind};

/// Picks a property from the value itself
///
/// On wrap, strings are run through the type config's string rules and the
/// property registered for the inferred kind wraps the *original* JSON;
/// lists and maps wrap through a list/dict property whose elements are
/// again inferred. On unwrap the kind of the typed value selects the
/// property, objects unwrap through their own schema.
#[derive(Debug, Default)]
pub struct DefaultProperty {
    options: PropertyOptions,
}

impl DefaultProperty {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catch-all property bound to `type_config`
    pub fn bound(type_config: &Arc<TypeConfig>) -> Self {
        let mut property = Self::default();
        property.options.type_config = Some(Arc::clone(type_config));
        property
    }

    fn property_for(
        &self,
        kind: ValueKind,
        shown: &dyn std::fmt::Display,
    ) -> Result<Box<dyn Property>> {
        let config = self.type_config();
        config.property_for_kind(kind)?.ok_or_else(|| {
            Error::bad_value(format!(
                "value {} not in allowed types: [{}]",
                shown,
                config.allowed_kinds()
            ))
        })
    }

    fn infer_kind(&self, json: &JsonValue) -> Result<Option<ValueKind>> {
        let kind = match json {
            JsonValue::Null => return Ok(None),
            JsonValue::Bool(_) => ValueKind::Bool,
            JsonValue::Number(n) if n.is_i64() => ValueKind::Integer,
            JsonValue::Number(_) => ValueKind::Float,
            JsonValue::String(s) => self
                .type_config()
                .convert_string(s)?
                .and_then(|converted| converted.kind())
                .unwrap_or(ValueKind::String),
            JsonValue::Array(_) => ValueKind::List,
            JsonValue::Object(_) => ValueKind::Dict,
        };
        Ok(Some(kind))
    }
}

impl Property for DefaultProperty {
    options_accessors!();

    fn type_name(&self) -> &'static str {
        "DefaultProperty"
    }

    fn is_catch_all(&self) -> bool {
        true
    }

    fn wrap(&self, json: &JsonValue) -> Result<Value> {
        match self.infer_kind(json)? {
            None => Ok(Value::Null),
            Some(kind) => self.property_for(kind, json)?.wrap(json),
        }
    }

    fn unwrap(&self, value: Value) -> Result<(Value, JsonValue)> {
        match &value {
            Value::Null => Ok((Value::Null, JsonValue::Null)),
            Value::Object(object) => ObjectProperty::new(Arc::clone(object.schema())).unwrap(value),
            other => {
                let kind = other.kind().unwrap_or(ValueKind::Object);
                self.property_for(kind, other)?.unwrap(value)
            }
        }
    }
}
