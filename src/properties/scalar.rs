//! Type-asserting scalar properties

use serde_json::{Number, Value as JsonValue};

use super::{Property, PropertyOptions};
use crate::error::{Error, Result};
use crate::value::Value;

fn not_of_type(shown: impl std::fmt::Display, type_name: &str) -> Error {
    Error::bad_value(format!("{} not of type {}", shown, type_name))
}

/// Text
#[derive(Debug, Default)]
pub struct StringProperty {
    options: PropertyOptions,
}

impl StringProperty {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Property for StringProperty {
    options_accessors!();

    fn type_name(&self) -> &'static str {
        "StringProperty"
    }

    fn wrap(&self, json: &JsonValue) -> Result<Value> {
        match json {
            JsonValue::String(s) => Ok(Value::String(s.clone())),
            other => Err(not_of_type(other, "str")),
        }
    }

    fn unwrap(&self, value: Value) -> Result<(Value, JsonValue)> {
        match value {
            Value::String(s) => {
                let json = JsonValue::String(s.clone());
                Ok((Value::String(s), json))
            }
            other => Err(not_of_type(&other, "str")),
        }
    }
}

/// `true`/`false`; integers are not accepted
#[derive(Debug, Default)]
pub struct BooleanProperty {
    options: PropertyOptions,
}

impl BooleanProperty {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Property for BooleanProperty {
    options_accessors!();

    fn type_name(&self) -> &'static str {
        "BooleanProperty"
    }

    fn wrap(&self, json: &JsonValue) -> Result<Value> {
        match json {
            JsonValue::Bool(b) => Ok(Value::Bool(*b)),
            other => Err(not_of_type(other, "bool")),
        }
    }

    fn unwrap(&self, value: Value) -> Result<(Value, JsonValue)> {
        match value {
            Value::Bool(b) => Ok((Value::Bool(b), JsonValue::Bool(b))),
            other => Err(not_of_type(&other, "bool")),
        }
    }
}

/// 64-bit signed integers
///
/// Floats are rejected even when they have no fractional part; booleans are
/// rejected too.
#[derive(Debug, Default)]
pub struct IntegerProperty {
    options: PropertyOptions,
}

impl IntegerProperty {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Property for IntegerProperty {
    options_accessors!();

    fn type_name(&self) -> &'static str {
        "IntegerProperty"
    }

    fn wrap(&self, json: &JsonValue) -> Result<Value> {
        match json {
            JsonValue::Number(n) if n.is_i64() => Ok(Value::Integer(n.as_i64().unwrap_or_default())),
            JsonValue::Number(n) if n.is_u64() => Err(Error::bad_value(format!(
                "{} is out of range for int",
                n
            ))),
            other => Err(not_of_type(other, "int")),
        }
    }

    fn unwrap(&self, value: Value) -> Result<(Value, JsonValue)> {
        match value {
            Value::Integer(i) => Ok((Value::Integer(i), JsonValue::from(i))),
            other => Err(not_of_type(&other, "int")),
        }
    }
}

/// Double precision floats; integers are promoted
#[derive(Debug, Default)]
pub struct FloatProperty {
    options: PropertyOptions,
}

impl FloatProperty {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Property for FloatProperty {
    options_accessors!();

    fn type_name(&self) -> &'static str {
        "FloatProperty"
    }

    fn wrap(&self, json: &JsonValue) -> Result<Value> {
        match json.as_f64() {
            Some(f) if json.is_number() => Ok(Value::Float(f)),
            _ => Err(not_of_type(json, "float")),
        }
    }

    fn unwrap(&self, value: Value) -> Result<(Value, JsonValue)> {
        let f = match value {
            Value::Float(f) => f,
            Value::Integer(i) => i as f64,
            other => return Err(not_of_type(&other, "float")),
        };
        let number = Number::from_f64(f)
            .ok_or_else(|| Error::bad_value(format!("{:?} cannot be represented in JSON", f)))?;
        Ok((Value::Float(f), JsonValue::Number(number)))
    }
}
