//! Typed values
//!
//! [`Value`] is the typed side of the dual view. Scalars carry native Rust
//! types (`chrono` dates, `rust_decimal` decimals); collections come in two
//! flavours:
//!
//! - **plain** (`List`, `Map`, `Set`) - values the caller builds and hands to
//!   a property. They have no canonical backing yet.
//! - **bound** (`JsonArray`, `JsonDict`, `JsonSet`, `Object`) - containers that
//!   own a canonical backing and keep it synchronized with their typed items.
//!
//! Plain collections are converted to bound ones the moment they pass through
//! a property's `unwrap`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::containers::{JsonArray, JsonDict, JsonSet};
use crate::error::Result;
use crate::object::JsonObject;

/// Native kinds a [`TypeConfig`](crate::config::TypeConfig) can map to properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    Bool,
    Integer,
    Float,
    String,
    Decimal,
    Date,
    DateTime,
    Time,
    List,
    Dict,
    Set,
    Object,
}

impl ValueKind {
    /// Kinds this kind is a special case of, most specific first
    ///
    /// Used when property lookup falls back to a broader kind: a
    /// datetime is a date, a boolean is an integer.
    pub fn supertypes(self) -> &'static [ValueKind] {
        match self {
            ValueKind::Bool => &[ValueKind::Integer],
            ValueKind::DateTime => &[ValueKind::Date],
            _ => &[],
        }
    }

    /// True when `self` is `other` or one of its special cases
    pub fn is_a(self, other: ValueKind) -> bool {
        self == other || self.supertypes().contains(&other)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Integer => "int",
            ValueKind::Float => "float",
            ValueKind::String => "str",
            ValueKind::Decimal => "decimal",
            ValueKind::Date => "date",
            ValueKind::DateTime => "datetime",
            ValueKind::Time => "time",
            ValueKind::List => "list",
            ValueKind::Dict => "dict",
            ValueKind::Set => "set",
            ValueKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// A typed value
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    /// Plain list, not yet bound to an item property
    List(Vec<Value>),
    /// Plain map, not yet bound to an item property
    Map(BTreeMap<String, Value>),
    /// Plain set; duplicates are dropped when it is bound
    Set(Vec<Value>),
    JsonArray(JsonArray),
    JsonDict(JsonDict),
    JsonSet(JsonSet),
    Object(JsonObject),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The native kind, `None` for null
    pub fn kind(&self) -> Option<ValueKind> {
        let kind = match self {
            Value::Null => return None,
            Value::Bool(_) => ValueKind::Bool,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Date(_) => ValueKind::Date,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Time(_) => ValueKind::Time,
            Value::List(_) | Value::JsonArray(_) => ValueKind::List,
            Value::Map(_) | Value::JsonDict(_) => ValueKind::Dict,
            Value::Set(_) | Value::JsonSet(_) => ValueKind::Set,
            Value::Object(_) => ValueKind::Object,
        };
        Some(kind)
    }

    /// Short name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::JsonArray(_) => "JsonArray",
            Value::JsonDict(_) => "JsonDict",
            Value::JsonSet(_) => "JsonSet",
            Value::Object(_) => "JsonObject",
            Value::List(_) => "list",
            Value::Map(_) => "dict",
            Value::Set(_) => "set",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "str",
            Value::Decimal(_) => "decimal",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Time(_) => "time",
        }
    }

    /// Truthiness as used by `exclude_if_none` and container emptiness
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Decimal(d) => !d.is_zero(),
            Value::Date(_) | Value::DateTime(_) | Value::Time(_) => true,
            Value::List(items) | Value::Set(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::JsonArray(array) => !array.is_empty(),
            Value::JsonDict(dict) => !dict.is_empty(),
            Value::JsonSet(set) => !set.is_empty(),
            Value::Object(object) => !object.is_empty(),
        }
    }

    /// Canonical backing of a bound container, `None` for anything else
    pub fn bound_json(&self) -> Option<JsonValue> {
        match self {
            Value::JsonArray(array) => Some(JsonValue::Array(array.canonical().to_vec())),
            Value::JsonDict(dict) => Some(JsonValue::Object(dict.canonical().clone())),
            Value::JsonSet(set) => Some(JsonValue::Array(set.canonical().to_vec())),
            Value::Object(object) => Some(JsonValue::Object(object.canonical().clone())),
            _ => None,
        }
    }

    /// Validate nested content of bound containers and objects
    pub fn validate_nested(&self, required: bool) -> Result<()> {
        match self {
            Value::JsonArray(array) => array.validate(required),
            Value::JsonDict(dict) => dict.validate(required),
            Value::JsonSet(set) => set.validate(required),
            Value::Object(object) => object.validate(required),
            _ => Ok(()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    /// Items of a plain or bound list
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            Value::JsonArray(array) => Some(array.as_slice()),
            _ => None,
        }
    }

    /// Entries of a plain map, a bound dict or an object
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            Value::JsonDict(dict) => Some(dict.entries()),
            Value::Object(object) => Some(object.entries()),
            _ => None,
        }
    }

    /// Members of a plain or bound set
    pub fn as_set_items(&self) -> Option<&[Value]> {
        match self {
            Value::Set(items) => Some(items),
            Value::JsonSet(set) => Some(set.as_slice()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&JsonArray> {
        match self {
            Value::JsonArray(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut JsonArray> {
        match self {
            Value::JsonArray(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&JsonDict> {
        match self {
            Value::JsonDict(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut JsonDict> {
        match self {
            Value::JsonDict(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&JsonSet> {
        match self {
            Value::JsonSet(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_set_mut(&mut self) -> Option<&mut JsonSet> {
        match self {
            Value::JsonSet(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&JsonObject> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut JsonObject> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }
}

fn set_eq(a: &[Value], b: &[Value]) -> bool {
    a.iter().all(|item| b.contains(item)) && b.iter().all(|item| a.contains(item))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                (*a as f64) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            _ => {
                if let (Some(a), Some(b)) = (self.as_list(), other.as_list()) {
                    return a == b;
                }
                if let (Some(a), Some(b)) = (self.as_map(), other.as_map()) {
                    return a == b;
                }
                if let (Some(a), Some(b)) = (self.as_set_items(), other.as_set_items()) {
                    return set_eq(a, b);
                }
                false
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<'a>(
            f: &mut fmt::Formatter<'_>,
            open: &str,
            items: impl Iterator<Item = &'a Value>,
            close: &str,
        ) -> fmt::Result {
            f.write_str(open)?;
            for (i, item) in items.enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", item)?;
            }
            f.write_str(close)
        }

        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Decimal(d) => write!(f, "Decimal({})", d),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Value::List(_) | Value::JsonArray(_) => {
                join(f, "[", self.as_list().unwrap_or_default().iter(), "]")
            }
            Value::Set(_) | Value::JsonSet(_) => {
                join(f, "{", self.as_set_items().unwrap_or_default().iter(), "}")
            }
            Value::Map(map) => write_map(f, map),
            Value::JsonDict(dict) => write_map(f, dict.entries()),
            Value::Object(object) => write!(f, "{}", object),
        }
    }
}

fn write_map(f: &mut fmt::Formatter<'_>, map: &BTreeMap<String, Value>) -> fmt::Result {
    f.write_str("{")?;
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{:?}: {}", key, value)?;
    }
    f.write_str("}")
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Value::Time(t)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<JsonArray> for Value {
    fn from(array: JsonArray) -> Self {
        Value::JsonArray(array)
    }
}

impl From<JsonDict> for Value {
    fn from(dict: JsonDict) -> Self {
        Value::JsonDict(dict)
    }
}

impl From<JsonSet> for Value {
    fn from(set: JsonSet) -> Self {
        Value::JsonSet(set)
    }
}

impl From<JsonObject> for Value {
    fn from(object: JsonObject) -> Self {
        Value::Object(object)
    }
}

/// Build a plain [`Value::Map`] from key/value pairs
pub fn map<K, V, I>(entries: I) -> Value
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    )
}

/// Build a plain [`Value::Set`] from members
pub fn set<V, I>(members: I) -> Value
where
    V: Into<Value>,
    I: IntoIterator<Item = V>,
{
    Value::Set(members.into_iter().map(Into::into).collect())
}
