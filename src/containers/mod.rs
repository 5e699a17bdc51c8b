//! Mutable containers that keep a typed view and a canonical JSON backing
//! in step
//!
//! Each container owns both sides. Every mutation converts its input through
//! the element property *first*, and only then writes the canonical backing
//! and the typed view, so a rejected value leaves the container untouched.
//!
//! Mutating a container nested inside another container (or inside a
//! document) goes through [`ValueMut`], which re-derives the parent's
//! canonical slot from the child when it is dropped.

mod array;
mod dict;
mod set;

use std::ops::Deref;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use crate::error::Result;
use crate::object::JsonObject;
use crate::properties::Property;
use crate::value::Value;

pub use array::JsonArray;
pub use dict::{DictKey, JsonDict};
pub use set::JsonSet;

/// Decode one element, normalizing its canonical form
///
/// A null element is checked against the element property's required flag
/// here, exactly as [`unwrap_element`] does for assigned values.
pub(crate) fn wrap_element(wrapper: &dyn Property, json: &JsonValue) -> Result<(Value, JsonValue)> {
    if json.is_null() && !wrapper.wraps_null() {
        wrapper.validate(&Value::Null, true, false)?;
        return Ok((Value::Null, JsonValue::Null));
    }
    let value = wrapper.wrap(json)?;
    wrapper.unwrap(value)
}

/// Convert one element on its way in; elements are always checked as required
pub(crate) fn unwrap_element(wrapper: &dyn Property, value: Value) -> Result<(Value, JsonValue)> {
    wrapper.validate_and_unwrap(value, false)
}

/// Whether a container bound to `current` can be reused under `target`
/// without re-converting its elements
pub(crate) fn compatible_wrappers(current: &Arc<dyn Property>, target: &Arc<dyn Property>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(current), Arc::as_ptr(target))
        || (current.is_catch_all() && target.is_catch_all())
}

enum Slot<'a> {
    Json(&'a mut JsonValue),
    Key {
        map: &'a mut Map<String, JsonValue>,
        key: String,
        exclude_if_none: bool,
    },
}

/// Mutable access to a value stored inside a container or document
///
/// Reads go through `Deref`. Bound containers and nested documents are
/// reachable mutably through the `as_*_mut` accessors; when the guard is
/// dropped the canonical slot it came from is rewritten from the nested
/// value's canonical backing.
///
/// Scalars cannot be replaced through a guard; assign them through the
/// owning container instead. Swapping a whole nested container for one
/// bound to a different element property bypasses validation.
pub struct ValueMut<'a> {
    value: &'a mut Value,
    slot: Slot<'a>,
}

impl<'a> ValueMut<'a> {
    pub(crate) fn positional(value: &'a mut Value, json: &'a mut JsonValue) -> Self {
        Self {
            value,
            slot: Slot::Json(json),
        }
    }

    pub(crate) fn keyed(
        value: &'a mut Value,
        map: &'a mut Map<String, JsonValue>,
        key: &str,
        exclude_if_none: bool,
    ) -> Self {
        Self {
            value,
            slot: Slot::Key {
                map,
                key: key.to_string(),
                exclude_if_none,
            },
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut JsonArray> {
        self.value.as_array_mut()
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut JsonDict> {
        self.value.as_dict_mut()
    }

    pub fn as_set_mut(&mut self) -> Option<&mut JsonSet> {
        self.value.as_set_mut()
    }

    pub fn as_object_mut(&mut self) -> Option<&mut JsonObject> {
        self.value.as_object_mut()
    }
}

impl Deref for ValueMut<'_> {
    type Target = Value;

    fn deref(&self) -> &Value {
        self.value
    }
}

impl Drop for ValueMut<'_> {
    fn drop(&mut self) {
        let Some(json) = self.value.bound_json() else {
            return;
        };
        match &mut self.slot {
            Slot::Json(slot) => **slot = json,
            Slot::Key {
                map,
                key,
                exclude_if_none,
            } => {
                if *exclude_if_none && !self.value.is_truthy() {
                    map.remove(key.as_str());
                } else {
                    map.insert(key.clone(), json);
                }
            }
        }
    }
}

impl std::fmt::Debug for ValueMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ValueMut").field(&*self.value).finish()
    }
}
