use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{unwrap_element, wrap_element};
use crate::error::{Error, Result};
use crate::properties::Property;
use crate::value::Value;

/// A set with a canonical JSON array backing
///
/// Members keep insertion order on both sides; membership is decided by
/// equality of the typed values.
#[derive(Debug, Clone)]
pub struct JsonSet {
    obj: Vec<JsonValue>,
    items: Vec<Value>,
    wrapper: Arc<dyn Property>,
}

impl JsonSet {
    /// An empty set whose members go through `wrapper`
    pub fn new(wrapper: Arc<dyn Property>) -> Self {
        Self {
            obj: Vec::new(),
            items: Vec::new(),
            wrapper,
        }
    }

    /// Decode canonical members, dropping duplicates
    pub fn wrap(wrapper: Arc<dyn Property>, json: &[JsonValue]) -> Result<Self> {
        let mut set = Self::new(wrapper);
        for member in json {
            let (value, canonical) = wrap_element(set.wrapper.as_ref(), member)?;
            set.push_new(value, canonical);
        }
        Ok(set)
    }

    pub fn wrapper(&self) -> &Arc<dyn Property> {
        &self.wrapper
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.items.contains(value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    /// The canonical backing
    pub fn canonical(&self) -> &[JsonValue] {
        &self.obj
    }

    pub fn into_members(self) -> Vec<Value> {
        self.items
    }

    fn push_new(&mut self, value: Value, json: JsonValue) {
        if !self.items.contains(&value) {
            self.obj.push(json);
            self.items.push(value);
        }
    }

    fn remove_at(&mut self, index: usize) -> Value {
        self.obj.remove(index);
        self.items.remove(index)
    }

    fn convert_all<I, V>(&self, values: I) -> Result<Vec<(Value, JsonValue)>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        values
            .into_iter()
            .map(|value| unwrap_element(self.wrapper.as_ref(), value.into()))
            .collect()
    }

    /// Add a member; adding an existing member is a no-op
    pub fn add(&mut self, value: impl Into<Value>) -> Result<()> {
        let (value, json) = unwrap_element(self.wrapper.as_ref(), value.into())?;
        self.push_new(value, json);
        Ok(())
    }

    pub fn remove(&mut self, value: &Value) -> Result<()> {
        if self.discard(value) {
            Ok(())
        } else {
            Err(Error::ValueNotFound(value.to_string()))
        }
    }

    /// Remove `value` if present; returns whether it was
    pub fn discard(&mut self, value: &Value) -> bool {
        match self.items.iter().position(|item| item == value) {
            Some(index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }

    /// Remove and return the most recently added member
    pub fn pop(&mut self) -> Result<Value> {
        self.obj.pop();
        self.items.pop().ok_or(Error::Empty)
    }

    pub fn clear(&mut self) {
        self.obj.clear();
        self.items.clear();
    }

    /// Union in place
    pub fn update<I, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        for (value, json) in self.convert_all(values)? {
            self.push_new(value, json);
        }
        Ok(())
    }

    /// Keep only members also in `other`
    pub fn intersection_update<I, V>(&mut self, other: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let other: Vec<Value> = other.into_iter().map(Into::into).collect();
        self.retain(|member| other.contains(member));
    }

    /// Drop every member that is in `other`
    pub fn difference_update<I, V>(&mut self, other: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let other: Vec<Value> = other.into_iter().map(Into::into).collect();
        self.retain(|member| !other.contains(member));
    }

    /// Keep members in exactly one of `self` and `other`
    pub fn symmetric_difference_update<I, V>(&mut self, other: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut incoming: Vec<(Value, JsonValue)> = Vec::new();
        for (value, json) in self.convert_all(other)? {
            if !incoming.iter().any(|(seen, _)| *seen == value) {
                incoming.push((value, json));
            }
        }
        for (value, json) in incoming {
            if !self.discard(&value) {
                self.push_new(value, json);
            }
        }
        Ok(())
    }

    fn retain(&mut self, keep: impl Fn(&Value) -> bool) {
        for index in (0..self.items.len()).rev() {
            if !keep(&self.items[index]) {
                self.remove_at(index);
            }
        }
    }

    pub fn validate(&self, required: bool) -> Result<()> {
        for member in &self.items {
            self.wrapper.validate(member, required, true)?;
        }
        Ok(())
    }
}

impl PartialEq for JsonSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.items.iter().all(|item| other.contains(item))
    }
}

impl<'a> IntoIterator for &'a JsonSet {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
