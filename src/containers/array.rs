use std::cmp::Ordering;
use std::ops::Range;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{ValueMut, unwrap_element, wrap_element};
use crate::error::{Error, Result};
use crate::properties::Property;
use crate::value::Value;

/// A list with a canonical JSON array backing
///
/// Both sides always have the same length and order.
#[derive(Debug, Clone)]
pub struct JsonArray {
    obj: Vec<JsonValue>,
    items: Vec<Value>,
    wrapper: Arc<dyn Property>,
}

impl JsonArray {
    /// An empty array whose elements go through `wrapper`
    pub fn new(wrapper: Arc<dyn Property>) -> Self {
        Self {
            obj: Vec::new(),
            items: Vec::new(),
            wrapper,
        }
    }

    /// Decode canonical elements
    pub fn wrap(wrapper: Arc<dyn Property>, json: &[JsonValue]) -> Result<Self> {
        let mut array = Self::new(wrapper);
        array.obj.reserve(json.len());
        array.items.reserve(json.len());
        for item in json {
            let (value, canonical) = wrap_element(array.wrapper.as_ref(), item)?;
            array.items.push(value);
            array.obj.push(canonical);
        }
        Ok(array)
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

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
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

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(Error::IndexOutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }

    fn check_range(&self, range: &Range<usize>) -> Result<()> {
        if range.start > range.end {
            return Err(Error::IndexOutOfRange {
                index: range.start,
                len: self.items.len(),
            });
        }
        if range.end > self.items.len() {
            return Err(Error::IndexOutOfRange {
                index: range.end,
                len: self.items.len(),
            });
        }
        Ok(())
    }

    fn convert_all<I, V>(&self, values: I) -> Result<(Vec<Value>, Vec<JsonValue>)>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        values
            .into_iter()
            .map(|value| unwrap_element(self.wrapper.as_ref(), value.into()))
            .collect::<Result<Vec<_>>>()
            .map(|pairs| pairs.into_iter().unzip())
    }

    pub fn append(&mut self, value: impl Into<Value>) -> Result<()> {
        let (value, json) = unwrap_element(self.wrapper.as_ref(), value.into())?;
        self.obj.push(json);
        self.items.push(value);
        Ok(())
    }

    /// Append every value, or none of them if one is rejected
    pub fn extend<I, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let (items, obj) = self.convert_all(values)?;
        self.obj.extend(obj);
        self.items.extend(items);
        Ok(())
    }

    /// Insert before `index`; `index == len()` appends
    pub fn insert(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        if index > self.items.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        let (value, json) = unwrap_element(self.wrapper.as_ref(), value.into())?;
        self.obj.insert(index, json);
        self.items.insert(index, value);
        Ok(())
    }

    /// Replace the element at `index`
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        self.check_index(index)?;
        let (value, json) = unwrap_element(self.wrapper.as_ref(), value.into())?;
        self.obj[index] = json;
        self.items[index] = value;
        Ok(())
    }

    /// Remove the first element equal to `value`
    pub fn remove(&mut self, value: &Value) -> Result<()> {
        let index = self
            .items
            .iter()
            .position(|item| item == value)
            .ok_or_else(|| Error::ValueNotFound(value.to_string()))?;
        self.obj.remove(index);
        self.items.remove(index);
        Ok(())
    }

    /// Remove and return the last element
    pub fn pop(&mut self) -> Result<Value> {
        self.obj.pop();
        self.items.pop().ok_or(Error::Empty)
    }

    pub fn pop_at(&mut self, index: usize) -> Result<Value> {
        self.check_index(index)?;
        self.obj.remove(index);
        Ok(self.items.remove(index))
    }

    /// Stable sort by the typed values; the canonical backing follows
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&Value, &Value) -> Ordering,
    {
        let mut pairs: Vec<(Value, JsonValue)> = std::mem::take(&mut self.items)
            .into_iter()
            .zip(std::mem::take(&mut self.obj))
            .collect();
        pairs.sort_by(|a, b| compare(&a.0, &b.0));
        let (items, obj): (Vec<Value>, Vec<JsonValue>) = pairs.into_iter().unzip();
        self.items = items;
        self.obj = obj;
    }

    pub fn reverse(&mut self) {
        self.obj.reverse();
        self.items.reverse();
    }

    /// Replace the elements in `range` with `values` (slice assignment)
    pub fn replace_range<I, V>(&mut self, range: Range<usize>, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.check_range(&range)?;
        let (items, obj) = self.convert_all(values)?;
        self.obj.splice(range.clone(), obj);
        self.items.splice(range, items);
        Ok(())
    }

    /// Remove the elements in `range` (slice deletion)
    pub fn delete_range(&mut self, range: Range<usize>) -> Result<()> {
        self.check_range(&range)?;
        self.obj.drain(range.clone());
        self.items.drain(range);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.obj.clear();
        self.items.clear();
    }

    /// Mutable access to a nested container or document
    pub fn get_mut(&mut self, index: usize) -> Option<ValueMut<'_>> {
        let value = self.items.get_mut(index)?;
        let json = self.obj.get_mut(index)?;
        Some(ValueMut::positional(value, json))
    }

    /// Validate every element; `required` is passed down to nested documents
    pub fn validate(&self, required: bool) -> Result<()> {
        for item in &self.items {
            self.wrapper.validate(item, required, true)?;
        }
        Ok(())
    }
}

impl PartialEq for JsonArray {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<'a> IntoIterator for &'a JsonArray {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TypeConfig;
    use crate::properties::{DefaultProperty, IntegerProperty, PropertyOptionsExt};
    use serde_json::json;

    fn ints() -> JsonArray {
        JsonArray::new(Arc::new(IntegerProperty::new().required()))
    }

    #[test]
    fn test_append_and_extend() {
        let mut array = ints();
        array.append(1).unwrap();
        array.extend([2, 3]).unwrap();
        assert_eq!(array.canonical(), &[json!(1), json!(2), json!(3)]);
        assert_eq!(array.len(), 3);
    }

    #[test]
    fn test_failed_extend_changes_nothing() {
        let mut array = ints();
        array.append(1).unwrap();
        let err = array
            .extend(vec![Value::from(2), Value::from("three")])
            .unwrap_err();
        assert!(err.is_bad_value());
        assert_eq!(array.as_slice(), &[Value::from(1)]);
        assert_eq!(array.canonical(), &[json!(1)]);
    }

    #[test]
    fn test_positional_operations() {
        let mut array = ints();
        array.extend([5, 1, 4]).unwrap();
        array.insert(0, 9).unwrap();
        array.set(1, 7).unwrap();
        assert_eq!(array.canonical(), &[json!(9), json!(7), json!(1), json!(4)]);
        assert_eq!(array.pop_at(2).unwrap(), Value::from(1));
        assert_eq!(array.pop().unwrap(), Value::from(4));
        assert!(matches!(array.set(5, 1), Err(Error::IndexOutOfRange { index: 5, len: 2 })));
        assert!(array.insert(3, 1).is_err());
        array.remove(&Value::from(9)).unwrap();
        assert!(matches!(array.remove(&Value::from(9)), Err(Error::ValueNotFound(_))));
        assert_eq!(array.canonical(), &[json!(7)]);
    }

    #[test]
    fn test_sort_and_reverse_keep_views_aligned() {
        let mut array = ints();
        array.extend([3, 1, 2]).unwrap();
        array.sort_by(|a, b| a.as_i64().cmp(&b.as_i64()));
        assert_eq!(array.canonical(), &[json!(1), json!(2), json!(3)]);
        array.reverse();
        assert_eq!(array.as_slice(), &[Value::from(3), Value::from(2), Value::from(1)]);
        assert_eq!(array.canonical(), &[json!(3), json!(2), json!(1)]);
    }

    #[test]
    fn test_slices() {
        let mut array = ints();
        array.extend([1, 2, 3, 4]).unwrap();
        array.replace_range(1..3, [20, 30, 40]).unwrap();
        assert_eq!(
            array.canonical(),
            &[json!(1), json!(20), json!(30), json!(40), json!(4)]
        );
        array.delete_range(0..2).unwrap();
        assert_eq!(array.canonical(), &[json!(30), json!(40), json!(4)]);
        assert!(array.delete_range(2..9).is_err());
        assert!(array.replace_range(0..1, ["x"]).is_err());
        assert_eq!(array.len(), 3);
        array.clear();
        assert!(array.is_empty() && array.canonical().is_empty());
    }

    #[test]
    fn test_nested_mutation_resyncs_parent() {
        let any = Arc::new(DefaultProperty::bound(&TypeConfig::shared_default()));
        let mut array = JsonArray::wrap(any, &[json!([1]), json!("x")]).unwrap();
        {
            let mut nested = array.get_mut(0).unwrap();
            nested.as_array_mut().unwrap().append(2).unwrap();
        }
        assert_eq!(array.canonical(), &[json!([1, 2]), json!("x")]);
        assert!(array.get_mut(1).unwrap().as_array_mut().is_none());
        assert_eq!(array.canonical()[1], json!("x"));
    }

    #[test]
    fn test_null_elements_are_checked() {
        let mut array = ints();
        assert!(array.append(Value::Null).is_err());
        let mut loose = JsonArray::new(Arc::new(IntegerProperty::new()));
        loose.append(Value::Null).unwrap();
        assert_eq!(loose.canonical(), &[JsonValue::Null]);
    }
}
