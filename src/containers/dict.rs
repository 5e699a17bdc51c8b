use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use super::{ValueMut, unwrap_element, wrap_element};
use crate::error::{Error, Result};
use crate::properties::Property;
use crate::value::Value;

/// A dict key; integers are coerced to their decimal text
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DictKey(String);

impl DictKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DictKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DictKey {
    fn from(key: &str) -> Self {
        DictKey(key.to_string())
    }
}

impl From<String> for DictKey {
    fn from(key: String) -> Self {
        DictKey(key)
    }
}

impl From<&String> for DictKey {
    fn from(key: &String) -> Self {
        DictKey(key.clone())
    }
}

macro_rules! dict_key_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for DictKey {
                fn from(key: $t) -> Self {
                    DictKey(key.to_string())
                }
            }
        )*
    };
}

dict_key_from_int!(i32, i64, u32, u64, usize);

/// A string-keyed map with a canonical JSON object backing
#[derive(Debug, Clone)]
pub struct JsonDict {
    obj: Map<String, JsonValue>,
    items: BTreeMap<String, Value>,
    wrapper: Arc<dyn Property>,
}

impl JsonDict {
    /// An empty dict whose values go through `wrapper`
    pub fn new(wrapper: Arc<dyn Property>) -> Self {
        Self {
            obj: Map::new(),
            items: BTreeMap::new(),
            wrapper,
        }
    }

    /// Decode a canonical JSON object
    pub fn wrap(wrapper: Arc<dyn Property>, json: &Map<String, JsonValue>) -> Result<Self> {
        let mut dict = Self::new(wrapper);
        for (key, item) in json {
            let (value, canonical) = wrap_element(dict.wrapper.as_ref(), item)?;
            dict.items.insert(key.clone(), value);
            dict.obj.insert(key.clone(), canonical);
        }
        Ok(dict)
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

    pub fn get(&self, key: impl Into<DictKey>) -> Option<&Value> {
        self.items.get(key.into().as_str())
    }

    pub fn contains_key(&self, key: impl Into<DictKey>) -> bool {
        self.items.contains_key(key.into().as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, String, Value> {
        self.items.iter()
    }

    /// The typed entries
    pub fn entries(&self) -> &BTreeMap<String, Value> {
        &self.items
    }

    /// The canonical backing
    pub fn canonical(&self) -> &Map<String, JsonValue> {
        &self.obj
    }

    pub fn into_entries(self) -> BTreeMap<String, Value> {
        self.items
    }

    pub fn set(&mut self, key: impl Into<DictKey>, value: impl Into<Value>) -> Result<()> {
        let key = key.into().into_string();
        let (value, json) = unwrap_element(self.wrapper.as_ref(), value.into())?;
        self.obj.insert(key.clone(), json);
        self.items.insert(key, value);
        Ok(())
    }

    pub fn delete(&mut self, key: impl Into<DictKey>) -> Result<()> {
        self.pop(key).map(|_| ())
    }

    /// Set every entry, or none of them if one is rejected
    pub fn update<I, K, V>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<DictKey>,
        V: Into<Value>,
    {
        let converted = entries
            .into_iter()
            .map(|(key, value)| {
                let key = key.into().into_string();
                unwrap_element(self.wrapper.as_ref(), value.into()).map(|pair| (key, pair))
            })
            .collect::<Result<Vec<_>>>()?;
        for (key, (value, json)) in converted {
            self.obj.insert(key.clone(), json);
            self.items.insert(key, value);
        }
        Ok(())
    }

    pub fn pop(&mut self, key: impl Into<DictKey>) -> Result<Value> {
        let key = key.into();
        self.obj.remove(key.as_str());
        self.items
            .remove(key.as_str())
            .ok_or_else(|| Error::NoSuchKey(key.into_string()))
    }

    /// Remove `key`, or return `default` unconverted when it is absent
    pub fn pop_or(&mut self, key: impl Into<DictKey>, default: impl Into<Value>) -> Value {
        self.pop(key).unwrap_or_else(|_| default.into())
    }

    /// Remove and return the entry with the greatest key
    pub fn popitem(&mut self) -> Result<(String, Value)> {
        let (key, value) = self.items.pop_last().ok_or(Error::Empty)?;
        self.obj.remove(&key);
        Ok((key, value))
    }

    /// The value at `key`, inserting `default` first when absent
    pub fn setdefault(
        &mut self,
        key: impl Into<DictKey>,
        default: impl Into<Value>,
    ) -> Result<&Value> {
        let key = key.into().into_string();
        if !self.items.contains_key(&key) {
            self.set(key.as_str(), default)?;
        }
        self.items.get(&key).ok_or(Error::NoSuchKey(key))
    }

    pub fn clear(&mut self) {
        self.obj.clear();
        self.items.clear();
    }

    /// Mutable access to a nested container or document
    pub fn get_mut(&mut self, key: impl Into<DictKey>) -> Option<ValueMut<'_>> {
        let key = key.into();
        let value = self.items.get_mut(key.as_str())?;
        Some(ValueMut::keyed(value, &mut self.obj, key.as_str(), false))
    }

    pub fn validate(&self, required: bool) -> Result<()> {
        for value in self.items.values() {
            self.wrapper.validate(value, required, true)?;
        }
        Ok(())
    }
}

impl PartialEq for JsonDict {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<'a> IntoIterator for &'a JsonDict {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

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

    fn ints() -> JsonDict {
        JsonDict::new(Arc::new(IntegerProperty::new().required()))
    }

    #[test]
    fn test_set_get_delete() {
        let mut dict = ints();
        dict.set("one", 1).unwrap();
        dict.set(2, 2).unwrap();
        assert_eq!(dict.get("2"), Some(&Value::from(2)));
        assert_eq!(JsonValue::Object(dict.canonical().clone()), json!({"one": 1, "2": 2}));
        dict.delete("one").unwrap();
        assert!(matches!(dict.delete("one"), Err(Error::NoSuchKey(_))));
        assert!(dict.set("bad", "x").unwrap_err().is_bad_value());
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_update_is_atomic() {
        let mut dict = ints();
        dict.update([("one", 1), ("two", 2)]).unwrap();
        let err = dict.update(vec![("three", Value::from(3)), ("four", Value::from("4"))]);
        assert!(err.is_err());
        assert!(!dict.contains_key("three"));
        assert_eq!(dict.canonical().len(), 2);
    }

    #[test]
    fn test_pop_variants() {
        let mut dict = ints();
        dict.update([("a", 1), ("b", 2)]).unwrap();
        assert_eq!(dict.pop("a").unwrap(), Value::from(1));
        assert_eq!(dict.pop_or("a", 0), Value::from(0));
        assert_eq!(dict.popitem().unwrap(), ("b".to_string(), Value::from(2)));
        assert!(matches!(dict.popitem(), Err(Error::Empty)));
        assert!(dict.canonical().is_empty());
    }

    #[test]
    fn test_setdefault() {
        let mut dict = ints();
        assert_eq!(dict.setdefault("a", 5).unwrap(), &Value::from(5));
        assert_eq!(dict.setdefault("a", 6).unwrap(), &Value::from(5));
        assert!(dict.setdefault("b", "x").is_err());
        assert_eq!(dict.canonical().get("a"), Some(&json!(5)));
    }

    #[test]
    fn test_nested_mutation_resyncs_parent() {
        let any = Arc::new(DefaultProperty::bound(&TypeConfig::shared_default()));
        let mut dict = JsonDict::wrap(any, json!({"inner": {"x": 1}}).as_object().unwrap()).unwrap();
        dict.get_mut("inner")
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("y", 2)
            .unwrap();
        assert_eq!(
            JsonValue::Object(dict.canonical().clone()),
            json!({"inner": {"x": 1, "y": 2}})
        );
    }
}
