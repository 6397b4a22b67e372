//! String-keyed property maps
//!
//! A [`PropertyMap`] is the backing source of a map shim. Keys compare
//! either ordinally or ignoring case; insertion order is kept.

use crate::error::{Error, Result};
use crate::types::TypeDesc;
use crate::value::{Array, MapRef, Value};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How keys are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyComparison {
    /// Exact, case-sensitive comparison
    #[default]
    Ordinal,
    /// Case-insensitive comparison
    IgnoreCase,
}

impl KeyComparison {
    /// Whether two keys are equal under this comparison
    pub fn eq(&self, a: &str, b: &str) -> bool {
        match self {
            KeyComparison::Ordinal => a == b,
            KeyComparison::IgnoreCase => eq_ignore_case(a, b),
        }
    }
}

/// Case-insensitive string equality
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// A string-keyed map with interior mutability
#[derive(Debug, Default)]
pub struct PropertyMap {
    comparison: KeyComparison,
    entries: RwLock<Vec<(String, Value)>>,
}

impl PropertyMap {
    /// Create an empty, case-sensitive map
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty, case-insensitive map
    pub fn case_insensitive() -> Self {
        Self::with_comparison(KeyComparison::IgnoreCase)
    }

    pub fn with_comparison(comparison: KeyComparison) -> Self {
        Self {
            comparison,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Wrap in a shared handle
    pub fn shared(self) -> MapRef {
        Arc::new(self)
    }

    pub fn comparison(&self) -> KeyComparison {
        self.comparison
    }

    /// Builder-style insert
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Value stored under `key`
    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read();
        entries
            .iter()
            .find(|(k, _)| self.comparison.eq(k, key))
            .map(|(_, v)| v.clone())
    }

    /// The stored spelling of the key matching `key`
    pub fn entry_key(&self, key: &str) -> Option<String> {
        let entries = self.entries.read();
        entries
            .iter()
            .find(|(k, _)| self.comparison.eq(k, key))
            .map(|(k, _)| k.clone())
    }

    /// Resolve `key`, ignoring case when `ignore_case` is set
    ///
    /// An entry matching under the map's own comparison wins over a
    /// case-insensitive match.
    pub fn resolve(&self, key: &str, ignore_case: bool) -> Option<(String, Value)> {
        let entries = self.entries.read();
        let exact = entries.iter().find(|(k, _)| self.comparison.eq(k, key));
        let found = match exact {
            Some(entry) => Some(entry),
            None if ignore_case => entries.iter().find(|(k, _)| eq_ignore_case(k, key)),
            None => None,
        };
        found.cloned()
    }

    /// Insert or replace, returning the previous value
    ///
    /// Replacing keeps the stored spelling of the key.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|(k, _)| self.comparison.eq(k, &key)) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.write();
        let index = entries.iter().position(|(k, _)| self.comparison.eq(k, key))?;
        Some(entries.remove(index).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entry_key(key).is_some()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Build a map from a JSON object
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if `json` is not an object.
    pub fn from_json(json: &serde_json::Value, comparison: KeyComparison) -> Result<MapRef> {
        match json {
            serde_json::Value::Object(entries) => {
                Ok(Arc::new(Self::from_json_object(entries, comparison)))
            }
            other => Err(Error::invalid_input(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }

    /// Parse a JSON document into a map
    pub fn from_json_str(json: &str, comparison: KeyComparison) -> Result<MapRef> {
        let parsed: serde_json::Value = serde_json::from_str(json)?;
        Self::from_json(&parsed, comparison)
    }

    pub(crate) fn from_json_object(
        entries: &serde_json::Map<String, serde_json::Value>,
        comparison: KeyComparison,
    ) -> Self {
        let map = Self::with_comparison(comparison);
        for (key, value) in entries {
            map.insert(key.clone(), Self::value_from_json(value, comparison));
        }
        map
    }

    // Nested objects, including those inside arrays, keep `comparison`.
    fn value_from_json(json: &serde_json::Value, comparison: KeyComparison) -> Value {
        match json {
            serde_json::Value::Object(nested) => {
                Value::Map(Arc::new(Self::from_json_object(nested, comparison)))
            }
            serde_json::Value::Array(items) => Value::Array(Array::with_items(
                TypeDesc::Any,
                items
                    .iter()
                    .map(|item| Self::value_from_json(item, comparison))
                    .collect(),
            )),
            other => Value::from_json(other),
        }
    }

    /// Export as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        let entries = self.entries.read();
        let object = entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_lookup() {
        let map = PropertyMap::new().with("Name", "Bob");

        assert_eq!(map.get("Name"), Some(Value::from("Bob")));
        assert_eq!(map.get("name"), None);
        assert_eq!(map.resolve("name", true).map(|(k, _)| k), Some("Name".to_string()));
    }

    #[test]
    fn test_ignore_case_lookup() {
        let map = PropertyMap::case_insensitive().with("Name", "Bob");

        assert_eq!(map.get("NAME"), Some(Value::from("Bob")));
        assert_eq!(map.entry_key("name"), Some("Name".to_string()));

        map.insert("name", "Alice");
        assert_eq!(map.len(), 1);
        assert_eq!(map.keys(), vec!["Name".to_string()]);
        assert_eq!(map.get("Name"), Some(Value::from("Alice")));
    }

    #[test]
    fn test_remove() {
        let map = PropertyMap::new().with("a", 1).with("b", 2);
        assert_eq!(map.remove("a"), Some(Value::Int(1)));
        assert_eq!(map.remove("a"), None);
        assert_eq!(map.keys(), vec!["b".to_string()]);
    }

    #[test]
    fn test_json_roundtrip() {
        let json = serde_json::json!({ "Id": 3, "Tags": ["x"], "Owner": { "Name": "Bob" } });
        let map = PropertyMap::from_json(&json, KeyComparison::Ordinal).unwrap();

        assert_eq!(map.to_json(), json);
    }

    #[test]
    fn test_json_comparison_reaches_maps_in_arrays() {
        let json = serde_json::json!({ "Staff": [{ "Name": "Ada" }, [{ "Name": "Bob" }]] });
        let map = PropertyMap::from_json(&json, KeyComparison::IgnoreCase).unwrap();

        let staff = map.get("staff").unwrap();
        let items = staff.as_array().unwrap().items();
        let first = items[0].as_map().unwrap();
        assert_eq!(first.comparison(), KeyComparison::IgnoreCase);
        assert_eq!(first.get("NAME"), Some(Value::from("Ada")));

        let inner = items[1].as_array().unwrap().items()[0].as_map().unwrap().clone();
        assert_eq!(inner.comparison(), KeyComparison::IgnoreCase);
    }

    #[test]
    fn test_json_requires_object() {
        let err = PropertyMap::from_json(&serde_json::json!([1, 2]), KeyComparison::Ordinal);
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_unicode_case_folding() {
        assert!(eq_ignore_case("ÉCOLE", "école"));
        assert!(!eq_ignore_case("ÉCOLE", "ecole"));
    }
}
