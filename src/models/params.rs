//! Ordered multi-valued request parameters.

use serde::{Deserialize, Serialize};

/// Ordered mapping from parameter name to one or more values.
///
/// Keys keep the order in which they were first inserted, so the encoded
/// query string is deterministic. `set` replaces every prior value for a key;
/// `add` and `merge_with` append.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamBag {
    entries: Vec<(String, Vec<String>)>,
}

impl ParamBag {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bag from single-valued pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut bag = Self::new();
        for (key, value) in pairs {
            bag.add(key, value);
        }
        bag
    }

    /// Values for a key, if any were set
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    /// First value for a key
    pub fn get_first(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Whether the key is present with at least one value
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some_and(|values| !values.is_empty())
    }

    /// Whether the key carries exactly this value among its values
    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.get(key)
            .is_some_and(|values| values.iter().any(|v| v == value))
    }

    /// Replace all values for a key with a single value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set_all(key, vec![value.into()]);
    }

    /// Replace all values for a key
    pub fn set_all(&mut self, key: impl Into<String>, values: Vec<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = values,
            None => self.entries.push((key, values)),
        }
    }

    /// Append a value to a key
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Remove a key and return its values
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Append every value of `other` to this bag
    pub fn merge_with(&mut self, other: &ParamBag) {
        for (key, values) in &other.entries {
            for value in values {
                self.add(key.clone(), value.clone());
            }
        }
    }

    /// Iterate over `(key, value)` pairs in insertion order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(key, values)| {
            values
                .iter()
                .map(move |value| (key.as_str(), value.as_str()))
        })
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag holds no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode as a URL query string, escaping every key and value
    pub fn to_query_string(&self) -> String {
        self.pairs()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
