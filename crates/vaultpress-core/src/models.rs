//! Core data models for exported documents.
//!
//! These types are designed to be:
//! - **Ordered**: front matter keeps insertion order so re-serialization is stable
//! - **Serializable**: [`FrontMatter`] serializes as a YAML/JSON mapping
//! - **Type-Safe**: values are either a scalar or a list, never arbitrary trees

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Reserved front matter keys with special handling.
pub mod keys {
    pub const TITLE: &str = "title";
    pub const DATE: &str = "date";
    pub const DATETIME: &str = "datetime";
    pub const TAGS: &str = "tags";
    pub const NANO_ID: &str = "nanoId";
    pub const PERMALINK: &str = "permalink";
}

/// A single front matter value
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum FrontMatterValue {
    Scalar(String),
    List(Vec<String>),
}

impl FrontMatterValue {
    /// Borrow the scalar text, if this is a scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::List(_) => None,
        }
    }

    /// View the value as a list (a scalar becomes a one-element list, empty scalars none)
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::Scalar(s) if s.is_empty() => vec![],
            Self::Scalar(s) => vec![s.clone()],
            Self::List(items) => items.clone(),
        }
    }
}

impl From<&str> for FrontMatterValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for FrontMatterValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<String>> for FrontMatterValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Ordered front matter mapping.
///
/// Setting an existing key replaces its value in place, so the position of
/// the key in the serialized block never moves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    entries: Vec<(String, FrontMatterValue)>,
}

impl FrontMatter {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&FrontMatterValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Look up a scalar value by key
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FrontMatterValue::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace a value, keeping the key's original position
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FrontMatterValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Remove a key, returning its value
    pub fn remove(&mut self, key: &str) -> Option<FrontMatterValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FrontMatterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Tags as a list (accepts both `tags: a` and `tags: [a, b]`)
    pub fn tags(&self) -> Vec<String> {
        self.get(keys::TAGS)
            .map(FrontMatterValue::to_list)
            .unwrap_or_default()
    }

    pub fn title(&self) -> Option<&str> {
        self.get_str(keys::TITLE)
    }

    pub fn nano_id(&self) -> Option<&str> {
        self.get_str(keys::NANO_ID).filter(|id| !id.is_empty())
    }

    pub fn permalink(&self) -> Option<&str> {
        self.get_str(keys::PERMALINK)
    }
}

impl Serialize for FrontMatter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<FrontMatterValue>> FromIterator<(K, V)> for FrontMatter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fm = FrontMatter::new();
        for (k, v) in iter {
            fm.set(k, v);
        }
        fm
    }
}
