//! The value tree produced by parsing a metadata block.
//!
//! The tree is bounded by the metadata schema: scalars, lists of scalars,
//! lists of maps and maps. Nothing deeper is representable.

use std::fmt;

use serde::{Serialize, Serializer, ser::SerializeMap};

/// A single scalar value.
///
/// The raw text is kept as written (minus surrounding quotes). Numeric and
/// boolean interpretations are computed on demand.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Scalar(String);

impl Scalar {
    /// Creates a scalar from raw text, stripping one layer of matching quotes.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        let unquoted = ['"', '\'']
            .iter()
            .find_map(|quote| {
                trimmed
                    .strip_prefix(*quote)
                    .and_then(|rest| rest.strip_suffix(*quote))
            })
            .unwrap_or(trimmed);
        Self(unquoted.to_string())
    }

    /// Returns the scalar text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interprets the scalar as an integer.
    ///
    /// Only values made up entirely of ASCII digits are integers.
    #[must_use]
    pub fn as_int(&self) -> Option<u64> {
        if !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit()) {
            self.0.parse().ok()
        } else {
            None
        }
    }

    /// Interprets the scalar as a boolean (`true` or `false`).
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.0.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Scalar {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(int) = self.as_int() {
            serializer.serialize_u64(int)
        } else if let Some(flag) = self.as_bool() {
            serializer.serialize_bool(flag)
        } else {
            serializer.serialize_str(&self.0)
        }
    }
}

/// An ordered map with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Map {
    entries: Vec<(String, Value)>,
}

impl Map {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts a value.
    ///
    /// A key that is already present keeps its position and has its value
    /// replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if let Some((_, existing)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            *existing = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Looks up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Looks up a scalar by key.
    #[must_use]
    pub fn scalar(&self, key: &str) -> Option<&Scalar> {
        self.get(key).and_then(Value::as_scalar)
    }

    /// Returns `true` if the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl Serialize for Map {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A node in the metadata tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// A single scalar.
    Scalar(Scalar),
    /// A list of scalars.
    List(Vec<Scalar>),
    /// A list of maps.
    MapList(Vec<Map>),
    /// A map of keys to values.
    Map(Map),
}

impl Value {
    /// Returns the scalar, if this is one.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Returns the map, if this is one.
    #[must_use]
    pub const fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

impl From<&str> for Value {
    fn from(raw: &str) -> Self {
        Self::Scalar(Scalar::new(raw))
    }
}
