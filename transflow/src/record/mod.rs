//! The mutable record that flows through a pipeline.
//!
//! A [`Record`] is moved into every transform call and handed back through
//! the [`TransformOutput`](crate::core::TransformOutput), so exactly one stage
//! owns it at any time.

use crate::errors::TransformError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::hash_map;
use std::collections::HashMap;

/// A mapping from string keys to arbitrary JSON values.
///
/// Key order carries no meaning. Transforms agree on key names by convention.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    data: HashMap<String, Value>,
}

/// Returns the JSON type name of a value, for error messages.
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record from existing data.
    #[must_use]
    pub fn from_data(data: HashMap<String, Value>) -> Self {
        Self { data }
    }

    /// Creates a record from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns a precondition error if the value is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, TransformError> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(TransformError::precondition(format!(
                "a record must be a JSON object, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Gets a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Gets a mutable reference to a value.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    /// Inserts or overwrites a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Removes a value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns all keys.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.data.keys().map(String::as_str).collect()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the record has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates over the entries.
    pub fn iter(&self) -> hash_map::Iter<'_, String, Value> {
        self.data.iter()
    }

    /// Consumes the record, returning the underlying map.
    #[must_use]
    pub fn into_inner(self) -> HashMap<String, Value> {
        self.data
    }

    /// Returns the record as a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.data
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Gets a value that a transform requires.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::MissingKey` if the key is absent.
    pub fn require(&self, key: &str) -> Result<&Value, TransformError> {
        self.data
            .get(key)
            .ok_or_else(|| TransformError::missing_key(key))
    }

    /// Gets a mutable reference to a value that a transform requires.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::MissingKey` if the key is absent.
    pub fn require_mut(&mut self, key: &str) -> Result<&mut Value, TransformError> {
        self.data
            .get_mut(key)
            .ok_or_else(|| TransformError::missing_key(key))
    }

    /// Gets a required integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is absent or does not hold an integer.
    pub fn require_i64(&self, key: &str) -> Result<i64, TransformError> {
        let value = self.require(key)?;
        value
            .as_i64()
            .ok_or_else(|| TransformError::invalid_type(key, "integer", type_name(value)))
    }

    /// Gets a required number.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is absent or does not hold a number.
    pub fn require_f64(&self, key: &str) -> Result<f64, TransformError> {
        let value = self.require(key)?;
        value
            .as_f64()
            .ok_or_else(|| TransformError::invalid_type(key, "number", type_name(value)))
    }

    /// Gets a required string.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is absent or does not hold a string.
    pub fn require_str(&self, key: &str) -> Result<&str, TransformError> {
        let value = self.require(key)?;
        value
            .as_str()
            .ok_or_else(|| TransformError::invalid_type(key, "string", type_name(value)))
    }

    /// Gets a required array.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is absent or does not hold an array.
    pub fn require_array(&self, key: &str) -> Result<&Vec<Value>, TransformError> {
        let value = self.require(key)?;
        value
            .as_array()
            .ok_or_else(|| TransformError::invalid_type(key, "array", type_name(value)))
    }
}

impl From<HashMap<String, Value>> for Record {
    fn from(data: HashMap<String, Value>) -> Self {
        Self::from_data(data)
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<K, V> Extend<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.data
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = hash_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = hash_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
