//! Configuration parameters for persistence components.
//!
//! [`ConfigParams`] is a flat map from dotted keys (`"options.max_page_size"`) to JSON values.
//! Nested JSON objects are flattened into dotted keys on construction, so both of these
//! describe the same configuration:
//!
//! ```ignore
//! use recordlayer_core::config::ConfigParams;
//! use serde_json::json;
//!
//! let flat = ConfigParams::from_tuples([("options.max_page_size", json!(10))]);
//! let nested = ConfigParams::from_value(json!({ "options": { "max_page_size": 10 } }))?;
//! assert_eq!(flat, nested);
//! ```

use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{PersistenceError, PersistenceResult};

/// Key of the page size clamp recognized by the memory stores.
pub const MAX_PAGE_SIZE_KEY: &str = "options.max_page_size";

/// A flat, dotted-key set of configuration values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigParams {
    values: BTreeMap<String, Value>,
}

impl ConfigParams {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration from `(key, value)` pairs.
    pub fn from_tuples<K, V>(tuples: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            values: tuples
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Creates a configuration from a JSON object, flattening nested objects into dotted keys.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Configuration`] if `value` is not a JSON object.
    pub fn from_value(value: Value) -> PersistenceResult<Self> {
        let Value::Object(map) = value else {
            return Err(PersistenceError::Configuration(format!(
                "expected configuration object, got {value}"
            )));
        };

        let mut config = Self::new();
        for (key, value) in map {
            config.flatten_into(key, value);
        }

        Ok(config)
    }

    fn flatten_into(&mut self, prefix: String, value: Value) {
        match value {
            Value::Object(map) => {
                for (key, value) in map {
                    self.flatten_into(format!("{prefix}.{key}"), value);
                }
            }
            other => {
                self.values.insert(prefix, other);
            }
        }
    }

    /// Sets a value, replacing any previous value for the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns the raw value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns `true` if a value is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns the value under `key` as an integer.
    ///
    /// Integers, whole-valued floats (`10.0`) and strings holding an integer are accepted.
    /// A missing key or JSON `null` yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Configuration`] if the value cannot be read as an integer.
    pub fn get_as_integer(&self, key: &str) -> PersistenceResult<Option<i64>> {
        let Some(value) = self.values.get(key) else {
            return Ok(None);
        };

        let parsed = match value {
            Value::Null => return Ok(None),
            Value::Number(number) => number.as_i64().or_else(|| {
                number
                    .as_f64()
                    .filter(|float| float.fract() == 0.0 && float.abs() < i64::MAX as f64)
                    .map(|float| float as i64)
            }),
            Value::String(text) => text.trim().parse::<i64>().ok(),
            _ => None,
        };

        parsed.map(Some).ok_or_else(|| {
            PersistenceError::Configuration(format!("{key} must be an integer, got {value}"))
        })
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
