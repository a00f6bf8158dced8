//! Generation records: the key → value data used to fill a template.
//!
//! A record is a flat JSON object whose values are scalars. Parsing is the
//! only fallible step; once parsed, lookups never fail. Unknown keys are kept
//! but ignored by generation, and missing keys read as blank.

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;

use std::collections::BTreeMap;

use serde_json::Value;

/// Error returned by [`GenerationRecord::from_json`].
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The input is not valid JSON.
    #[error("invalid record JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The top-level value is not an object.
    #[error("record must be a JSON object")]
    NotAnObject,
    /// A value is an array or object.
    #[error("value for `{key}` must be a string, number, boolean or null")]
    NonScalar { key: String },
}

/// Key → scalar mapping supplied for one generation request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRecord {
    values: BTreeMap<String, Value>,
}

impl GenerationRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a record from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `Json` for unparsable input, `NotAnObject` if the top level is
    /// not an object, and `NonScalar` for nested arrays/objects.
    pub fn from_json(text: &str) -> Result<Self, RecordError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Build a record from an already parsed JSON value.
    ///
    /// # Errors
    ///
    /// Same as [`GenerationRecord::from_json`], minus `Json`.
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        let Value::Object(map) = value else {
            return Err(RecordError::NotAnObject);
        };
        let mut values = BTreeMap::new();
        for (key, value) in map {
            if value.is_array() || value.is_object() {
                return Err(RecordError::NonScalar { key });
            }
            values.insert(key, value);
        }
        Ok(Self { values })
    }

    /// Set a value, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Value for `key` unless it is absent, null or the empty string.
    #[must_use]
    pub fn filled(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !is_blank(v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// String form of a scalar value, as written into a text field.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Strict checkbox truth: boolean `true` or the string `"true"` in any case.
#[must_use]
pub fn is_checked(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
