//! Record values for stratamap
//!
//! This module defines:
//! - [`Value`]: one property value of a record
//! - [`Record`]: the generic record used when no static record type exists
//! - [`FieldState`]: the three observable states of a record property
//!
//! ## Absent vs Null
//!
//! A generic record distinguishes a property that is not present at all
//! (absent) from one that is present with an explicit null. Encoders treat
//! the two differently, so the distinction is kept in the type: absence is
//! "no map entry", explicit null is `Value::Null`.

use crate::vector::VectorValue;
use std::collections::BTreeMap;

/// One property value
///
/// Different variants are never equal, even if they hold the same number:
/// `Int32(1) != Int64(1)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit null
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 32-bit float
    Float32(f32),
    /// 64-bit float
    Float64(f64),
    /// UTF-8 string
    String(String),
    /// List of strings (tag sets)
    StringList(Vec<String>),
    /// Numeric vector
    Vector(VectorValue),
}

impl Value {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::StringList(_) => "string_list",
            Value::Vector(_) => "vector",
        }
    }

    /// Check if this is an explicit null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as vector if this is a Vector value
    pub fn as_vector(&self) -> Option<&VectorValue> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float32(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float64(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::StringList(v)
    }
}

impl From<VectorValue> for Value {
    fn from(v: VectorValue) -> Self {
        Value::Vector(v)
    }
}

impl From<Vec<f32>> for Value {
    fn from(v: Vec<f32>) -> Self {
        Value::Vector(VectorValue::Float32(v))
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Vector(VectorValue::Float64(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ============================================================================
// FieldState
// ============================================================================

/// Observable state of one property in a generic record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldState<'a> {
    /// The property is not present at all
    Absent,
    /// The property is present with an explicit null
    Null,
    /// The property holds a value
    Present(&'a Value),
}

// ============================================================================
// Record
// ============================================================================

/// Generic record keyed by logical property name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Record::default()
    }

    /// Builder: set a property
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set a property, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Remove a property, making it absent
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Get a property value (explicit nulls are returned as `Value::Null`)
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Three-state view of a property
    pub fn state(&self, name: &str) -> FieldState<'_> {
        match self.fields.get(name) {
            None => FieldState::Absent,
            Some(Value::Null) => FieldState::Null,
            Some(v) => FieldState::Present(v),
        }
    }

    /// Check if a property is present (null counts as present)
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of present properties
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no properties are present
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate present properties in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}
