//! Attribute values.

use crate::error::ModelError;
use crate::metamodel::DataType;
use std::fmt;

/// A primitive attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Boolean(bool),
    Float(f64),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::String(_) => DataType::String,
            Value::Int(_) => DataType::Int,
            Value::Boolean(_) => DataType::Boolean,
            Value::Float(_) => DataType::Float,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Convert to `data_type`, widening integers to floats.
    pub(crate) fn coerce(self, data_type: DataType) -> Result<Value, ModelError> {
        match (self, data_type) {
            (Value::Int(i), DataType::Float) => Ok(Value::Float(i as f64)),
            (value, expected) if value.data_type() == expected => Ok(value),
            (value, expected) => Err(ModelError::Feature(format!(
                "expected a {:?} value, got {}",
                expected, value
            ))),
        }
    }

    pub(crate) fn from_json(
        data_type: DataType,
        json: &serde_json::Value,
    ) -> Result<Value, ModelError> {
        let value = match data_type {
            DataType::String => json.as_str().map(|s| Value::String(s.to_string())),
            DataType::Int => json.as_i64().map(Value::Int),
            DataType::Boolean => json.as_bool().map(Value::Boolean),
            DataType::Float => json.as_f64().map(Value::Float),
        };
        value.ok_or_else(|| {
            ModelError::Codec(format!("expected a {:?} value, found {}", data_type, json))
        })
    }

    pub(crate) fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Float(f) => serde_json::Value::from(*f),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}
