//! Raw and typed configuration values.
//!
//! Source adapters produce [`RawValue`]s: whatever the origin could tell us,
//! usually a string. The merge engine coerces each winning raw value into the
//! [`ValueType`] declared by its schema entry, producing a typed [`Value`].

use std::fmt;

use serde::Serialize;

use crate::error::LayerfigError;

/// The declared type of a schema entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Int32,
    Bool,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::String => "string",
            ValueType::Int32 => "int32",
            ValueType::Bool => "bool",
        })
    }
}

/// An untyped value as produced by a source adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Str(s) => f.write_str(s),
            RawValue::Int(i) => write!(f, "{i}"),
            RawValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Str(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Str(s)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        RawValue::Int(i)
    }
}

impl From<i32> for RawValue {
    fn from(i: i32) -> Self {
        RawValue::Int(i64::from(i))
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl From<&Value> for RawValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => RawValue::Str(s.clone()),
            Value::Int32(i) => RawValue::Int(i64::from(*i)),
            Value::Bool(b) => RawValue::Bool(*b),
        }
    }
}

/// A typed, coerced configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Int32(i32),
    Bool(bool),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Int32(_) => ValueType::Int32,
            Value::Bool(_) => ValueType::Bool,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn to_toml(&self) -> toml::Value {
        match self {
            Value::String(s) => toml::Value::String(s.clone()),
            Value::Int32(i) => toml::Value::Integer(i64::from(*i)),
            Value::Bool(b) => toml::Value::Boolean(*b),
        }
    }

    /// Convert a TOML scalar into a typed value. Used when deriving defaults.
    pub fn from_toml(key: &str, value: &toml::Value) -> Result<Value, LayerfigError> {
        match value {
            toml::Value::String(s) => Ok(Value::String(s.clone())),
            toml::Value::Boolean(b) => Ok(Value::Bool(*b)),
            toml::Value::Integer(i) => {
                i32::try_from(*i)
                    .map(Value::Int32)
                    .map_err(|_| LayerfigError::UnsupportedType {
                        key: key.into(),
                        found: format!("integer {i} (out of int32 range)"),
                    })
            }
            other => Err(LayerfigError::UnsupportedType {
                key: key.into(),
                found: other.type_str().into(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Int32(i) => write!(f, "{i}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
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

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int32(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Coerce a raw value into `expected`, or fail with [`LayerfigError::TypeMismatch`].
///
/// - string: accepts anything; integers and booleans are rendered as text.
/// - int32: integers in range, or strings that parse as one (surrounding
///   whitespace ignored).
/// - bool: booleans, or one of `true/false/1/0/yes/no/on/off` in any case.
pub fn coerce(key: &str, raw: &RawValue, expected: ValueType) -> Result<Value, LayerfigError> {
    let coerced = match (expected, raw) {
        (ValueType::String, raw) => Some(Value::String(raw.to_string())),
        (ValueType::Int32, RawValue::Int(i)) => i32::try_from(*i).ok().map(Value::Int32),
        (ValueType::Int32, RawValue::Str(s)) => s.trim().parse::<i32>().ok().map(Value::Int32),
        (ValueType::Bool, RawValue::Bool(b)) => Some(Value::Bool(*b)),
        (ValueType::Bool, RawValue::Str(s)) => parse_bool(s).map(Value::Bool),
        (ValueType::Int32, RawValue::Bool(_)) | (ValueType::Bool, RawValue::Int(_)) => None,
    };

    coerced.ok_or_else(|| LayerfigError::TypeMismatch {
        key: key.into(),
        raw: raw.to_string(),
        expected,
    })
}

fn parse_bool(s: &str) -> Option<bool> {
    const TRUE: [&str; 4] = ["true", "1", "yes", "on"];
    const FALSE: [&str; 4] = ["false", "0", "no", "off"];

    let s = s.trim();
    if TRUE.iter().any(|t| t.eq_ignore_ascii_case(s)) {
        Some(true)
    } else if FALSE.iter().any(|f| f.eq_ignore_ascii_case(s)) {
        Some(false)
    } else {
        None
    }
}
