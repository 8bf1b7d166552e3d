//! Row values as they travel from the stream to the driver.

use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};

/// Object key marking a hex-encoded binary value: `{"$hex": "00ff"}`
const HEX_KEY: &str = "$hex";

/// A single column value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// One decoded row, in column order
pub type Row = Vec<Value>;

impl Value {
    /// Convert a decoded JSON value, rejecting shapes that have no column equivalent
    pub fn from_json(value: serde_json::Value) -> Result<Self, String> {
        match value {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Integer(i))
                } else if n.is_u64() {
                    Err(format!("integer {} does not fit in 64-bit signed range", n))
                } else {
                    n.as_f64()
                        .map(Value::Float)
                        .ok_or_else(|| format!("unrepresentable number {}", n))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            serde_json::Value::Object(mut map) => {
                if map.len() == 1 {
                    if let Some(serde_json::Value::String(encoded)) = map.remove(HEX_KEY) {
                        return hex::decode(&encoded)
                            .map(Value::Blob)
                            .map_err(|e| format!("invalid hex blob: {}", e));
                    }
                }
                Err("objects other than {\"$hex\": ...} are not column values".to_string())
            }
            serde_json::Value::Array(_) => Err("arrays are not column values".to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) if !f.is_finite() => Err(S::Error::custom(format!(
                "{} has no JSON representation",
                f
            ))),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Blob(bytes) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(HEX_KEY, &hex::encode(bytes))?;
                map.end()
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
