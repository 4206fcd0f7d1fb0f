//! Literal values - the closed set of primitive kinds a statement can hold
//!
//! Every literal statement row carries a kind tag next to its text-serialized
//! value. Decoding parses the text back through the tag; tags outside the
//! closed set are rejected rather than interpreted.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind tags for literal statement values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Signed integer
    Int,
    /// Double-precision float
    Float,
    /// Boolean
    Bool,
    /// UTF-8 text
    Text,
    /// Calendar date (ISO 8601, no time component)
    Date,
}

impl ValueKind {
    /// Get the string tag stored in the literals table
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
            ValueKind::Text => "text",
            ValueKind::Date => "date",
        }
    }

    /// Get all value kinds
    pub fn all() -> &'static [ValueKind] {
        &[
            ValueKind::Int,
            ValueKind::Float,
            ValueKind::Bool,
            ValueKind::Text,
            ValueKind::Date,
        ]
    }
}

impl FromStr for ValueKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "int" => Ok(ValueKind::Int),
            "float" => Ok(ValueKind::Float),
            "bool" => Ok(ValueKind::Bool),
            "text" => Ok(ValueKind::Text),
            "date" => Ok(ValueKind::Date),
            _ => Err(Error::UnknownValueKind(s.to_string())),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A primitive attribute value.
///
/// Values round-trip through their canonical text form: `to_text` is what
/// gets stored in the `value` column, and `parse` rebuilds the native value
/// from that column plus the kind tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    /// The kind tag for this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
            Value::Text(_) => ValueKind::Text,
            Value::Date(_) => ValueKind::Date,
        }
    }

    /// Canonical text form, as stored in the literals table
    pub fn to_text(&self) -> String {
        match self {
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Bool(v) => v.to_string(),
            Value::Text(v) => v.clone(),
            Value::Date(v) => v.format("%Y-%m-%d").to_string(),
        }
    }

    /// Parse a stored text form back into a native value via its kind tag
    pub fn parse(kind: ValueKind, text: &str) -> Result<Self> {
        match kind {
            ValueKind::Int => text
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| Error::InvalidValue { kind: "int", text: text.to_string() }),
            ValueKind::Float => text
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| Error::InvalidValue { kind: "float", text: text.to_string() }),
            ValueKind::Bool => text
                .parse::<bool>()
                .map(Value::Bool)
                .map_err(|_| Error::InvalidValue { kind: "bool", text: text.to_string() }),
            ValueKind::Text => Ok(Value::Text(text.to_string())),
            ValueKind::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| Error::InvalidValue { kind: "date", text: text.to_string() }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
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

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}
