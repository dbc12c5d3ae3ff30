//! # Decoded Values
//!
//! [`Value`] is what decoding produces: a typed tree where regex patterns
//! are compiled, UUIDs are parsed, and nested records are [`Record`]
//! instances. [`Value::to_wire`] is the plain (encoder-free) inverse.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::DecodeError;
use crate::record::Record;
use crate::ty::JsonType;

/// A compiled regular expression that remembers its source.
///
/// Holds both the pattern as written (used for search and for schema
/// output) and a fully anchored copy used for whole-string matching.
#[derive(Clone)]
pub struct Pattern {
    regex: Regex,
    anchored: Regex,
}

impl Pattern {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// Returns the compiler error if `source` is not a valid expression.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(source)?;
        let anchored = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self { regex, anchored })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// True if the pattern matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// True if the pattern matches all of `text`.
    pub fn full_match(&self, text: &str) -> bool {
        self.anchored.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.as_str()).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `null`.
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A string.
    Str(String),
    /// A compiled regex pattern.
    Pattern(Pattern),
    /// A parsed UUID.
    Uuid(Uuid),
    /// An untyped value decoded by `any`.
    Json(JsonValue),
    /// A decoded list.
    List(Vec<Value>),
    /// A decoded string-keyed map.
    Map(BTreeMap<String, Value>),
    /// A nested record instance.
    Record(Box<Record>),
}

impl Value {
    /// The JSON type this value is written as.
    pub fn json_type(&self) -> JsonType {
        match self {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Boolean,
            Value::Int(_) => JsonType::Number,
            Value::Str(_) | Value::Pattern(_) | Value::Uuid(_) => JsonType::String,
            Value::Json(raw) => JsonType::of(raw),
            Value::List(_) => JsonType::Array,
            Value::Map(_) | Value::Record(_) => JsonType::Object,
        }
    }

    /// Plain conversion to the wire, without custom encoders on this value.
    ///
    /// Nested records are encoded with their own field encoders.
    pub fn to_wire(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::from(*i),
            Value::Str(s) => JsonValue::String(s.clone()),
            Value::Pattern(p) => JsonValue::String(p.as_str().to_string()),
            Value::Uuid(u) => JsonValue::String(u.hyphenated().to_string()),
            Value::Json(raw) => raw.clone(),
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_wire).collect()),
            Value::Map(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_wire()))
                    .collect(),
            ),
            Value::Record(record) => crate::encode::encode_record(record),
        }
    }

    /// Returns true for `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Borrow as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow as a map.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Borrow as a record.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Take a boolean, failing with a shape mismatch otherwise.
    pub fn into_bool(self) -> Result<bool, DecodeError> {
        match self {
            Value::Bool(b) => Ok(b),
            other => Err(DecodeError::wrong_type("bool", &other.to_wire())),
        }
    }

    /// Take an integer, failing with a shape mismatch otherwise.
    pub fn into_int(self) -> Result<i64, DecodeError> {
        match self {
            Value::Int(i) => Ok(i),
            other => Err(DecodeError::wrong_type("int", &other.to_wire())),
        }
    }

    /// Take a string, failing with a shape mismatch otherwise.
    pub fn into_string(self) -> Result<String, DecodeError> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(DecodeError::wrong_type("str", &other.to_wire())),
        }
    }

    /// Take a string or `null`.
    pub fn into_optional_string(self) -> Result<Option<String>, DecodeError> {
        match self {
            Value::Null => Ok(None),
            other => other.into_string().map(Some),
        }
    }

    /// Take a list, failing with a shape mismatch otherwise.
    pub fn into_list(self) -> Result<Vec<Value>, DecodeError> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(DecodeError::wrong_type("list", &other.to_wire())),
        }
    }

    /// Take a map, failing with a shape mismatch otherwise.
    pub fn into_map(self) -> Result<BTreeMap<String, Value>, DecodeError> {
        match self {
            Value::Map(entries) => Ok(entries),
            other => Err(DecodeError::wrong_type("map", &other.to_wire())),
        }
    }

    /// Take a record, failing with a shape mismatch otherwise.
    pub fn into_record(self) -> Result<Record, DecodeError> {
        match self {
            Value::Record(record) => Ok(*record),
            other => Err(DecodeError::wrong_type("record", &other.to_wire())),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(Box::new(value))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
