//! # Type Descriptors
//!
//! [`Ty`] is the closed grammar of shapes the engine reasons about. Every
//! operation in the crate (decode, encode, validation, schema generation) is
//! an exhaustive match over it.
//!
//! ## Wire Types
//!
//! Each descriptor maps to at most one underlying JSON representation type
//! ([`JsonType`]), found by unwrapping constrained and record-reference
//! wrappers. Sum alternatives are selected by comparing that wire type with
//! the concrete type of the input, so alternatives of one sum must map to
//! pairwise-distinct wire types. [`crate::RecordBuilder::build`] enforces this.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::constraint::Constraint;
use crate::record::RecordType;
use crate::value::Value;

/// The JSON representation types a wire value can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    /// `{...}`
    Object,
    /// `[...]`
    Array,
    /// `"..."`
    String,
    /// Any JSON number.
    Number,
    /// `true` / `false`
    Boolean,
    /// `null`
    Null,
}

impl JsonType {
    /// The concrete JSON type of a wire value.
    pub fn of(value: &JsonValue) -> Self {
        match value {
            JsonValue::Object(_) => JsonType::Object,
            JsonValue::Array(_) => JsonType::Array,
            JsonValue::String(_) => JsonType::String,
            JsonValue::Number(_) => JsonType::Number,
            JsonValue::Bool(_) => JsonType::Boolean,
            JsonValue::Null => JsonType::Null,
        }
    }

    /// The JSON Schema `type` keyword for this JSON type.
    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Boolean => "boolean",
            JsonType::Null => "null",
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One member of an exact-value set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    /// A boolean literal.
    Bool(bool),
    /// An integer literal.
    Int(i64),
    /// A string literal.
    Str(String),
}

impl Literal {
    /// The JSON type this literal is written as.
    pub fn json_type(&self) -> JsonType {
        match self {
            Literal::Bool(_) => JsonType::Boolean,
            Literal::Int(_) => JsonType::Number,
            Literal::Str(_) => JsonType::String,
        }
    }

    /// Exact match against a wire value. `true` never matches `1`.
    pub fn matches_wire(&self, wire: &JsonValue) -> bool {
        match (self, wire) {
            (Literal::Bool(expected), JsonValue::Bool(actual)) => expected == actual,
            (Literal::Int(expected), JsonValue::Number(actual)) => actual.as_i64() == Some(*expected),
            (Literal::Str(expected), JsonValue::String(actual)) => expected == actual,
            _ => false,
        }
    }

    /// Exact match against a decoded value.
    pub fn matches_value(&self, value: &Value) -> bool {
        match (self, value) {
            (Literal::Bool(expected), Value::Bool(actual)) => expected == actual,
            (Literal::Int(expected), Value::Int(actual)) => expected == actual,
            (Literal::Str(expected), Value::Str(actual)) => expected == actual,
            _ => false,
        }
    }

    /// The wire form of the literal.
    pub fn to_wire(&self) -> JsonValue {
        match self {
            Literal::Bool(b) => JsonValue::Bool(*b),
            Literal::Int(i) => JsonValue::from(*i),
            Literal::Str(s) => JsonValue::String(s.clone()),
        }
    }

    /// The decoded form of the literal.
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::Int(*i),
            Literal::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Str(value)
    }
}

/// A reference to a record type, resolved by identity.
///
/// `Sealed` references point at an already-built record type. `Lazy`
/// references hold an accessor (typically returning a `static LazyLock`)
/// and are what make self- and mutually-referential record graphs
/// expressible. Declaration-time checks never resolve a reference, so a
/// record may refer to itself while it is being built.
#[derive(Clone, Copy)]
pub struct RecordRef {
    name: &'static str,
    target: RefTarget,
}

#[derive(Clone, Copy)]
enum RefTarget {
    Sealed(&'static RecordType),
    Lazy(fn() -> &'static RecordType),
}

impl RecordRef {
    /// Reference an already-sealed record type.
    pub fn sealed(record: &'static RecordType) -> Self {
        Self {
            name: record.name(),
            target: RefTarget::Sealed(record),
        }
    }

    /// Reference a record type through an accessor, resolved on first use.
    pub fn lazy(name: &'static str, accessor: fn() -> &'static RecordType) -> Self {
        Self {
            name,
            target: RefTarget::Lazy(accessor),
        }
    }

    /// The referenced record's name, available without resolving.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Resolve to the record type.
    pub fn get(&self) -> &'static RecordType {
        match self.target {
            RefTarget::Sealed(record) => record,
            RefTarget::Lazy(accessor) => accessor(),
        }
    }

    /// Identity comparison.
    pub fn is(&self, record: &RecordType) -> bool {
        std::ptr::eq(self.get(), record)
    }
}

impl fmt::Debug for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordRef").field(&self.name).finish()
    }
}

/// A type descriptor.
#[derive(Debug, Clone)]
pub enum Ty {
    /// `true` / `false`.
    Bool,
    /// A JSON number representable as `i64`.
    Int,
    /// A JSON string.
    Str,
    /// `null`.
    Null,
    /// A string that compiles as a regular expression.
    Pattern,
    /// A string that parses as a UUID.
    Uuid,
    /// Anything; passed through untouched.
    Any,
    /// Ordered alternatives; a value matches exactly one.
    Union(Vec<Ty>),
    /// Ordered set of literal values of one JSON type.
    Literal(Vec<Literal>),
    /// `list<T>`.
    List(Box<Ty>),
    /// `map<K, V>`; `K` must decode from a JSON string.
    Map(Box<Ty>, Box<Ty>),
    /// A base descriptor plus ordered constraints.
    Constrained(Box<Ty>, Vec<Constraint>),
    /// A nested record.
    Record(RecordRef),
}

impl Ty {
    /// `list<item>`.
    pub fn list(item: Ty) -> Self {
        Ty::List(Box::new(item))
    }

    /// `map<str, value>`.
    pub fn map(value: Ty) -> Self {
        Ty::Map(Box::new(Ty::Str), Box::new(value))
    }

    /// `map<key, value>` with a (constrained) string key descriptor.
    pub fn map_with_keys(key: Ty, value: Ty) -> Self {
        Ty::Map(Box::new(key), Box::new(value))
    }

    /// A sum of the given alternatives.
    pub fn union(alternatives: impl IntoIterator<Item = Ty>) -> Self {
        Ty::Union(alternatives.into_iter().collect())
    }

    /// `inner | null`.
    pub fn optional(inner: Ty) -> Self {
        Ty::Union(vec![inner, Ty::Null])
    }

    /// An exact-value set.
    pub fn literal<L: Into<Literal>>(values: impl IntoIterator<Item = L>) -> Self {
        Ty::Literal(values.into_iter().map(Into::into).collect())
    }

    /// `base` plus constraints.
    pub fn constrained(base: Ty, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        Ty::Constrained(Box::new(base), constraints.into_iter().collect())
    }

    /// `base` that must be non-empty.
    pub fn non_empty(base: Ty) -> Self {
        Ty::constrained(base, [Constraint::NonEmpty])
    }

    /// Reference to a sealed record type.
    pub fn record(record: &'static RecordType) -> Self {
        Ty::Record(RecordRef::sealed(record))
    }

    /// Reference to a record type resolved on first use (for cycles).
    pub fn lazy_record(name: &'static str, accessor: fn() -> &'static RecordType) -> Self {
        Ty::Record(RecordRef::lazy(name, accessor))
    }

    /// The underlying JSON type, unwrapping constrained and record wrappers.
    ///
    /// `None` for `any` and for sums, which have no single wire type.
    pub fn wire_type(&self) -> Option<JsonType> {
        match self {
            Ty::Bool => Some(JsonType::Boolean),
            Ty::Int => Some(JsonType::Number),
            Ty::Str | Ty::Pattern | Ty::Uuid => Some(JsonType::String),
            Ty::Null => Some(JsonType::Null),
            Ty::Any | Ty::Union(_) => None,
            Ty::Literal(values) => values.first().map(Literal::json_type),
            Ty::List(_) => Some(JsonType::Array),
            Ty::Map(..) | Ty::Record(_) => Some(JsonType::Object),
            Ty::Constrained(base, _) => base.wire_type(),
        }
    }

    /// Sum alternatives with nested sums flattened, in declaration order.
    ///
    /// A non-sum descriptor is its own single alternative.
    pub fn alternatives(&self) -> Vec<&Ty> {
        let mut out = Vec::new();
        collect_alternatives(self, &mut out);
        out
    }
}

fn collect_alternatives<'a>(ty: &'a Ty, out: &mut Vec<&'a Ty>) {
    match ty {
        Ty::Union(alternatives) => {
            for alternative in alternatives {
                collect_alternatives(alternative, out);
            }
        }
        other => out.push(other),
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Bool => f.write_str("bool"),
            Ty::Int => f.write_str("int"),
            Ty::Str => f.write_str("str"),
            Ty::Null => f.write_str("null"),
            Ty::Pattern => f.write_str("pattern"),
            Ty::Uuid => f.write_str("uuid"),
            Ty::Any => f.write_str("any"),
            Ty::Union(alternatives) => {
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{alternative}")?;
                }
                Ok(())
            }
            Ty::Literal(values) => {
                f.write_str("literal[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value.to_wire())?;
                }
                f.write_str("]")
            }
            Ty::List(item) => write!(f, "list[{item}]"),
            Ty::Map(key, value) => write!(f, "map[{key}, {value}]"),
            Ty::Constrained(base, _) => write!(f, "{base}"),
            Ty::Record(record) => f.write_str(record.name()),
        }
    }
}
