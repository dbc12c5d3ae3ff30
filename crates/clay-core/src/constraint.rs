//! # Constraint Library
//!
//! Stateless predicates attached to a descriptor with [`crate::Ty::Constrained`].
//! Each constraint checks a decoded value, explains a failure with an
//! expectation string, and contributes a JSON Schema fragment.
//!
//! `MaxLength` and `NonEmpty` are one runtime rule each but three schema
//! keywords, chosen by the base descriptor's wire type (characters for
//! strings, elements for arrays, entries for objects).

use std::fmt;

use serde_json::{json, Map, Value as JsonValue};

use crate::error::{DecodeError, DeclarationError};
use crate::ty::{JsonType, Ty};
use crate::value::{Pattern, Value};

/// A composable post-decode predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// The string fully matches a regular expression.
    MatchesRegex(Pattern),
    /// Length greater than zero (strings, lists, maps).
    NonEmpty,
    /// Integer lower bound, inclusive.
    Ge(i64),
    /// Integer upper bound, inclusive.
    Le(i64),
    /// Length at most `n` (characters, elements, or entries).
    MaxLength(usize),
    /// Valid iff every wrapped constraint fails.
    Not(Vec<Constraint>),
}

impl Constraint {
    /// A full-match regex constraint.
    ///
    /// # Errors
    ///
    /// Returns `DeclarationError::InvalidRegex` if the pattern does not compile.
    pub fn matches_regex(pattern: &str) -> Result<Self, DeclarationError> {
        Pattern::new(pattern)
            .map(Constraint::MatchesRegex)
            .map_err(|e| DeclarationError::InvalidRegex {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Negate one or more constraints.
    pub fn not(inner: impl IntoIterator<Item = Constraint>) -> Self {
        Constraint::Not(inner.into_iter().collect())
    }

    /// What a value must do to satisfy this constraint.
    pub fn expectation(&self) -> String {
        match self {
            Constraint::MatchesRegex(pattern) => format!("match regex `{pattern}`"),
            Constraint::NonEmpty => "be non-empty".to_string(),
            Constraint::Ge(bound) => format!("be >= {bound}"),
            Constraint::Le(bound) => format!("be <= {bound}"),
            Constraint::MaxLength(limit) => format!("have a length of at most `{limit}`"),
            Constraint::Not(inner) => {
                let parts: Vec<String> = inner.iter().map(Constraint::expectation).collect();
                format!("not {}", parts.join(" or "))
            }
        }
    }

    /// Check a decoded value.
    ///
    /// # Errors
    ///
    /// Returns a `ConstraintViolation` carrying this constraint's expectation,
    /// or a `ShapeMismatch` if the value has a kind the constraint cannot measure.
    pub fn check(&self, value: &Value) -> Result<(), DecodeError> {
        let ok = match self {
            Constraint::MatchesRegex(pattern) => match value {
                Value::Str(s) => pattern.full_match(s),
                other => return Err(DecodeError::wrong_type("str", &other.to_wire())),
            },
            Constraint::NonEmpty => measured_len(value)? > 0,
            Constraint::MaxLength(limit) => measured_len(value)? <= *limit,
            Constraint::Ge(bound) => integer(value)? >= *bound,
            Constraint::Le(bound) => integer(value)? <= *bound,
            Constraint::Not(inner) => {
                for constraint in inner {
                    if constraint.check(value).is_ok() {
                        return Err(DecodeError::constraint(
                            value.to_wire(),
                            format!("not {}", constraint.expectation()),
                        ));
                    }
                }
                true
            }
        };
        if ok {
            Ok(())
        } else {
            Err(DecodeError::constraint(value.to_wire(), self.expectation()))
        }
    }

    /// The schema keywords this constraint contributes for a base of `wire` type.
    pub fn schema(&self, wire: Option<JsonType>) -> Map<String, JsonValue> {
        let mut out = Map::new();
        match self {
            Constraint::MatchesRegex(pattern) => {
                out.insert("pattern".into(), json!(pattern.as_str()));
            }
            Constraint::NonEmpty => {
                out.insert(length_keyword(wire, "min").into(), json!(1));
            }
            Constraint::MaxLength(limit) => {
                out.insert(length_keyword(wire, "max").into(), json!(limit));
            }
            Constraint::Ge(bound) => {
                out.insert("minimum".into(), json!(bound));
            }
            Constraint::Le(bound) => {
                out.insert("maximum".into(), json!(bound));
            }
            Constraint::Not(inner) => {
                let negated = match inner.as_slice() {
                    [single] => JsonValue::Object(single.schema(wire)),
                    many => json!({
                        "anyOf": many
                            .iter()
                            .map(|c| JsonValue::Object(c.schema(wire)))
                            .collect::<Vec<_>>()
                    }),
                };
                out.insert("not".into(), negated);
            }
        }
        out
    }

    /// Whether the constraint can measure values decoded from `base`.
    ///
    /// Follows the decoded value, not only the wire type: UUIDs, regex
    /// patterns and records travel as strings or objects but decode to values
    /// no constraint measures.
    pub fn applies_to(&self, base: &Ty) -> bool {
        let measured = measured_kind(base);
        match self {
            Constraint::MatchesRegex(_) => measured == Some(JsonType::String),
            Constraint::NonEmpty | Constraint::MaxLength(_) => matches!(
                measured,
                Some(JsonType::String | JsonType::Array | JsonType::Object)
            ),
            Constraint::Ge(_) | Constraint::Le(_) => measured == Some(JsonType::Number),
            Constraint::Not(inner) => inner.iter().all(|c| c.applies_to(base)),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::MatchesRegex(pattern) => write!(f, "MatchesRegex({pattern})"),
            Constraint::NonEmpty => f.write_str("NonEmpty"),
            Constraint::Ge(bound) => write!(f, "Ge({bound})"),
            Constraint::Le(bound) => write!(f, "Le({bound})"),
            Constraint::MaxLength(limit) => write!(f, "MaxLength({limit})"),
            Constraint::Not(inner) => {
                f.write_str("Not(")?;
                for (i, constraint) in inner.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{constraint}")?;
                }
                f.write_str(")")
            }
        }
    }
}

fn length_keyword(wire: Option<JsonType>, prefix: &str) -> String {
    let unit = match wire {
        Some(JsonType::Array) => "Items",
        Some(JsonType::Object) => "Properties",
        _ => "Length",
    };
    format!("{prefix}{unit}")
}

/// The wire type of the values a constraint on `base` gets to measure.
fn measured_kind(base: &Ty) -> Option<JsonType> {
    match base {
        Ty::Constrained(inner, _) => measured_kind(inner),
        Ty::Pattern | Ty::Uuid | Ty::Record(_) => None,
        other => other.wire_type(),
    }
}

fn measured_len(value: &Value) -> Result<usize, DecodeError> {
    match value {
        Value::Str(s) => Ok(s.chars().count()),
        Value::List(items) => Ok(items.len()),
        Value::Map(entries) => Ok(entries.len()),
        Value::Json(JsonValue::String(s)) => Ok(s.chars().count()),
        Value::Json(JsonValue::Array(items)) => Ok(items.len()),
        Value::Json(JsonValue::Object(entries)) => Ok(entries.len()),
        other => Err(DecodeError::wrong_type("str | list | map", &other.to_wire())),
    }
}

fn integer(value: &Value) -> Result<i64, DecodeError> {
    value
        .as_int()
        .ok_or_else(|| DecodeError::wrong_type("int", &value.to_wire()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;
    use std::collections::BTreeMap;

    #[test]
    fn test_not_ge_accepts_below_rejects_at_and_above() {
        let c = Constraint::not([Constraint::Ge(10)]);
        assert!(c.check(&Value::Int(5)).is_ok());
        let err = c.check(&Value::Int(10)).unwrap_err();
        assert_eq!(err.expectation(), "not be >= 10");
        assert!(c.check(&Value::Int(15)).is_err());
    }

    #[test]
    fn test_not_requires_all_wrapped_to_fail() {
        let c = Constraint::not([Constraint::Ge(10), Constraint::Le(0)]);
        assert!(c.check(&Value::Int(5)).is_ok());
        assert!(c.check(&Value::Int(-1)).is_err());
        assert!(c.check(&Value::Int(11)).is_err());
    }

    #[test]
    fn test_matches_regex_is_full_match() {
        let c = Constraint::matches_regex("[a-z]+").unwrap();
        assert!(c.check(&Value::from("abc")).is_ok());
        let err = c.check(&Value::from("abc1")).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::ConstraintViolation);
        assert_eq!(err.expectation(), "match regex `[a-z]+`");
    }

    #[test]
    fn test_invalid_regex_is_declaration_error() {
        let err = Constraint::matches_regex("(unclosed").unwrap_err();
        assert!(matches!(err, DeclarationError::InvalidRegex { .. }));
    }

    #[test]
    fn test_non_empty_measures_strings_lists_maps() {
        assert!(Constraint::NonEmpty.check(&Value::from("")).is_err());
        assert!(Constraint::NonEmpty.check(&Value::List(vec![])).is_err());
        assert!(Constraint::NonEmpty.check(&Value::Map(BTreeMap::new())).is_err());
        assert!(Constraint::NonEmpty.check(&Value::from("x")).is_ok());
    }

    #[test]
    fn test_max_length_counts_characters() {
        let c = Constraint::MaxLength(2);
        assert!(c.check(&Value::from("éé")).is_ok());
        assert!(c.check(&Value::from("abc")).is_err());
        assert!(c.check(&Value::from(vec![1i64, 2, 3])).is_err());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(Constraint::Ge(0).check(&Value::Int(0)).is_ok());
        assert!(Constraint::Le(100).check(&Value::Int(100)).is_ok());
        assert!(Constraint::Le(100).check(&Value::Int(101)).is_err());
    }

    #[test]
    fn test_bound_on_string_is_shape_mismatch() {
        let err = Constraint::Ge(0).check(&Value::from("1")).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::ShapeMismatch);
    }

    #[test]
    fn test_schema_keywords_follow_wire_type() {
        let s = Constraint::MaxLength(10).schema(Some(JsonType::Array));
        assert_eq!(s.get("maxItems"), Some(&json!(10)));
        let s = Constraint::MaxLength(10).schema(Some(JsonType::Object));
        assert_eq!(s.get("maxProperties"), Some(&json!(10)));
        let s = Constraint::NonEmpty.schema(Some(JsonType::String));
        assert_eq!(s.get("minLength"), Some(&json!(1)));
    }

    #[test]
    fn test_not_schema() {
        let s = Constraint::not([Constraint::Ge(10)]).schema(Some(JsonType::Number));
        assert_eq!(JsonValue::Object(s), json!({"not": {"minimum": 10}}));
    }

    #[test]
    fn test_applies_to() {
        assert!(Constraint::Ge(1).applies_to(&Ty::Int));
        assert!(Constraint::Ge(1).applies_to(&Ty::literal([1i64, 2])));
        assert!(!Constraint::Ge(1).applies_to(&Ty::Str));
        assert!(!Constraint::NonEmpty.applies_to(&Ty::Bool));
        assert!(!Constraint::not([Constraint::NonEmpty]).applies_to(&Ty::Null));
        assert!(Constraint::MaxLength(3).applies_to(&Ty::non_empty(Ty::list(Ty::Int))));
    }

    #[test]
    fn test_string_like_values_that_decode_otherwise_are_not_measured() {
        let regex = Constraint::matches_regex("[0-9a-f-]+").unwrap();
        assert!(!regex.applies_to(&Ty::Uuid));
        assert!(!Constraint::NonEmpty.applies_to(&Ty::Pattern));
        assert!(!Constraint::not([Constraint::MaxLength(3)]).applies_to(&Ty::Uuid));
        assert!(regex.applies_to(&Ty::Str));
    }
}
