//! # Constraint Validator
//!
//! Checks already-decoded values against a descriptor, independent of
//! decoding. Used on values produced by custom decoders and by direct
//! record construction, where no wire input exists to decode.

use crate::constraint::Constraint;
use crate::error::{DecodeError, ResultExt};
use crate::ty::Ty;
use crate::value::Value;

/// Run constraints in declaration order, reporting the first failure.
///
/// # Errors
///
/// Returns the first failing constraint's error.
pub fn check_constraints(constraints: &[Constraint], value: &Value) -> Result<(), DecodeError> {
    constraints.iter().try_for_each(|constraint| constraint.check(value))
}

/// Check that a decoded value conforms to `ty`, including every attached
/// constraint at any depth.
///
/// Record instances conform to a record reference iff they were built from
/// the same record type; their fields were checked when they were built.
///
/// # Errors
///
/// Returns a `DecodeError` whose path locates the offending value.
pub fn validate(ty: &Ty, value: &Value) -> Result<(), DecodeError> {
    if let (Value::Json(raw), false) = (value, matches!(ty, Ty::Any)) {
        return crate::decode::decode(ty, raw).map(drop);
    }

    let conforms = match (ty, value) {
        (Ty::Any, _) => true,
        (Ty::Bool, Value::Bool(_))
        | (Ty::Int, Value::Int(_))
        | (Ty::Str, Value::Str(_))
        | (Ty::Null, Value::Null)
        | (Ty::Pattern, Value::Pattern(_))
        | (Ty::Uuid, Value::Uuid(_)) => true,
        (Ty::Union(_), _) => {
            let actual = value.json_type();
            return match ty
                .alternatives()
                .into_iter()
                .find(|alternative| alternative.wire_type() == Some(actual))
            {
                Some(alternative) => validate(alternative, value),
                None => Err(DecodeError::wrong_type(ty, &value.to_wire())),
            };
        }
        (Ty::Literal(literals), _) => literals.iter().any(|l| l.matches_value(value)),
        (Ty::List(item), Value::List(items)) => {
            for (index, element) in items.iter().enumerate() {
                validate(item, element).at_index(index)?;
            }
            true
        }
        (Ty::Map(key_ty, value_ty), Value::Map(entries)) => {
            for (key, element) in entries {
                crate::decode::decode(key_ty, &serde_json::Value::String(key.clone())).at_key(key)?;
                validate(value_ty, element).at_key(key)?;
            }
            true
        }
        (Ty::Constrained(base, constraints), _) => {
            validate(base, value)?;
            check_constraints(constraints, value)?;
            true
        }
        (Ty::Record(reference), Value::Record(record)) => reference.is(record.record_type()),
        _ => false,
    };

    if conforms {
        Ok(())
    } else {
        Err(DecodeError::wrong_type(ty, &value.to_wire()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;
    use crate::record::{Field, RecordType};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn test_first_failure_is_reported() {
        let constraints = [Constraint::Ge(0), Constraint::Le(-5)];
        let err = check_constraints(&constraints, &Value::Int(-1)).unwrap_err();
        assert_eq!(err.expectation(), "be >= 0");
    }

    #[test]
    fn test_validate_nested_constraint_path() {
        let ty = Ty::map(Ty::list(Ty::constrained(Ty::Str, [Constraint::MaxLength(3)])));
        let mut entries = BTreeMap::new();
        entries.insert("k".to_string(), Value::from(vec!["ok", "too long"]));
        let err = validate(&ty, &Value::Map(entries)).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::ConstraintViolation);
        assert_eq!(err.path().to_string(), "['k'][1]");
    }

    #[test]
    fn test_validate_sum_by_value_type() {
        let ty = Ty::optional(Ty::Int);
        assert!(validate(&ty, &Value::Null).is_ok());
        assert!(validate(&ty, &Value::Int(3)).is_ok());
        assert!(validate(&ty, &Value::Bool(true)).is_err());
    }

    #[test]
    fn test_validate_raw_json_against_typed_descriptor() {
        assert!(validate(&Ty::list(Ty::Int), &Value::Json(json!([1, 2]))).is_ok());
        assert!(validate(&Ty::list(Ty::Int), &Value::Json(json!([true]))).is_err());
        assert!(validate(&Ty::Any, &Value::Json(json!(true))).is_ok());
    }

    #[test]
    fn test_validate_record_identity() {
        let a = RecordType::builder("A")
            .field(Field::new("n", Ty::Int).default(1i64))
            .build()
            .unwrap()
            .leak();
        let b = RecordType::builder("B").build().unwrap().leak();
        let instance = a.construct(Vec::<(String, Value)>::new()).unwrap();
        assert!(validate(&Ty::record(a), &Value::from(instance.clone())).is_ok());
        let err = validate(&Ty::record(b), &Value::from(instance)).unwrap_err();
        assert_eq!(err.expectation(), "be of type `B`");
    }
}
