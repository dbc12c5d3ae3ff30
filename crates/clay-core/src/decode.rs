//! # Decode Engine
//!
//! Converts untyped wire values into [`Value`]s according to a [`Ty`].
//!
//! Matching is exact: a JSON boolean never decodes as an integer, an
//! integral float never decodes as an integer, and literal sets compare by
//! JSON type before comparing contents. Sum alternatives are selected by
//! wire type alone, which is unambiguous because record declarations
//! reject overlapping alternatives.
//!
//! Every recursion layer adds exactly one path segment to a failure and
//! otherwise propagates it unchanged.

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use crate::check::{check_constraints, validate};
use crate::error::{DecodeError, ResultExt};
use crate::record::{AliasMode, Record, RecordType};
use crate::ty::{JsonType, Ty};
use crate::value::{Pattern, Value};

/// Decode a wire value against a descriptor.
///
/// # Errors
///
/// Returns a `DecodeError` whose path locates the offending value relative
/// to `wire`.
pub fn decode(ty: &Ty, wire: &JsonValue) -> Result<Value, DecodeError> {
    match ty {
        Ty::Bool => match wire {
            JsonValue::Bool(b) => Ok(Value::Bool(*b)),
            _ => Err(DecodeError::wrong_type(ty, wire)),
        },
        Ty::Int => wire
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| DecodeError::wrong_type(ty, wire)),
        Ty::Str => match wire {
            JsonValue::String(s) => Ok(Value::Str(s.clone())),
            _ => Err(DecodeError::wrong_type(ty, wire)),
        },
        Ty::Null => match wire {
            JsonValue::Null => Ok(Value::Null),
            _ => Err(DecodeError::wrong_type(ty, wire)),
        },
        Ty::Pattern => match wire {
            JsonValue::String(s) => Pattern::new(s)
                .map(Value::Pattern)
                .map_err(|_| DecodeError::invalid_literal(wire, "regex pattern")),
            _ => Err(DecodeError::wrong_type(ty, wire)),
        },
        Ty::Uuid => match wire {
            JsonValue::String(s) => Uuid::parse_str(s)
                .map(Value::Uuid)
                .map_err(|_| DecodeError::invalid_literal(wire, "UUID")),
            _ => Err(DecodeError::wrong_type(ty, wire)),
        },
        Ty::Any => Ok(Value::Json(wire.clone())),
        Ty::Union(_) => {
            let actual = JsonType::of(wire);
            match ty
                .alternatives()
                .into_iter()
                .find(|alternative| alternative.wire_type() == Some(actual))
            {
                Some(alternative) => decode(alternative, wire),
                None => Err(DecodeError::wrong_type(ty, wire)),
            }
        }
        Ty::Literal(values) => values
            .iter()
            .find(|literal| literal.matches_wire(wire))
            .map(|literal| literal.to_value())
            .ok_or_else(|| DecodeError::wrong_type(ty, wire)),
        Ty::List(item) => {
            let JsonValue::Array(items) = wire else {
                return Err(DecodeError::wrong_type(ty, wire));
            };
            items
                .iter()
                .enumerate()
                .map(|(index, raw)| decode(item, raw).at_index(index))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        }
        Ty::Map(key_ty, value_ty) => {
            let JsonValue::Object(entries) = wire else {
                return Err(DecodeError::wrong_type(ty, wire));
            };
            let mut out = BTreeMap::new();
            for (key, raw) in entries {
                decode(key_ty, &JsonValue::String(key.clone())).at_key(key)?;
                let value = decode(value_ty, raw).at_key(key)?;
                out.insert(key.clone(), value);
            }
            Ok(Value::Map(out))
        }
        Ty::Constrained(base, constraints) => {
            let value = decode(base, wire)?;
            check_constraints(constraints, &value)?;
            Ok(value)
        }
        Ty::Record(record) => decode_record(record.get(), wire).map(Value::from),
    }
}

/// Decode a wire object into an instance of `rt`.
///
/// Aliases are resolved first, then unknown keys are split off as extras,
/// then fields are decoded in declaration order. A renamed field is read
/// from its rename, or from its canonical name when the rename is absent. Missing required fields
/// are reported together, after every present field decoded cleanly.
///
/// # Errors
///
/// Returns a `DecodeError` for a non-object input, rejected extras, a field
/// that fails to decode (path starts with the field's wire key), missing
/// required fields, or a failing post-decode hook.
pub fn decode_record(rt: &'static RecordType, wire: &JsonValue) -> Result<Record, DecodeError> {
    let JsonValue::Object(input) = wire else {
        return Err(DecodeError::wrong_type(rt.name(), wire));
    };

    tracing::trace!(record = rt.name(), keys = input.len(), "decoding record");

    let mut object = resolve_aliases(rt, input);

    let extra_keys: Vec<String> = object
        .keys()
        .filter(|key| !rt.is_field_wire_key(key))
        .cloned()
        .collect();
    let mut extras = Map::new();
    for key in extra_keys {
        if let Some(raw) = object.remove(&key) {
            extras.insert(key, raw);
        }
    }
    if !extras.is_empty() && !rt.allows_extras() {
        return Err(DecodeError::extras_not_allowed(rt.name(), extras));
    }

    let mut values = BTreeMap::new();
    for field in rt.fields() {
        // The rename wins over the canonical name when both are present.
        let Some(raw) = object
            .get(field.wire_name())
            .or_else(|| object.get(field.name()))
        else {
            continue;
        };
        let decoded = match field.decoder() {
            Some(decoder) => decode(decoder.input(), raw)
                .and_then(|input| decoder.apply(input))
                .and_then(|value| validate(field.ty(), &value).map(|()| value)),
            None => decode(field.ty(), raw),
        };
        values.insert(field.name().to_string(), decoded.at_attr(field.wire_name())?);
    }

    let record = rt.assemble(values, extras)?;
    rt.run_post_decode(&record)?;
    Ok(record)
}

/// Rewrite field aliases in `input` onto their targets' wire keys.
fn resolve_aliases(rt: &RecordType, input: &Map<String, JsonValue>) -> Map<String, JsonValue> {
    let mut object = input.clone();
    for (alias_name, alias) in rt.aliases() {
        let Some(raw) = object.remove(alias_name) else {
            continue;
        };
        let Some(target) = rt.field(alias.target()) else {
            continue;
        };
        if alias.is_deprecated() {
            tracing::warn!(
                record = rt.name(),
                alias = %alias_name,
                field = target.name(),
                "deprecated field alias used"
            );
        }
        let key = target.wire_name();
        let canonical_present = [key, target.name()]
            .iter()
            .any(|k| input.get(*k).is_some_and(|v| !v.is_null()));
        match alias.mode() {
            AliasMode::Append => {
                object.insert(key.to_string(), raw);
            }
            AliasMode::Prepend if !canonical_present => {
                object.insert(key.to_string(), raw);
            }
            AliasMode::Prepend => {}
        }
    }
    object
}
