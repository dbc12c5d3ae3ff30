//! # Encode Engine
//!
//! The approximate inverse of decoding. Record fields are written under
//! their wire keys through their custom encoders where registered; a
//! record's discriminant is always written as its canonical literal, and
//! captured extras are written back without overriding any field.

use serde_json::{Map, Value as JsonValue};

use crate::record::Record;
use crate::ty::Ty;
use crate::value::Value;

/// Encode a record instance.
pub fn encode_record(record: &Record) -> JsonValue {
    let rt = record.record_type();
    let mut out = Map::new();
    for field in rt.fields() {
        if let Some(value) = record.get(field.name()) {
            out.insert(field.wire_name().to_string(), field.encode_value(value));
        }
    }
    if let Some((field, canonical)) = rt.discriminant() {
        out.insert(field.wire_name().to_string(), canonical.to_wire());
    }
    for (key, raw) in record.extras() {
        out.entry(key.clone()).or_insert_with(|| raw.clone());
    }
    JsonValue::Object(out)
}

/// Encode a decoded value that was produced for `ty`.
///
/// Containers are walked alongside their descriptors so that nested
/// records use their own field encoders; every other value uses its plain
/// wire form.
pub fn encode(ty: &Ty, value: &Value) -> JsonValue {
    match (ty, value) {
        (Ty::List(item), Value::List(items)) => {
            JsonValue::Array(items.iter().map(|v| encode(item, v)).collect())
        }
        (Ty::Map(_, value_ty), Value::Map(entries)) => JsonValue::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), encode(value_ty, v)))
                .collect(),
        ),
        (Ty::Constrained(base, _), _) => encode(base, value),
        (Ty::Union(_), _) => {
            let actual = value.json_type();
            match ty
                .alternatives()
                .into_iter()
                .find(|alternative| alternative.wire_type() == Some(actual))
            {
                Some(alternative) => encode(alternative, value),
                None => value.to_wire(),
            }
        }
        (_, Value::Record(record)) => encode_record(record),
        _ => value.to_wire(),
    }
}
