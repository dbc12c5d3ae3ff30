//! Property tests: encode/decode round-trips and exact-type decoding.

use std::sync::LazyLock;

use clay_core::{decode, encode_record, Constraint, Field, FieldAlias, RecordType, Ty, Value};
use proptest::prelude::*;
use serde_json::json;

static SAMPLE: LazyLock<RecordType> = LazyLock::new(|| {
    RecordType::builder("Sample")
        .field(Field::new("type", Ty::literal(["sample"])).default("sample"))
        .field(Field::new("flag", Ty::Bool))
        .field(Field::new("count", Ty::constrained(Ty::Int, [Constraint::Ge(0)])))
        .field(Field::new("name", Ty::Str).rename("display_name"))
        .field(Field::new("tags", Ty::list(Ty::Str)).default_with(|| Value::List(vec![])))
        .field(Field::new("env", Ty::map(Ty::optional(Ty::Int))).default_with(|| {
            Value::Map(Default::default())
        }))
        .field(Field::new("id", Ty::optional(Ty::Uuid)).default(Value::Null))
        .alias("label", FieldAlias::prepend("name"))
        .discriminant("type")
        .build()
        .unwrap()
});

fn sample_fields() -> impl Strategy<Value = Vec<(&'static str, Value)>> {
    (
        any::<bool>(),
        0i64..i64::MAX,
        "[a-zA-Z0-9 :_-]{0,20}",
        prop::collection::vec("[a-z]{0,8}", 0..5),
        prop::collection::btree_map("[A-Z_]{1,8}", prop::option::of(any::<i64>()), 0..5),
        prop::option::of(any::<u128>()),
    )
        .prop_map(|(flag, count, name, tags, env, id)| {
            vec![
                ("flag", Value::Bool(flag)),
                ("count", Value::Int(count)),
                ("name", Value::Str(name)),
                ("tags", Value::from(tags)),
                (
                    "env",
                    Value::Map(env.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
                ),
                ("id", Value::from(id.map(uuid::Uuid::from_u128))),
            ]
        })
}

proptest! {
    /// decode(encode(x)) == x for instances built from valid field values.
    #[test]
    fn record_round_trips(fields in sample_fields()) {
        let record = SAMPLE.construct(fields).unwrap();
        let wire = encode_record(&record);
        prop_assert_eq!(&wire["type"], &json!("sample"));
        prop_assert!(wire.get("name").is_none());
        let decoded = SAMPLE.decode(&wire).unwrap();
        prop_assert_eq!(decoded, record);
    }

    /// Integers never decode as booleans.
    #[test]
    fn int_is_never_bool(n in any::<i64>()) {
        prop_assert!(decode(&Ty::Bool, &json!(n)).is_err());
        prop_assert_eq!(decode(&Ty::Int, &json!(n)).unwrap(), Value::Int(n));
    }

    /// Booleans never decode as integers.
    #[test]
    fn bool_is_never_int(b in any::<bool>()) {
        prop_assert!(decode(&Ty::Int, &json!(b)).is_err());
        prop_assert!(decode(&Ty::literal([0i64, 1]), &json!(b)).is_err());
    }

    /// Bounds agree with the integer ordering.
    #[test]
    fn not_ge_is_lt(n in any::<i64>(), bound in any::<i64>()) {
        let ty = Ty::constrained(Ty::Int, [Constraint::not([Constraint::Ge(bound)])]);
        prop_assert_eq!(decode(&ty, &json!(n)).is_ok(), n < bound);
    }
}
