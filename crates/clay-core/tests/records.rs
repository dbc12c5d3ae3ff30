//! Integration tests: record-level decoding, construction, encoding, and the
//! typed model bridge, exercised through the public API only.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::LazyLock;

use clay_core::{
    Constraint, DecodeError, DecodeErrorKind, Field, FieldAlias, Model, Record, RecordType,
    ResultExt, Ty, Value,
};
use serde_json::json;

static ITEM: LazyLock<RecordType> = LazyLock::new(|| {
    RecordType::builder("Item")
        .field(Field::new("n", Ty::Int))
        .build()
        .unwrap()
});

static BAG: LazyLock<RecordType> = LazyLock::new(|| {
    RecordType::builder("Bag")
        .field(Field::new("items", Ty::list(Ty::record(&ITEM))))
        .field(
            Field::new("env", Ty::map(Ty::Str)).default_with(|| Value::Map(Default::default())),
        )
        .field(Field::new("label", Ty::optional(Ty::Str)).default(Value::Null))
        .build()
        .unwrap()
});

static PAIR: LazyLock<RecordType> = LazyLock::new(|| {
    RecordType::builder("Pair")
        .field(Field::new("a", Ty::Int))
        .field(Field::new("b", Ty::Str))
        .build()
        .unwrap()
});

static RENAMED: LazyLock<RecordType> = LazyLock::new(|| {
    RecordType::builder("Renamed")
        .field(Field::new("if_condition", Ty::optional(Ty::Str)).rename("if"))
        .post_decode(|record| {
            if record.get("if_condition") == Some(&Value::from("never")) {
                return Err(
                    DecodeError::custom(json!("never"), "not be `never`").add_attr("if_condition")
                );
            }
            Ok(())
        })
        .build()
        .unwrap()
});

static OPEN: LazyLock<RecordType> = LazyLock::new(|| {
    RecordType::builder("Open")
        .field(Field::new("key", Ty::Str))
        .allow_extras(true)
        .build()
        .unwrap()
});

static FACTORY_CALLS: AtomicUsize = AtomicUsize::new(0);

static COUNTED: LazyLock<RecordType> = LazyLock::new(|| {
    RecordType::builder("Counted")
        .field(Field::new("tags", Ty::list(Ty::Str)).default_with(|| {
            FACTORY_CALLS.fetch_add(1, Ordering::SeqCst);
            Value::List(vec![])
        }))
        .build()
        .unwrap()
});

static BOUNDED: LazyLock<RecordType> = LazyLock::new(|| {
    RecordType::builder("Bounded")
        .field(Field::new(
            "n",
            Ty::constrained(Ty::Int, [Constraint::Ge(0), Constraint::Le(10)]),
        ))
        .field(Field::new("s", Ty::Str).default(""))
        .build()
        .unwrap()
});

#[test]
fn test_missing_required_fields_reported_together() {
    let err = PAIR.decode(&json!({})).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::MissingFields);
    assert_eq!(err.value(), &json!("a, b"));
    assert_eq!(err.qualifier(), Some("required fields"));
    assert!(err.path().is_empty());
}

#[test]
fn test_path_through_list_and_nested_record() {
    let err = BAG.decode(&json!({"items": [{"n": "bad"}]})).unwrap_err();
    assert_eq!(err.path().to_string(), ".items[0].n");
    assert_eq!(err.to_string(), "Expected `\"bad\"` to be of type `int`\nPath: .items[0].n");
}

#[test]
fn test_path_through_map_key() {
    let err = BAG.decode(&json!({"items": [], "env": {"CI": true}})).unwrap_err();
    assert_eq!(err.path().to_string(), ".env['CI']");
}

#[test]
fn test_missing_field_in_nested_record() {
    let err = BAG.decode(&json!({"items": [{"n": 1}, {}]})).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::MissingFields);
    assert_eq!(err.path().to_string(), ".items[1]");
}

#[test]
fn test_extra_keys_rejected() {
    let err = PAIR.decode(&json!({"a": 1, "b": "x", "c": true})).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::ExtraKeys);
    assert_eq!(err.value(), &json!({"c": true}));
    assert!(err.to_string().contains("Pair doesn't support extra keys"));
}

#[test]
fn test_extra_keys_captured_and_reemitted() {
    let record = OPEN.decode(&json!({"key": "k", "plugin": {"x": 1}})).unwrap();
    assert_eq!(record.extras().get("plugin"), Some(&json!({"x": 1})));
    assert_eq!(
        serde_json::to_value(&record).unwrap(),
        json!({"key": "k", "plugin": {"x": 1}})
    );
}

#[test]
fn test_renamed_field_accepts_rename_and_canonical_name() {
    let record = RENAMED.decode(&json!({"if": "build.branch == 'main'"})).unwrap();
    assert_eq!(record.get("if_condition"), Some(&Value::from("build.branch == 'main'")));

    let err = RENAMED.decode(&json!({"if": 1})).unwrap_err();
    assert_eq!(err.path().to_string(), ".if");

    let record = RENAMED.decode(&json!({"if_condition": "x"})).unwrap();
    assert_eq!(record.get("if_condition"), Some(&Value::from("x")));
    assert!(record.extras().is_empty());
    assert_eq!(serde_json::to_value(&record).unwrap(), json!({"if": "x"}));

    let record = RENAMED
        .decode(&json!({"if_condition": "canonical", "if": "renamed"}))
        .unwrap();
    assert_eq!(record.get("if_condition"), Some(&Value::from("renamed")));

    let err = RENAMED.decode(&json!({"if_condition": 1})).unwrap_err();
    assert_eq!(err.path().to_string(), ".if");

    let err = RENAMED.decode(&json!({"if": "x", "iff": "y"})).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::ExtraKeys);
}

#[test]
fn test_post_decode_failure_reports_wire_name() {
    let err = RENAMED.decode(&json!({"if": "never"})).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::Custom);
    assert_eq!(err.path().to_string(), ".if");
}

#[test]
fn test_missing_fields_use_canonical_names() {
    let err = RENAMED.decode(&json!({})).unwrap_err();
    assert_eq!(err.value(), &json!("if_condition"));
}

#[test]
fn test_default_factory_invoked_per_instance() {
    let before = FACTORY_CALLS.load(Ordering::SeqCst);
    let first = COUNTED.decode(&json!({})).unwrap();
    let second = COUNTED.construct(Vec::<(&str, Value)>::new()).unwrap();
    let provided = COUNTED.decode(&json!({"tags": ["a"]})).unwrap();
    assert_eq!(FACTORY_CALLS.load(Ordering::SeqCst) - before, 2);
    assert_eq!(first, second);
    assert_eq!(provided.get("tags"), Some(&Value::from(vec!["a"])));
}

#[test]
fn test_construct_checks_values_and_fills_defaults() {
    let record = BOUNDED.construct([("n", Value::Int(3))]).unwrap();
    assert_eq!(record.get("s"), Some(&Value::from("")));

    let err = BOUNDED.construct([("n", Value::Int(11))]).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::ConstraintViolation);
    assert_eq!(err.path().to_string(), ".n");

    let err = BOUNDED.construct([("s", Value::from("x"))]).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::MissingFields);

    let err = BOUNDED.construct([("nope", Value::Null)]).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::Custom);
}

#[test]
fn test_decoded_constraint_violation() {
    let err = BOUNDED.decode(&json!({"n": -1})).unwrap_err();
    assert_eq!(err.expectation(), "be >= 0");
    assert_eq!(err.path().to_string(), ".n");
}

static ALIASED: LazyLock<RecordType> = LazyLock::new(|| {
    RecordType::builder("Aliased")
        .field(Field::new("x", Ty::Int).default(0i64))
        .field(Field::new("z", Ty::Int).default(0i64))
        .alias("y", FieldAlias::prepend("x"))
        .alias("w", FieldAlias::append("z"))
        .alias("old_w", FieldAlias::append("z").deprecated())
        .build()
        .unwrap()
});

#[test]
fn test_alias_merge_modes() {
    let r = ALIASED.decode(&json!({"x": 1, "y": 2})).unwrap();
    assert_eq!(r.get("x"), Some(&Value::Int(1)));
    let r = ALIASED.decode(&json!({"y": 2})).unwrap();
    assert_eq!(r.get("x"), Some(&Value::Int(2)));
    let r = ALIASED.decode(&json!({"z": 1, "w": 2})).unwrap();
    assert_eq!(r.get("z"), Some(&Value::Int(2)));
}

#[test]
fn test_deprecated_alias_still_decodes() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let r = ALIASED.decode(&json!({"old_w": 5})).unwrap();
    assert_eq!(r.get("z"), Some(&Value::Int(5)));
}

#[test]
fn test_alias_value_errors_use_target_wire_key() {
    let err = ALIASED.decode(&json!({"y": "two"})).unwrap_err();
    assert_eq!(err.path().to_string(), ".x");
}

#[test]
fn test_record_types_shared_across_threads() {
    std::thread::scope(|scope| {
        for n in 0..4i64 {
            scope.spawn(move || {
                let r = ITEM.decode(&json!({"n": n})).unwrap();
                assert_eq!(r.get("n"), Some(&Value::Int(n)));
            });
        }
    });
}

// -- Typed models ------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct CommandStep {
    label: Option<String>,
    command: Vec<String>,
    if_condition: Option<String>,
}

static COMMAND_STEP: LazyLock<RecordType> = LazyLock::new(|| {
    RecordType::builder("CommandStep")
        .field(Field::new("label", Ty::optional(Ty::Str)).default(Value::Null))
        .field(Field::new("command", Ty::list(Ty::Str)))
        .field(
            Field::new("if_condition", Ty::optional(Ty::Str))
                .rename("if")
                .default(Value::Null),
        )
        .decoder("command", Ty::union([Ty::Str, Ty::list(Ty::Str)]), |value| match value {
            Value::Str(single) => Ok(Value::List(vec![Value::Str(single)])),
            other => Ok(other),
        })
        .alias("commands", FieldAlias::append("command"))
        .build()
        .unwrap()
});

impl Model for CommandStep {
    fn record_type() -> &'static RecordType {
        &COMMAND_STEP
    }

    fn from_record(mut record: Record) -> Result<Self, DecodeError> {
        let if_condition = record
            .take("if_condition")?
            .into_optional_string()
            .at_attr("if_condition")?;
        if if_condition.as_deref() == Some("") {
            return Err(
                DecodeError::custom(json!(""), "be a non-empty condition").add_attr("if_condition")
            );
        }
        Ok(Self {
            label: record.take("label")?.into_optional_string().at_attr("label")?,
            command: record
                .take("command")?
                .into_list()?
                .into_iter()
                .map(Value::into_string)
                .collect::<Result<Vec<_>, DecodeError>>()
                .at_attr("command")?,
            if_condition,
        })
    }

    fn to_record(&self) -> Result<Record, DecodeError> {
        COMMAND_STEP.construct([
            ("label", Value::from(self.label.clone())),
            ("command", Value::from(self.command.clone())),
            ("if_condition", Value::from(self.if_condition.clone())),
        ])
    }
}

#[test]
fn test_model_load_applies_custom_decoder() {
    let step = CommandStep::load(&json!({"command": "make test", "if": "x"})).unwrap();
    assert_eq!(
        step,
        CommandStep {
            label: None,
            command: vec!["make test".to_string()],
            if_condition: Some("x".to_string()),
        }
    );
}

#[test]
fn test_model_dump_uses_wire_names() {
    let step = CommandStep::load(&json!({"commands": ["a", "b"]})).unwrap();
    assert_eq!(
        step.dump().unwrap(),
        json!({"label": null, "command": ["a", "b"], "if": null})
    );
    assert_eq!(CommandStep::load(&step.dump().unwrap()).unwrap(), step);
}

#[test]
fn test_model_conversion_error_reports_wire_name() {
    let err = CommandStep::load(&json!({"command": [], "if": ""})).unwrap_err();
    assert_eq!(err.path().to_string(), ".if");
    assert_eq!(err.expectation(), "be a non-empty condition");
}

#[test]
fn test_custom_decoder_input_type_enforced() {
    let err = CommandStep::load(&json!({"command": 3})).unwrap_err();
    assert_eq!(err.expectation(), "be of type `str | list[str]`");
    assert_eq!(err.path().to_string(), ".command");
}
