//! # Schema Generation
//!
//! Derives JSON Schema (Draft 2020-12) from type descriptors and record
//! types. The schema always describes the *wire* shape: fields with a
//! custom decoder are described by the decoder's input (or declared schema)
//! descriptor, and properties are keyed by wire name.
//!
//! ## Definitions
//!
//! Each record type referenced from a descriptor is materialized once in a
//! definitions map keyed by record name and referenced as
//! `{"$ref": "#/$defs/<Name>"}`. A placeholder is inserted before a record
//! is expanded, so self- and mutually-referential records terminate.
//!
//! ## Root documents
//!
//! [`schema_for`] inlines the root record and attaches the definitions
//! under `$defs`, which is present even when empty. The root appears in
//! `$defs` only if something refers back to it.
//!
//! ## Renames
//!
//! Properties are keyed by wire name. A renamed field's canonical name is
//! also accepted on the wire, so it gets a pointer property to the renamed
//! one, the same way an alias does.

use clay_core::{RecordType, Ty};
use serde_json::{json, Map, Value as JsonValue};

/// JSON object holding a schema fragment.
pub type SchemaMap = Map<String, JsonValue>;

/// The JSON Schema dialect generated documents conform to.
pub const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

/// Pointer prefix for record definitions.
pub const DEFS_PREFIX: &str = "#/$defs/";

/// Pattern advertised for UUID strings.
pub const UUID_PATTERN: &str =
    "^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";

/// Root document options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Value of the root `$schema` keyword, if any.
    pub schema_uri: Option<String>,
    /// Value of the root `$id` keyword, if any.
    pub id: Option<String>,
}

impl SchemaOptions {
    /// Options declaring the Draft 2020-12 dialect.
    pub fn draft_2020_12() -> Self {
        Self {
            schema_uri: Some(DRAFT_2020_12.to_string()),
            id: None,
        }
    }

    /// Set the root `$id`.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Accumulates record definitions across any number of schema calls.
#[derive(Debug, Clone, Default)]
pub struct SchemaGenerator {
    definitions: SchemaMap,
}

impl SchemaGenerator {
    /// A generator with an empty definitions map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue filling an existing definitions map.
    pub fn with_definitions(definitions: SchemaMap) -> Self {
        Self { definitions }
    }

    /// Schema fragment for a descriptor. Record references become `$ref`s.
    pub fn schema(&mut self, ty: &Ty) -> JsonValue {
        JsonValue::Object(self.fragment(ty))
    }

    /// The record definitions materialized so far.
    pub fn definitions(&self) -> &SchemaMap {
        &self.definitions
    }

    /// Consume the generator, returning the definitions.
    pub fn into_definitions(self) -> SchemaMap {
        self.definitions
    }

    fn fragment(&mut self, ty: &Ty) -> SchemaMap {
        let value = match ty {
            Ty::Bool => json!({"type": "boolean"}),
            Ty::Int => json!({"type": "integer"}),
            Ty::Str => json!({"type": "string"}),
            Ty::Null => json!({"type": "null"}),
            Ty::Pattern => json!({"type": "string", "format": "regex"}),
            Ty::Uuid => json!({"type": "string", "pattern": UUID_PATTERN}),
            Ty::Any => json!({}),
            Ty::Union(alternatives) => {
                let any_of: Vec<JsonValue> = alternatives.iter().map(|a| self.schema(a)).collect();
                json!({ "anyOf": any_of })
            }
            Ty::Literal(values) => {
                let values: Vec<JsonValue> = values.iter().map(|v| v.to_wire()).collect();
                json!({ "enum": values })
            }
            Ty::List(item) => json!({"type": "array", "items": self.schema(item)}),
            Ty::Map(key, value) => {
                let mut out = SchemaMap::new();
                out.insert("type".into(), json!("object"));
                let additional = match **value {
                    Ty::Any => JsonValue::Bool(true),
                    _ => self.schema(value),
                };
                out.insert("additionalProperties".into(), additional);
                let mut names = self.fragment(key);
                names.remove("type");
                if !names.is_empty() {
                    out.insert("propertyNames".into(), JsonValue::Object(names));
                }
                return out;
            }
            Ty::Constrained(base, constraints) => {
                let mut out = self.fragment(base);
                let wire = base.wire_type();
                for constraint in constraints {
                    out.extend(constraint.schema(wire));
                }
                return out;
            }
            Ty::Record(reference) => {
                let name = reference.name();
                if !self.definitions.contains_key(name) {
                    // Placeholder first: a reference back to `name` while
                    // expanding it must see the definition as taken.
                    self.definitions.insert(name.to_string(), JsonValue::Bool(true));
                    let base = format!("{DEFS_PREFIX}{}", escape_pointer(name));
                    let definition = self.record_fragment(reference.get(), &base);
                    self.definitions
                        .insert(name.to_string(), JsonValue::Object(definition));
                    tracing::debug!(record = name, "materialized schema definition");
                }
                json!({ "$ref": format!("{DEFS_PREFIX}{}", escape_pointer(name)) })
            }
        };
        match value {
            JsonValue::Object(map) => map,
            _ => SchemaMap::new(),
        }
    }

    /// Object schema for a record type located at JSON pointer `base`.
    ///
    /// `base` is where the fragment will live in the final document
    /// (`#` for an inlined root); alias properties point into it.
    pub fn record_fragment(&mut self, rt: &'static RecordType, base: &str) -> SchemaMap {
        let mut properties = SchemaMap::new();
        for field in rt.fields() {
            let mut property = self.fragment(field.schema_ty());
            if let Some(description) = field.description() {
                property.insert("description".into(), json!(description));
            }
            if let Some(default) = field.default_value() {
                property.insert("default".into(), field.encode_value(&default.produce()));
            }
            properties.insert(field.wire_name().to_string(), JsonValue::Object(property));
        }

        for field in rt.fields() {
            if field.wire_name() != field.name() {
                properties.insert(
                    field.name().to_string(),
                    json!({
                        "$ref": format!("{base}/properties/{}", escape_pointer(field.wire_name()))
                    }),
                );
            }
        }

        for (alias_name, alias) in rt.aliases() {
            let Some(target) = rt.field(alias.target()) else {
                continue;
            };
            let mut property = SchemaMap::new();
            property.insert(
                "$ref".into(),
                json!(format!("{base}/properties/{}", escape_pointer(target.wire_name()))),
            );
            if alias.is_deprecated() {
                property.insert("deprecated".into(), JsonValue::Bool(true));
            }
            properties.insert(alias_name.clone(), JsonValue::Object(property));
        }

        let required: Vec<JsonValue> = rt.required_fields().map(|f| json!(f.wire_name())).collect();

        let mut out = SchemaMap::new();
        out.insert("type".into(), json!("object"));
        if let Some(description) = rt.description() {
            out.insert("description".into(), json!(description));
        }
        out.insert("properties".into(), JsonValue::Object(properties));
        out.insert("required".into(), JsonValue::Array(required));
        out.insert(
            "additionalProperties".into(),
            JsonValue::Bool(rt.allows_extras()),
        );
        out
    }
}

/// Schema fragment for `ty`, materializing referenced records into `definitions`.
pub fn schema(ty: &Ty, definitions: &mut SchemaMap) -> JsonValue {
    let mut generator = SchemaGenerator::with_definitions(std::mem::take(definitions));
    let fragment = generator.schema(ty);
    *definitions = generator.into_definitions();
    fragment
}

/// Complete schema document for a record type.
pub fn schema_for(rt: &'static RecordType) -> JsonValue {
    schema_for_with(rt, &SchemaOptions::default())
}

/// Complete schema document for a record type, with root options.
pub fn schema_for_with(rt: &'static RecordType, options: &SchemaOptions) -> JsonValue {
    let mut generator = SchemaGenerator::new();
    let root = generator.record_fragment(rt, "#");
    let definitions = generator.into_definitions();

    let mut document = SchemaMap::new();
    if let Some(uri) = &options.schema_uri {
        document.insert("$schema".into(), json!(uri));
    }
    if let Some(id) = &options.id {
        document.insert("$id".into(), json!(id));
    }
    document.extend(root);
    document.insert("$defs".into(), JsonValue::Object(definitions));
    JsonValue::Object(document)
}

/// Escape one JSON pointer reference token.
fn escape_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}
