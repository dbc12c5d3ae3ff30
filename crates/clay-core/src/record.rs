//! # Record Declarations
//!
//! A record type is declared in two phases:
//!
//! 1. Collect fields, aliases, custom decoders and encoders on a
//!    [`RecordBuilder`].
//! 2. [`RecordBuilder::build`] applies every registration, validates the
//!    declaration as a whole, and seals an immutable [`RecordType`].
//!
//! Record types are meant to live for the whole program, typically in a
//! `static LazyLock<RecordType>`, and be shared by any number of readers.
//!
//! ## Wire keys
//!
//! Each field is accepted on the wire under exactly one key: its rename if it
//! has one, else its canonical name. Field aliases are additional wire-only
//! names that forward to a field. Anything else is an extra key.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

use crate::error::{DeclarationError, DecodeError, PathSegment};
use crate::ty::{Literal, Ty};
use crate::value::Value;

/// Converts a value decoded with the decoder's input descriptor into the field's value.
pub type DecodeFn = Arc<dyn Fn(Value) -> Result<Value, DecodeError> + Send + Sync>;

/// Converts a field's value into its wire form.
pub type EncodeFn = Arc<dyn Fn(&Value) -> JsonValue + Send + Sync>;

/// Produces a fresh default value on every call.
pub type DefaultFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// Runs after a record instance is assembled; may reject it.
pub type PostDecodeHook = Arc<dyn Fn(&Record) -> Result<(), DecodeError> + Send + Sync>;

/// A field's default.
#[derive(Clone)]
pub enum FieldDefault {
    /// A fixed value, cloned into each instance.
    Value(Value),
    /// A producer invoked once per decode or construction.
    Factory(DefaultFactory),
}

impl FieldDefault {
    /// Produce the default for one instance.
    pub fn produce(&self) -> Value {
        match self {
            FieldDefault::Value(value) => value.clone(),
            FieldDefault::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Value(value) => f.debug_tuple("Value").field(value).finish(),
            FieldDefault::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// A custom decoder: the wire shape it accepts and the conversion.
#[derive(Clone)]
pub struct FieldDecoder {
    input: Ty,
    schema_ty: Option<Ty>,
    func: DecodeFn,
}

impl FieldDecoder {
    /// A decoder accepting `input` on the wire.
    pub fn new<F>(input: Ty, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, DecodeError> + Send + Sync + 'static,
    {
        Self {
            input,
            schema_ty: None,
            func: Arc::new(func),
        }
    }

    /// Describe the wire shape in schemas as `schema_ty` instead of `input`.
    pub fn with_schema_ty(mut self, schema_ty: Ty) -> Self {
        self.schema_ty = Some(schema_ty);
        self
    }

    /// The descriptor raw input is decoded with before conversion.
    pub fn input(&self) -> &Ty {
        &self.input
    }

    /// The descriptor schemas should advertise.
    pub fn schema_ty(&self) -> &Ty {
        self.schema_ty.as_ref().unwrap_or(&self.input)
    }

    /// Run the conversion.
    pub fn apply(&self, value: Value) -> Result<Value, DecodeError> {
        (self.func)(value)
    }
}

impl fmt::Debug for FieldDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDecoder")
            .field("input", &self.input)
            .field("schema_ty", &self.schema_ty)
            .finish_non_exhaustive()
    }
}

/// A custom encoder.
#[derive(Clone)]
pub struct FieldEncoder(EncodeFn);

impl FieldEncoder {
    /// Wrap an encoding function.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Value) -> JsonValue + Send + Sync + 'static,
    {
        Self(Arc::new(func))
    }

    /// Run the conversion.
    pub fn apply(&self, value: &Value) -> JsonValue {
        (self.0)(value)
    }
}

impl fmt::Debug for FieldEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldEncoder(..)")
    }
}

/// A field declaration.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    ty: Ty,
    default: Option<FieldDefault>,
    rename: Option<String>,
    decoder: Option<FieldDecoder>,
    encoder: Option<FieldEncoder>,
    description: Option<String>,
    // Registrations beyond the first, reported by `RecordBuilder::build`.
    extra_decoders: usize,
    extra_encoders: usize,
}

impl Field {
    /// A required field of type `ty`.
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            rename: None,
            decoder: None,
            encoder: None,
            description: None,
            extra_decoders: 0,
            extra_encoders: 0,
        }
    }

    /// Make the field optional with a fixed default.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }

    /// Make the field optional with a default produced fresh per instance.
    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(FieldDefault::Factory(Arc::new(factory)));
        self
    }

    /// Accept and emit the field under `wire_name` instead of its canonical name.
    pub fn rename(mut self, wire_name: impl Into<String>) -> Self {
        self.rename = Some(wire_name.into());
        self
    }

    /// Human-readable description, carried into schemas.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Register a custom decoder inline.
    pub fn decode_with(mut self, decoder: FieldDecoder) -> Self {
        self.set_decoder(decoder);
        self
    }

    /// Register a custom encoder inline.
    pub fn encode_with(mut self, encoder: FieldEncoder) -> Self {
        self.set_encoder(encoder);
        self
    }

    fn set_decoder(&mut self, decoder: FieldDecoder) {
        if self.decoder.is_some() {
            self.extra_decoders += 1;
        } else {
            self.decoder = Some(decoder);
        }
    }

    fn set_encoder(&mut self, encoder: FieldEncoder) {
        if self.encoder.is_some() {
            self.extra_encoders += 1;
        } else {
            self.encoder = Some(encoder);
        }
    }

    /// Canonical field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared (decoded) descriptor.
    pub fn ty(&self) -> &Ty {
        &self.ty
    }

    /// The key this field uses on the wire.
    pub fn wire_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }

    /// Wire rename, if any.
    pub fn rename_target(&self) -> Option<&str> {
        self.rename.as_deref()
    }

    /// Default, if any.
    pub fn default_value(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }

    /// True iff the field has neither a default nor a default factory.
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Custom decoder, if any.
    pub fn decoder(&self) -> Option<&FieldDecoder> {
        self.decoder.as_ref()
    }

    /// Custom encoder, if any.
    pub fn encoder(&self) -> Option<&FieldEncoder> {
        self.encoder.as_ref()
    }

    /// Description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The descriptor raw wire input is decoded with.
    pub fn input_ty(&self) -> &Ty {
        self.decoder.as_ref().map_or(&self.ty, FieldDecoder::input)
    }

    /// The descriptor schemas advertise for this field's wire shape.
    pub fn schema_ty(&self) -> &Ty {
        self.decoder.as_ref().map_or(&self.ty, FieldDecoder::schema_ty)
    }

    /// Encode a value of this field, honoring the custom encoder.
    pub fn encode_value(&self, value: &Value) -> JsonValue {
        match &self.encoder {
            Some(encoder) => encoder.apply(value),
            None => value.to_wire(),
        }
    }
}

/// How an alias value merges with the canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AliasMode {
    /// Use the alias only when the canonical key is absent or null.
    Prepend,
    /// The alias always wins.
    Append,
}

/// A wire-only synonym forwarding to a canonical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAlias {
    target: String,
    mode: AliasMode,
    deprecated: bool,
}

impl FieldAlias {
    /// An alias that always overrides its target.
    pub fn new(target: impl Into<String>) -> Self {
        Self::append(target)
    }

    /// An alias used only when the target is absent.
    pub fn prepend(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            mode: AliasMode::Prepend,
            deprecated: false,
        }
    }

    /// An alias that always overrides its target.
    pub fn append(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            mode: AliasMode::Append,
            deprecated: false,
        }
    }

    /// Flag the alias as deprecated.
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Canonical field name the alias forwards to.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Merge mode.
    pub fn mode(&self) -> AliasMode {
        self.mode
    }

    /// Whether the alias is deprecated.
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }
}

/// Collects a record declaration. See the module docs.
pub struct RecordBuilder {
    name: String,
    fields: Vec<Field>,
    aliases: Vec<(String, FieldAlias)>,
    allow_extras: bool,
    discriminant: Option<String>,
    post_decode: Option<PostDecodeHook>,
    decoders: Vec<(String, FieldDecoder)>,
    encoders: Vec<(String, FieldEncoder)>,
    description: Option<String>,
}

impl RecordBuilder {
    /// Start declaring a record named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            aliases: Vec::new(),
            allow_extras: false,
            discriminant: None,
            post_decode: None,
            decoders: Vec::new(),
            encoders: Vec::new(),
            description: None,
        }
    }

    /// Append a field. Declaration order is preserved.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare a field alias.
    pub fn alias(mut self, name: impl Into<String>, alias: FieldAlias) -> Self {
        self.aliases.push((name.into(), alias));
        self
    }

    /// Capture unknown wire keys instead of rejecting them.
    pub fn allow_extras(mut self, allow: bool) -> Self {
        self.allow_extras = allow;
        self
    }

    /// Name a literal-typed field whose default is always written on encode.
    pub fn discriminant(mut self, field: impl Into<String>) -> Self {
        self.discriminant = Some(field.into());
        self
    }

    /// Validate each assembled instance.
    pub fn post_decode<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Record) -> Result<(), DecodeError> + Send + Sync + 'static,
    {
        self.post_decode = Some(Arc::new(hook));
        self
    }

    /// Register a custom decoder for `field`, accepting `input` on the wire.
    pub fn decoder<F>(self, field: impl Into<String>, input: Ty, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, DecodeError> + Send + Sync + 'static,
    {
        self.decoder_with(field, FieldDecoder::new(input, func))
    }

    /// Register a prepared custom decoder for `field`.
    pub fn decoder_with(mut self, field: impl Into<String>, decoder: FieldDecoder) -> Self {
        self.decoders.push((field.into(), decoder));
        self
    }

    /// Register a custom encoder for `field`.
    pub fn encoder<F>(mut self, field: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> JsonValue + Send + Sync + 'static,
    {
        self.encoders.push((field.into(), FieldEncoder::new(func)));
        self
    }

    /// Human-readable description, carried into schemas.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Apply all registrations, validate the declaration, and seal it.
    ///
    /// # Errors
    ///
    /// Returns a `DeclarationError` for duplicate keys, duplicate or orphan
    /// decoder/encoder registrations, aliases that are dangling or collide
    /// with wire keys, overlapping sum alternatives, malformed literal sets,
    /// non-string map keys, inapplicable constraints, or an invalid
    /// discriminant.
    pub fn build(self) -> Result<RecordType, DeclarationError> {
        let RecordBuilder {
            name,
            mut fields,
            aliases,
            allow_extras,
            discriminant,
            post_decode,
            decoders,
            encoders,
            description,
        } = self;

        for (field_name, decoder) in decoders {
            let field = find_field_mut(&mut fields, &name, &field_name, "decoder")?;
            field.set_decoder(decoder);
        }
        for (field_name, encoder) in encoders {
            let field = find_field_mut(&mut fields, &name, &field_name, "encoder")?;
            field.set_encoder(encoder);
        }

        let mut names = BTreeSet::new();
        let mut wire_keys = BTreeMap::new();
        for (index, field) in fields.iter().enumerate() {
            if field.extra_decoders > 0 {
                return Err(DeclarationError::DuplicateDecoder {
                    record: name,
                    field: field.name.clone(),
                });
            }
            if field.extra_encoders > 0 {
                return Err(DeclarationError::DuplicateEncoder {
                    record: name,
                    field: field.name.clone(),
                });
            }
            if !names.insert(field.name.clone()) {
                return Err(DeclarationError::DuplicateKey {
                    record: name,
                    key: field.name.clone(),
                });
            }
            let mut keys = vec![field.name.as_str()];
            if let Some(rename) = field.rename.as_deref().filter(|r| *r != field.name) {
                keys.push(rename);
            }
            for key in keys {
                if wire_keys.insert(key.to_string(), index).is_some() {
                    return Err(DeclarationError::DuplicateKey {
                        record: name,
                        key: key.to_string(),
                    });
                }
            }

            let checker = DescriptorChecker {
                record: &name,
                field: &field.name,
            };
            checker.check(&field.ty)?;
            if let Some(decoder) = &field.decoder {
                checker.check(&decoder.input)?;
                if let Some(schema_ty) = &decoder.schema_ty {
                    checker.check(schema_ty)?;
                }
            }
        }

        let mut alias_names = BTreeSet::new();
        for (alias_name, alias) in &aliases {
            if !names.contains(alias.target()) {
                return Err(DeclarationError::AliasTargetMissing {
                    record: name,
                    alias: alias_name.clone(),
                    target: alias.target().to_string(),
                });
            }
            if wire_keys.contains_key(alias_name) || !alias_names.insert(alias_name.clone()) {
                return Err(DeclarationError::AliasCollision {
                    record: name,
                    alias: alias_name.clone(),
                });
            }
        }

        if let Some(tag) = &discriminant {
            let valid = fields.iter().any(|f| {
                f.name == *tag
                    && matches!(f.ty, Ty::Literal(_))
                    && matches!(f.default, Some(FieldDefault::Value(_)))
            });
            if !valid {
                return Err(DeclarationError::InvalidDiscriminant {
                    record: name,
                    field: tag.clone(),
                });
            }
        }

        tracing::debug!(
            record = %name,
            fields = fields.len(),
            aliases = aliases.len(),
            allow_extras,
            "sealed record type"
        );

        Ok(RecordType {
            name,
            fields,
            aliases,
            allow_extras,
            discriminant,
            post_decode,
            wire_keys,
            description,
        })
    }
}

fn find_field_mut<'a>(
    fields: &'a mut [Field],
    record: &str,
    field: &str,
    what: &'static str,
) -> Result<&'a mut Field, DeclarationError> {
    fields
        .iter_mut()
        .find(|f| f.name == field)
        .ok_or_else(|| DeclarationError::UnknownField {
            record: record.to_string(),
            field: field.to_string(),
            what,
        })
}

/// Static checks over a field's descriptors.
///
/// Never resolves record references, so a record may refer to itself
/// while it is being sealed.
struct DescriptorChecker<'a> {
    record: &'a str,
    field: &'a str,
}

impl DescriptorChecker<'_> {
    fn check(&self, ty: &Ty) -> Result<(), DeclarationError> {
        match ty {
            Ty::Bool
            | Ty::Int
            | Ty::Str
            | Ty::Null
            | Ty::Pattern
            | Ty::Uuid
            | Ty::Any
            | Ty::Record(_) => Ok(()),
            Ty::Union(_) => self.check_sum(ty),
            Ty::Literal(values) => {
                let first = values.first().map(Literal::json_type);
                if first.is_none() || values.iter().any(|v| Some(v.json_type()) != first) {
                    return Err(DeclarationError::InvalidLiteralSet {
                        record: self.record.to_string(),
                        field: self.field.to_string(),
                        ty: ty.to_string(),
                    });
                }
                Ok(())
            }
            Ty::List(item) => self.check(item),
            Ty::Map(key, value) => {
                if key.wire_type() != Some(crate::ty::JsonType::String) {
                    return Err(DeclarationError::NonStringMapKey {
                        record: self.record.to_string(),
                        field: self.field.to_string(),
                        ty: key.to_string(),
                    });
                }
                self.check(key)?;
                self.check(value)
            }
            Ty::Constrained(base, constraints) => {
                self.check(base)?;
                for constraint in constraints {
                    if !constraint.applies_to(base) {
                        return Err(DeclarationError::InapplicableConstraint {
                            record: self.record.to_string(),
                            field: self.field.to_string(),
                            constraint: constraint.to_string(),
                            ty: base.to_string(),
                        });
                    }
                }
                Ok(())
            }
        }
    }

    fn check_sum(&self, sum: &Ty) -> Result<(), DeclarationError> {
        let mut seen = BTreeSet::new();
        for alternative in sum.alternatives() {
            if matches!(alternative, Ty::Any) {
                return Err(DeclarationError::AnyInSum {
                    record: self.record.to_string(),
                    field: self.field.to_string(),
                    ty: sum.to_string(),
                });
            }
            // Alternatives without a single wire type (e.g. a constrained sum)
            // cannot be selected by input type.
            let disjoint = alternative.wire_type().is_some_and(|wire| seen.insert(wire));
            if !disjoint {
                return Err(DeclarationError::OverlappingSum {
                    record: self.record.to_string(),
                    field: self.field.to_string(),
                    ty: sum.to_string(),
                });
            }
            self.check(alternative)?;
        }
        Ok(())
    }
}

/// A sealed, immutable record type.
pub struct RecordType {
    name: String,
    fields: Vec<Field>,
    aliases: Vec<(String, FieldAlias)>,
    allow_extras: bool,
    discriminant: Option<String>,
    post_decode: Option<PostDecodeHook>,
    wire_keys: BTreeMap<String, usize>,
    description: Option<String>,
}

impl RecordType {
    /// Start declaring a record named `name`.
    pub fn builder(name: impl Into<String>) -> RecordBuilder {
        RecordBuilder::new(name)
    }

    /// Give the record type a `'static` lifetime.
    ///
    /// Record types normally live in a `static`; this is for types assembled
    /// at runtime that must outlive every instance decoded from them.
    pub fn leak(self) -> &'static RecordType {
        Box::leak(Box::new(self))
    }

    /// Record name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by canonical name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field by a key it accepts on the wire (its canonical name
    /// or its rename).
    pub fn field_by_wire_key(&self, key: &str) -> Option<&Field> {
        self.wire_keys.get(key).map(|&index| &self.fields[index])
    }

    /// Field aliases in declaration order.
    pub fn aliases(&self) -> &[(String, FieldAlias)] {
        &self.aliases
    }

    /// Whether unknown wire keys are captured rather than rejected.
    pub fn allows_extras(&self) -> bool {
        self.allow_extras
    }

    /// The discriminant field and its canonical literal, if declared.
    pub fn discriminant(&self) -> Option<(&Field, &Value)> {
        let tag = self.discriminant.as_deref()?;
        let field = self.field(tag)?;
        match field.default_value()? {
            FieldDefault::Value(value) => Some((field, value)),
            FieldDefault::Factory(_) => None,
        }
    }

    /// Description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// True if `key` names a field on the wire: a canonical name or a
    /// rename. Aliases are excluded.
    pub fn is_field_wire_key(&self, key: &str) -> bool {
        self.wire_keys.contains_key(key)
    }

    /// Canonical names of fields with neither default nor default factory.
    pub fn required_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_required())
    }

    /// Decode a wire value into an instance of this record type.
    ///
    /// # Errors
    ///
    /// Returns a `DecodeError` with the path to the offending value.
    pub fn decode(&'static self, wire: &JsonValue) -> Result<Record, DecodeError> {
        crate::decode::decode_record(self, wire)
    }

    /// Build an instance directly from canonical field values.
    ///
    /// Absent fields take their defaults (factories are invoked fresh),
    /// every value is checked against its field's descriptor, and the
    /// post-decode hook runs last.
    ///
    /// # Errors
    ///
    /// Fails on unknown field names, missing required fields (reported
    /// together), values that do not conform to their descriptor, or a
    /// rejecting post-decode hook.
    pub fn construct<I, K>(&'static self, values: I) -> Result<Record, DecodeError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut provided: BTreeMap<String, Value> = BTreeMap::new();
        for (key, value) in values {
            let key = key.into();
            let field = self.field(&key).ok_or_else(|| {
                DecodeError::custom(
                    JsonValue::String(key.clone()),
                    format!("be a field of record `{}`", self.name),
                )
            })?;
            crate::check::validate(field.ty(), &value).map_err(|e| e.add_attr(field.wire_name()))?;
            provided.insert(key, value);
        }
        let record = self.assemble(provided, Map::new())?;
        self.run_post_decode(&record)?;
        Ok(record)
    }

    /// Fill defaults, check required fields, and create the instance.
    pub(crate) fn assemble(
        &'static self,
        mut values: BTreeMap<String, Value>,
        extras: Map<String, JsonValue>,
    ) -> Result<Record, DecodeError> {
        let missing: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.is_required() && !values.contains_key(&f.name))
            .map(|f| f.name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(DecodeError::missing_fields(&self.name, &missing));
        }

        for field in &self.fields {
            if let Some(default) = &field.default {
                values
                    .entry(field.name.clone())
                    .or_insert_with(|| default.produce());
            }
        }

        Ok(Record {
            ty: self,
            values,
            extras,
        })
    }

    /// Run the post-decode hook, mapping canonical attribute paths to wire names.
    pub(crate) fn run_post_decode(&self, record: &Record) -> Result<(), DecodeError> {
        match &self.post_decode {
            Some(hook) => hook(record).map_err(|e| self.rename_trailing_attr(e)),
            None => Ok(()),
        }
    }

    /// Rewrite an innermost `.canonical` segment to the field's wire rename.
    ///
    /// Used for failures raised after decoding (hooks, typed conversions),
    /// which name fields by their canonical attribute.
    pub fn rename_trailing_attr(&self, mut err: DecodeError) -> DecodeError {
        if let Some(PathSegment::Attr(attr)) = err.path_mut().last_mut() {
            if let Some(rename) = self.field(attr).and_then(Field::rename_target) {
                *attr = rename.to_string();
            }
        }
        err
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("aliases", &self.aliases)
            .field("allow_extras", &self.allow_extras)
            .field("discriminant", &self.discriminant)
            .finish_non_exhaustive()
    }
}

/// An instance of a record type.
#[derive(Clone)]
pub struct Record {
    ty: &'static RecordType,
    values: BTreeMap<String, Value>,
    extras: Map<String, JsonValue>,
}

impl Record {
    /// The record type this instance belongs to.
    pub fn record_type(&self) -> &'static RecordType {
        self.ty
    }

    /// Value of a field, by canonical name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Remove and return a field's value, for conversion into typed structs.
    ///
    /// # Errors
    ///
    /// Fails if the record has no such field.
    pub fn take(&mut self, name: &str) -> Result<Value, DecodeError> {
        self.values.remove(name).ok_or_else(|| {
            DecodeError::custom(
                JsonValue::String(name.to_string()),
                format!("be a field of record `{}`", self.ty.name()),
            )
        })
    }

    /// All field values, keyed by canonical name.
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Unknown wire keys captured during decode (empty unless extras are allowed).
    pub fn extras(&self) -> &Map<String, JsonValue> {
        &self.extras
    }

}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.ty, other.ty) && self.values == other.values && self.extras == other.extras
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.ty.name());
        for (name, value) in &self.values {
            s.field(name, value);
        }
        if !self.extras.is_empty() {
            s.field("_extras", &self.extras);
        }
        s.finish()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        crate::encode::encode_record(self).serialize(serializer)
    }
}
