//! # Error Types: Decode Failures and Declaration Errors
//!
//! Defines the error types used throughout the engine. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Decode failures carry the offending wire value, a human-readable
//!   expectation, an optional qualifier, and a structural [`Path`].
//! - Each recursion layer adds exactly one path segment via [`ResultExt`]
//!   and otherwise propagates the error unmodified.
//! - Declaration errors are programming errors raised while sealing a
//!   record type. They never occur during decoding.

use std::fmt;

use serde_json::Value as JsonValue;
use thiserror::Error;

/// One step of a structural path into a wire value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A record field, rendered `.name`.
    Attr(String),
    /// A sequence position, rendered `[index]`.
    Index(usize),
    /// A mapping key, rendered `['key']` with the key escaped.
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Attr(name) => write!(f, ".{name}"),
            PathSegment::Index(index) => write!(f, "[{index}]"),
            PathSegment::Key(key) => {
                f.write_str("[")?;
                write_quoted_key(f, key)?;
                f.write_str("]")
            }
        }
    }
}

/// Quote a mapping key so the rendered path stays unambiguous.
///
/// Single quotes unless the key contains a single quote and no double
/// quote. Backslashes, the active quote and control characters are escaped.
fn write_quoted_key(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    let quote = if key.contains('\'') && !key.contains('"') {
        '"'
    } else {
        '\''
    };
    write!(f, "{quote}")?;
    for c in key.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => write!(f, "\\{c}")?,
            c if c.is_control() => write!(f, "\\x{:02x}", u32::from(c))?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "{quote}")
}

/// Ordered path from the outermost value to the offending one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// The empty path (the error concerns the value being decoded itself).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Prepend a segment. Called while the error travels outward.
    pub fn prepend(&mut self, segment: PathSegment) {
        self.0.insert(0, segment);
    }

    /// The segments, outermost first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// The innermost segment, if any.
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Mutable access to the innermost segment.
    pub fn last_mut(&mut self) -> Option<&mut PathSegment> {
        self.0.last_mut()
    }

    /// Returns true if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromIterator<PathSegment> for Path {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Classification of a decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorKind {
    /// The input's concrete JSON type disagrees with the expected shape.
    ShapeMismatch,
    /// The input object carries keys the record does not accept.
    ExtraKeys,
    /// One or more required fields are absent.
    MissingFields,
    /// A decoded value failed one of its attached constraints.
    ConstraintViolation,
    /// A string failed to parse as a regex pattern or UUID.
    InvalidLiteral,
    /// Raised by a custom decoder, post-decode hook, or typed model conversion.
    Custom,
}

/// A decode or validation failure with a structural path.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Expected {}`{value}` to {expectation}\nPath: {path}", qualifier_prefix(.qualifier))]
pub struct DecodeError {
    kind: DecodeErrorKind,
    value: JsonValue,
    expectation: String,
    qualifier: Option<String>,
    path: Path,
}

fn qualifier_prefix(qualifier: &Option<String>) -> String {
    qualifier
        .as_deref()
        .map(|q| format!("{q} "))
        .unwrap_or_default()
}

impl DecodeError {
    /// Build an error with an empty path.
    pub fn new(kind: DecodeErrorKind, value: JsonValue, expectation: impl Into<String>) -> Self {
        Self {
            kind,
            value,
            expectation: expectation.into(),
            qualifier: None,
            path: Path::root(),
        }
    }

    /// Attach a qualifier, rendered before the value (e.g. "extra keys").
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// The input's type does not match `expected`.
    pub fn wrong_type(expected: impl fmt::Display, value: &JsonValue) -> Self {
        Self::new(
            DecodeErrorKind::ShapeMismatch,
            value.clone(),
            format!("be of type `{expected}`"),
        )
    }

    /// Keys outside the record's wire-key set, on a record that rejects them.
    pub fn extras_not_allowed(record_name: &str, extras: serde_json::Map<String, JsonValue>) -> Self {
        Self::new(
            DecodeErrorKind::ExtraKeys,
            JsonValue::Object(extras),
            format!("not be provided. {record_name} doesn't support extra keys"),
        )
        .with_qualifier("extra keys")
    }

    /// Required fields absent from the input, reported together.
    pub fn missing_fields(record_name: &str, names: &[&str]) -> Self {
        Self::new(
            DecodeErrorKind::MissingFields,
            JsonValue::String(names.join(", ")),
            format!("be provided for record `{record_name}`"),
        )
        .with_qualifier("required fields")
    }

    /// A syntactically valid string that does not parse as `what`.
    pub fn invalid_literal(value: &JsonValue, what: &str) -> Self {
        Self::new(
            DecodeErrorKind::InvalidLiteral,
            value.clone(),
            format!("be a valid {what}"),
        )
    }

    /// A decoded value failed a constraint.
    pub fn constraint(value: JsonValue, expectation: impl Into<String>) -> Self {
        Self::new(DecodeErrorKind::ConstraintViolation, value, expectation)
    }

    /// A failure raised by user code (custom decoders, hooks, model conversions).
    pub fn custom(value: JsonValue, expectation: impl Into<String>) -> Self {
        Self::new(DecodeErrorKind::Custom, value, expectation)
    }

    /// The failure classification.
    pub fn kind(&self) -> DecodeErrorKind {
        self.kind
    }

    /// The offending value.
    pub fn value(&self) -> &JsonValue {
        &self.value
    }

    /// What the value was expected to do, e.g. "be of type `int`".
    pub fn expectation(&self) -> &str {
        &self.expectation
    }

    /// Optional qualifier describing the value (e.g. "required fields").
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Structural path to the offending value.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mutable path, used when a layer rewrites its own segment.
    pub fn path_mut(&mut self) -> &mut Path {
        &mut self.path
    }

    /// Prepend a `[index]` segment.
    pub fn add_index(mut self, index: usize) -> Self {
        self.path.prepend(PathSegment::Index(index));
        self
    }

    /// Prepend a `['key']` segment.
    pub fn add_key(mut self, key: &str) -> Self {
        self.path.prepend(PathSegment::Key(key.to_string()));
        self
    }

    /// Prepend a `.attr` segment.
    pub fn add_attr(mut self, attr: &str) -> Self {
        self.path.prepend(PathSegment::Attr(attr.to_string()));
        self
    }
}

/// Adds one path segment to a failing decode result.
pub trait ResultExt<T> {
    /// Wrap a failure with a sequence position.
    fn at_index(self, index: usize) -> Result<T, DecodeError>;
    /// Wrap a failure with a mapping key.
    fn at_key(self, key: &str) -> Result<T, DecodeError>;
    /// Wrap a failure with a record field.
    fn at_attr(self, attr: &str) -> Result<T, DecodeError>;
}

impl<T> ResultExt<T> for Result<T, DecodeError> {
    fn at_index(self, index: usize) -> Result<T, DecodeError> {
        self.map_err(|e| e.add_index(index))
    }

    fn at_key(self, key: &str) -> Result<T, DecodeError> {
        self.map_err(|e| e.add_key(key))
    }

    fn at_attr(self, attr: &str) -> Result<T, DecodeError> {
        self.map_err(|e| e.add_attr(attr))
    }
}

/// Errors raised while sealing a record type.
///
/// These describe mistakes in the declaration itself and are surfaced
/// immediately by [`crate::RecordBuilder::build`]. Callers should treat them
/// as programming errors, not input errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    /// Two fields share a canonical name or a wire key.
    #[error("record `{record}` declares the key `{key}` more than once")]
    DuplicateKey {
        /// Record being declared.
        record: String,
        /// The colliding name or wire key.
        key: String,
    },

    /// A second custom decoder was registered for a field.
    #[error("record `{record}`: field `{field}` already has a custom decoder")]
    DuplicateDecoder {
        /// Record being declared.
        record: String,
        /// Field with two decoders.
        field: String,
    },

    /// A second custom encoder was registered for a field.
    #[error("record `{record}`: field `{field}` already has a custom encoder")]
    DuplicateEncoder {
        /// Record being declared.
        record: String,
        /// Field with two encoders.
        field: String,
    },

    /// A decoder or encoder names a field the record does not have.
    #[error("record `{record}`: cannot register a {what} for unknown field `{field}`")]
    UnknownField {
        /// Record being declared.
        record: String,
        /// The unknown field name.
        field: String,
        /// "decoder" or "encoder".
        what: &'static str,
    },

    /// A field alias forwards to a field that does not exist.
    #[error("record `{record}`: alias `{alias}` refers to unknown field `{target}`")]
    AliasTargetMissing {
        /// Record being declared.
        record: String,
        /// Alias name.
        alias: String,
        /// Missing canonical field.
        target: String,
    },

    /// A field alias reuses a field's wire key or another alias name.
    #[error("record `{record}`: alias `{alias}` collides with an existing wire key")]
    AliasCollision {
        /// Record being declared.
        record: String,
        /// Alias name.
        alias: String,
    },

    /// Two alternatives of a sum decode from the same JSON type.
    #[error("record `{record}`, field `{field}`: overlapping outer types in sum `{ty}` are unsupported")]
    OverlappingSum {
        /// Record being declared.
        record: String,
        /// Field whose descriptor contains the sum.
        field: String,
        /// Rendered sum descriptor.
        ty: String,
    },

    /// `any` was used as a sum alternative; it overlaps every other alternative.
    #[error("record `{record}`, field `{field}`: `any` cannot be a sum alternative in `{ty}`")]
    AnyInSum {
        /// Record being declared.
        record: String,
        /// Field whose descriptor contains the sum.
        field: String,
        /// Rendered sum descriptor.
        ty: String,
    },

    /// A literal set is empty or mixes JSON types.
    #[error("record `{record}`, field `{field}`: literal values must be non-empty and share one JSON type, got `{ty}`")]
    InvalidLiteralSet {
        /// Record being declared.
        record: String,
        /// Field whose descriptor contains the literal set.
        field: String,
        /// Rendered literal descriptor.
        ty: String,
    },

    /// A map's key descriptor does not decode from a JSON string.
    #[error("record `{record}`, field `{field}`: map keys must be strings, got `{ty}`")]
    NonStringMapKey {
        /// Record being declared.
        record: String,
        /// Field whose descriptor contains the map.
        field: String,
        /// Rendered key descriptor.
        ty: String,
    },

    /// A constraint cannot apply to its base descriptor.
    #[error("record `{record}`, field `{field}`: constraint `{constraint}` does not apply to `{ty}`")]
    InapplicableConstraint {
        /// Record being declared.
        record: String,
        /// Field carrying the constraint.
        field: String,
        /// Rendered constraint.
        constraint: String,
        /// Rendered base descriptor.
        ty: String,
    },

    /// A regular expression failed to compile.
    #[error("invalid regular expression `{pattern}`: {reason}")]
    InvalidRegex {
        /// The pattern source.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// The discriminant field is missing or has no fixed literal default.
    #[error("record `{record}`: discriminant `{field}` must be a literal-typed field with a fixed default")]
    InvalidDiscriminant {
        /// Record being declared.
        record: String,
        /// Discriminant field name.
        field: String,
    },
}

/// Top-level error type for callers that want a single error.
#[derive(Error, Debug)]
pub enum ClayError {
    /// Input failed to decode.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A record declaration was invalid.
    #[error("declaration error: {0}")]
    Declaration(#[from] DeclarationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clay_error_wraps_both_failure_classes() {
        fn declare() -> Result<(), ClayError> {
            let invalid: Result<(), DeclarationError> = Err(DeclarationError::InvalidRegex {
                pattern: "(".into(),
                reason: "unclosed group".into(),
            });
            invalid?;
            Ok(())
        }
        let err = declare().unwrap_err();
        assert!(matches!(err, ClayError::Declaration(_)));
        assert!(err.to_string().starts_with("declaration error: "));

        let err = ClayError::from(DecodeError::wrong_type("int", &json!(true)));
        assert!(matches!(err, ClayError::Decode(_)));
    }

    #[test]
    fn test_path_renders_outer_to_inner() {
        let err = DecodeError::wrong_type("int", &json!("bad"))
            .add_attr("n")
            .add_index(0)
            .add_attr("items");
        assert_eq!(err.path().to_string(), ".items[0].n");
    }

    #[test]
    fn test_key_segment_is_quoted() {
        let err = DecodeError::wrong_type("int", &json!(true)).add_key("agent");
        assert_eq!(err.path().to_string(), "['agent']");
    }

    #[test]
    fn test_key_segment_escapes_quotes_and_backslashes() {
        let render = |key: &str| Path::from_iter([PathSegment::Key(key.to_string())]).to_string();
        assert_eq!(render("it's"), "[\"it's\"]");
        assert_eq!(render("say \"hi\""), "['say \"hi\"']");
        assert_eq!(render("both ' and \""), "['both \\' and \"']");
        assert_eq!(render("C:\\dir"), "['C:\\\\dir']");
        assert_eq!(render("line\nbreak"), "['line\\nbreak']");
    }

    #[test]
    fn test_display_without_qualifier() {
        let err = DecodeError::wrong_type("int", &json!("bad")).add_attr("n");
        assert_eq!(
            err.to_string(),
            "Expected `\"bad\"` to be of type `int`\nPath: .n"
        );
    }

    #[test]
    fn test_display_with_qualifier() {
        let err = DecodeError::missing_fields("Step", &["a", "b"]);
        let display = err.to_string();
        assert!(display.starts_with("Expected required fields `\"a, b\"`"));
        assert!(display.contains("be provided for record `Step`"));
        assert_eq!(err.kind(), DecodeErrorKind::MissingFields);
    }

    #[test]
    fn test_result_ext_adds_exactly_one_segment() {
        let result: Result<(), DecodeError> = Err(DecodeError::custom(json!(1), "be odd"));
        let err = result.at_key("k").at_index(3).unwrap_err();
        assert_eq!(err.path().len(), 2);
        assert_eq!(err.path().to_string(), "[3]['k']");
    }

    #[test]
    fn test_empty_path() {
        let err = DecodeError::custom(json!(null), "be set");
        assert!(err.path().is_empty());
        assert!(err.to_string().ends_with("Path: "));
    }
}
