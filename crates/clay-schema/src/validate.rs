//! # Schema Validation
//!
//! Validates wire documents against a compiled JSON Schema (Draft 2020-12),
//! typically one generated from a record type by [`crate::schema_for`].
//!
//! Decoding is the authority on whether a document is accepted; the
//! compiled schema is what editors and external tooling see. Validating the
//! same document both ways is how the two are kept in agreement.
//!
//! ## Schema Resolution
//!
//! Generated schemas are self-contained: every `$ref` points into the
//! document's own `$defs`. The validator installs a retriever that resolves
//! only the document's own `$id` and refuses everything else, so validation
//! never touches the network.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use clay_core::{DecodeError, RecordType};
use jsonschema::{Retrieve, Uri, Validator};
use serde_json::Value;
use thiserror::Error;

use crate::document::load_document;
use crate::generate::{schema_for_with, SchemaOptions};

/// Retriever that serves registered schemas from memory and nothing else.
struct LocalSchemaRetriever {
    schemas_by_uri: HashMap<String, Value>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        match self.schemas_by_uri.get(uri_str) {
            Some(value) => Ok(value.clone()),
            None => Err(format!("refusing to retrieve external schema `{uri_str}`").into()),
        }
    }
}

/// Error during document loading or schema validation.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The document did not conform to the schema.
    #[error("validation failed against schema '{schema_name}':\n{violations}")]
    ValidationFailed {
        /// Name of the schema that was validated against.
        schema_name: String,
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },

    /// The document file could not be loaded or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoadError {
        /// Path to the document that failed to load.
        path: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// The compiled validator could not be built (e.g., invalid schema).
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuildError {
        /// Schema name.
        schema_name: String,
        /// Reason the validator could not be built.
        reason: String,
    },

    /// The document loaded but did not decode into the record type.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// A single validation violation with structured context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A compiled schema validator backed by the `jsonschema` crate.
///
/// ## Thread Safety
///
/// `SchemaValidator` is `Send + Sync`; compile once and share.
pub struct SchemaValidator {
    schema_name: String,
    schema: Value,
    validator: Validator,
}

impl SchemaValidator {
    /// Compile the generated schema of a record type.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::ValidatorBuildError` if the generated
    /// schema does not compile.
    pub fn for_record(rt: &'static RecordType) -> Result<Self, SchemaValidationError> {
        let schema = schema_for_with(rt, &SchemaOptions::draft_2020_12());
        Self::from_schema(rt.name(), schema)
    }

    /// Compile an arbitrary schema document.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::ValidatorBuildError` if the schema does
    /// not compile or refers to an external document.
    pub fn from_schema(
        schema_name: impl Into<String>,
        schema: Value,
    ) -> Result<Self, SchemaValidationError> {
        let schema_name = schema_name.into();

        let mut schemas_by_uri = HashMap::new();
        if let Some(id) = schema.get("$id").and_then(|v| v.as_str()) {
            schemas_by_uri.insert(id.to_string(), schema.clone());
        }

        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        opts.with_retriever(LocalSchemaRetriever { schemas_by_uri });

        let validator = opts.build(&schema).map_err(|e| {
            SchemaValidationError::ValidatorBuildError {
                schema_name: schema_name.clone(),
                reason: e.to_string(),
            }
        })?;

        tracing::debug!(schema = %schema_name, "compiled schema validator");

        Ok(Self {
            schema_name,
            schema,
            validator,
        })
    }

    /// Name the validator reports violations under.
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// The schema document this validator was compiled from.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Returns true if `instance` conforms.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Validate a parsed wire document.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::ValidationFailed` with structured
    /// violation details if the document is invalid.
    pub fn validate_document(&self, instance: &Value) -> Result<(), SchemaValidationError> {
        let errors: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::ValidationFailed {
                schema_name: self.schema_name.clone(),
                violations: ValidationViolations { violations: errors },
            })
        }
    }

    /// Load a JSON or YAML document (by extension) and validate it.
    ///
    /// Returns the loaded wire value on success.
    ///
    /// # Errors
    ///
    /// Returns `SchemaValidationError::DocumentLoadError` if the file cannot
    /// be read or parsed, or `ValidationFailed` naming the file if it does
    /// not conform.
    pub fn validate_file(&self, document_path: &Path) -> Result<Value, SchemaValidationError> {
        let document = load_document(document_path)?;
        self.validate_document(&document).map_err(|e| match e {
            SchemaValidationError::ValidationFailed { violations, .. } => {
                SchemaValidationError::ValidationFailed {
                    schema_name: format!("{} ({})", self.schema_name, document_path.display()),
                    violations,
                }
            }
            other => other,
        })?;
        Ok(document)
    }
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema_name", &self.schema_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clay_core::{Field, Ty, Value};
    use serde_json::json;
    use std::sync::LazyLock;

    static MODULE: LazyLock<RecordType> = LazyLock::new(|| {
        RecordType::builder("Module")
            .field(Field::new("module_id", Ty::non_empty(Ty::Str)))
            .field(Field::new("kind", Ty::literal(["legal", "technical"])))
            .field(
                Field::new("depends_on", Ty::list(Ty::Str))
                    .default_with(|| Value::List(vec![])),
            )
            .build()
            .unwrap()
    });

    #[test]
    fn test_validate_valid_document() {
        let validator = SchemaValidator::for_record(&MODULE).unwrap();
        validator
            .validate_document(&json!({"module_id": "org.test", "kind": "legal"}))
            .unwrap();
    }

    #[test]
    fn test_validate_missing_required_field() {
        let validator = SchemaValidator::for_record(&MODULE).unwrap();
        let err = validator
            .validate_document(&json!({"module_id": "org.test"}))
            .unwrap_err();
        match &err {
            SchemaValidationError::ValidationFailed { violations, .. } => {
                let messages: Vec<&str> =
                    violations.violations().iter().map(|v| v.message.as_str()).collect();
                assert!(
                    messages.iter().any(|m| m.contains("kind")),
                    "Expected violation mentioning 'kind', got: {messages:?}"
                );
            }
            other => panic!("Expected ValidationFailed, got: {other}"),
        }
    }

    #[test]
    fn test_validate_additional_properties_rejected() {
        let validator = SchemaValidator::for_record(&MODULE).unwrap();
        let doc = json!({"module_id": "org.test", "kind": "legal", "extra": true});
        assert!(!validator.is_valid(&doc));
    }

    #[test]
    fn test_external_ref_is_not_fetched() {
        let schema = json!({"$ref": "https://example.invalid/other.schema.json"});
        let err = SchemaValidator::from_schema("external", schema).unwrap_err();
        assert!(
            matches!(err, SchemaValidationError::ValidatorBuildError { .. }),
            "Expected ValidatorBuildError, got: {err}"
        );
    }

    #[test]
    fn test_violation_display_format() {
        let v = Violation {
            instance_path: "/depends_on/0".to_string(),
            schema_path: "/properties/depends_on/items/type".to_string(),
            message: r#"1 is not of type "string""#.to_string(),
        };
        let display = v.to_string();
        assert!(display.contains("/depends_on/0"));
        assert!(display.contains("is not of type"));
    }

    #[test]
    fn test_violation_display_root() {
        let v = Violation {
            instance_path: String::new(),
            schema_path: "/required".to_string(),
            message: r#""kind" is a required property"#.to_string(),
        };
        assert!(v.to_string().contains("(root)"));
    }
}
