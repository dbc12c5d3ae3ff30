//! # Documents
//!
//! Loads JSON and YAML text into wire values and decodes them into record
//! instances or typed models. The format of a file is chosen by its
//! extension (`.yaml`/`.yml` for YAML, anything else for JSON).
//!
//! YAML uses only its JSON-compatible subset: tags are dropped, and
//! scalar mapping keys are stringified.

use std::path::Path;

use clay_core::{Model, Record, RecordType, WireValue};
use serde_json::Number;

use crate::validate::SchemaValidationError;

/// Text format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// JSON text.
    Json,
    /// YAML 1.2 text.
    Yaml,
}

impl DocumentFormat {
    /// Choose a format from a file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }
}

/// Parse document text. `source` names the document in errors.
///
/// # Errors
///
/// Returns `SchemaValidationError::DocumentLoadError` if the text does not
/// parse or uses YAML features with no JSON equivalent.
pub fn parse_document(
    source: &str,
    text: &str,
    format: DocumentFormat,
) -> Result<WireValue, SchemaValidationError> {
    let load_error = |reason: String| SchemaValidationError::DocumentLoadError {
        path: source.to_string(),
        reason,
    };
    match format {
        DocumentFormat::Json => {
            serde_json::from_str(text).map_err(|e| load_error(format!("invalid JSON: {e}")))
        }
        DocumentFormat::Yaml => {
            let yaml: serde_yaml::Value = serde_yaml::from_str(text)
                .map_err(|e| load_error(format!("invalid YAML: {e}")))?;
            yaml_to_wire(&yaml)
                .map_err(|e| load_error(format!("YAML-to-JSON conversion failed: {e}")))
        }
    }
}

/// Read and parse a document file.
///
/// # Errors
///
/// Returns `SchemaValidationError::DocumentLoadError` if the file cannot be
/// read or parsed.
pub fn load_document(path: &Path) -> Result<WireValue, SchemaValidationError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| SchemaValidationError::DocumentLoadError {
            path: path.display().to_string(),
            reason: format!("cannot read file: {e}"),
        })?;
    parse_document(
        &path.display().to_string(),
        &content,
        DocumentFormat::from_path(path),
    )
}

/// Read a document file and decode it into an instance of `rt`.
///
/// # Errors
///
/// Returns `DocumentLoadError` for unreadable files and
/// `SchemaValidationError::Decode` if the document does not decode.
pub fn decode_document(
    rt: &'static RecordType,
    path: &Path,
) -> Result<Record, SchemaValidationError> {
    let document = load_document(path)?;
    tracing::debug!(record = rt.name(), path = %path.display(), "decoding document");
    Ok(rt.decode(&document)?)
}

/// Read a document file and load it as a typed model.
///
/// # Errors
///
/// As [`decode_document`].
pub fn load_model<M: Model>(path: &Path) -> Result<M, SchemaValidationError> {
    let document = load_document(path)?;
    Ok(M::load(&document)?)
}

/// Convert a `serde_yaml::Value` to a wire value.
pub fn yaml_to_wire(yaml: &serde_yaml::Value) -> Result<WireValue, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(WireValue::Null),
        serde_yaml::Value::Bool(b) => Ok(WireValue::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(WireValue::Number(Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(WireValue::Number(Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                Number::from_f64(f)
                    .map(WireValue::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(WireValue::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_wire)
            .collect::<Result<Vec<_>, _>>()
            .map(WireValue::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                object.insert(key, yaml_to_wire(v)?);
            }
            Ok(WireValue::Object(object))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_wire(&tagged.value),
    }
}
