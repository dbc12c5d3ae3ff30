//! # clay-schema: Schema Generation & Document Validation
//!
//! Derives JSON Schema documents from clay record types and validates wire
//! documents against them.
//!
//! ## Schema Generation (`generate`)
//!
//! The [`generate`] module maps every type descriptor to a schema fragment
//! and materializes each referenced record type once under `$defs`. Key
//! function:
//!
//! - [`schema_for`] returns the complete Draft 2020-12 document for a record type,
//!   describing exactly the wire shapes its decoder accepts (wire names,
//!   decoder input shapes, aliases, defaults, required fields, extras
//!   policy).
//!
//! ## Documents (`document`) and Validation (`validate`)
//!
//! [`document`] loads JSON or YAML files into wire values and decodes them
//! into record instances. [`validate`] compiles a generated schema with the
//! `jsonschema` crate and reports structured violations, so documents can
//! be checked the way external tooling sees them.
//!
//! ## Crate Policy
//!
//! - Depends only on `clay-core` internally.
//! - Generated schemas are self-contained; validation never fetches remote
//!   documents.
//! - Decoding stays the authority on acceptance. A document the decoder
//!   accepts must also validate against the generated schema.

pub mod document;
pub mod generate;
pub mod validate;

pub use document::{
    decode_document, load_document, load_model, parse_document, yaml_to_wire, DocumentFormat,
};
pub use generate::{
    schema, schema_for, schema_for_with, SchemaGenerator, SchemaMap, SchemaOptions, DRAFT_2020_12,
    UUID_PATTERN,
};
pub use validate::{SchemaValidationError, SchemaValidator, ValidationViolations, Violation};
