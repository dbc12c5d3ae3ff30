//! # clay-core: Declarative Record Modeling Engine
//!
//! This crate is the engine every declarative record schema is built on.
//! Record types are declared once, with typed fields, and the engine then
//! decodes untyped JSON wire values into validated instances, encodes
//! instances back to wire values, and reports failures with an exact
//! structural path to the offending value.
//!
//! ## Key Design Principles
//!
//! 1. **Closed descriptor grammar.** [`Ty`] is a single enum covering every
//!    shape the engine understands (primitives, sums, literal sets,
//!    containers, constrained types, record references). Every dispatch over
//!    it is an exhaustive `match`; adding a shape forces every consumer to
//!    handle it.
//!
//! 2. **Exact-type decoding.** A boolean is never an integer and an integer
//!    is never a boolean. Sum alternatives are selected by the concrete JSON
//!    type of the input, never by trial decoding.
//!
//! 3. **Two-phase declaration.** [`RecordBuilder`] collects fields, aliases,
//!    decoders and encoders; [`RecordBuilder::build`] validates the whole
//!    declaration and seals an immutable [`RecordType`]. Declaration mistakes
//!    surface as [`DeclarationError`] before any input is decoded.
//!
//! 4. **Paths accumulate outward.** Every nesting layer (list index, map key,
//!    record field) prepends exactly one [`PathSegment`] to a failing
//!    [`DecodeError`], so `.items[0].n` reads outer-to-inner.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `clay-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Record types are immutable once sealed and are safe to share across
//!   threads (`Send + Sync`).

pub mod check;
pub mod constraint;
pub mod decode;
pub mod encode;
pub mod error;
pub mod model;
pub mod record;
pub mod ty;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use check::{check_constraints, validate};
pub use constraint::Constraint;
pub use decode::{decode, decode_record};
pub use encode::{encode, encode_record};
pub use error::{
    ClayError, DeclarationError, DecodeError, DecodeErrorKind, Path, PathSegment, ResultExt,
};
pub use model::Model;
pub use record::{
    AliasMode, Field, FieldAlias, FieldDecoder, FieldDefault, FieldEncoder, Record,
    RecordBuilder, RecordType,
};
pub use ty::{JsonType, Literal, RecordRef, Ty};
pub use value::{Pattern, Value};

/// The untyped JSON-shaped value exchanged at the system boundary.
pub type WireValue = serde_json::Value;

/// A JSON object on the wire.
pub type WireObject = serde_json::Map<String, serde_json::Value>;
