//! # Typed Models
//!
//! Bridges the dynamic [`Record`] to statically typed structs. A type
//! implements [`Model`] by naming its record type and converting to and
//! from an instance of it; decoding, validation, and error paths come from
//! the record type.
//!
//! Conversion failures that name a field by its canonical attribute (for
//! example `record.take("if_condition")?.into_string().at_attr("if_condition")`)
//! are reported under the field's wire rename.

use serde_json::Value as JsonValue;

use crate::error::DecodeError;
use crate::record::{Record, RecordType};

/// A statically typed view of a record type.
pub trait Model: Sized {
    /// The record type instances decode from.
    fn record_type() -> &'static RecordType;

    /// Convert a decoded record.
    ///
    /// # Errors
    ///
    /// Returns a `DecodeError` if a field value cannot be converted.
    fn from_record(record: Record) -> Result<Self, DecodeError>;

    /// Convert back into a record (usually via [`RecordType::construct`]).
    ///
    /// # Errors
    ///
    /// Returns a `DecodeError` if the values do not satisfy the record type.
    fn to_record(&self) -> Result<Record, DecodeError>;

    /// Decode a wire value.
    ///
    /// # Errors
    ///
    /// Returns a `DecodeError` with the path to the offending value.
    fn load(wire: &JsonValue) -> Result<Self, DecodeError> {
        let rt = Self::record_type();
        let record = rt.decode(wire)?;
        Self::from_record(record).map_err(|e| rt.rename_trailing_attr(e))
    }

    /// Encode to a wire value.
    ///
    /// # Errors
    ///
    /// Returns a `DecodeError` if [`Model::to_record`] fails.
    fn dump(&self) -> Result<JsonValue, DecodeError> {
        self.to_record().map(|record| crate::encode::encode_record(&record))
    }
}
