//! Error types for specific-record decoding

use thiserror::Error;

/// Errors that can occur while building schemas
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Invalid schema format
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    /// Two fields in one record share a name
    #[error("Duplicate field '{field}' in record '{record}'")]
    DuplicateField { record: String, field: String },
    /// A record schema was required
    #[error("Expected a record schema, found {0}")]
    NotARecord(String),
    /// A value does not conform to the schema it is written with
    #[error("Value does not match schema: {0}")]
    ValueMismatch(String),
}

/// Errors that can occur during decoding
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Invalid Avro data
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Unexpected end of data
    #[error("Unexpected end of file")]
    UnexpectedEof,
    /// Type mismatch
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    /// Invalid varint encoding
    #[error("Invalid varint encoding")]
    InvalidVarint,
    /// String is not valid UTF-8
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// A schema name with no registered target type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// No generated type was registered under this name
    #[error("No specific type registered for '{name}'")]
    UnknownType { name: String },
}

/// A structural-mutation operation that static target types cannot support.
///
/// Generated records fix their layout at construction, so adding, removing or
/// looking up fields by name (and constructing generic empty records) is an
/// integration error on this path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Operation not supported by specific records: {operation}")]
pub struct UnsupportedOperationError {
    /// Name of the rejected operation
    pub operation: &'static str,
}

impl UnsupportedOperationError {
    pub fn new(operation: &'static str) -> Self {
        Self { operation }
    }
}

/// Top-level error returned by the specific decoder
#[derive(Debug, Error)]
pub enum SpecificError {
    /// Type resolution failed
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Unsupported structural operation
    #[error(transparent)]
    Unsupported(#[from] UnsupportedOperationError),

    /// Malformed input, passed through from the cursor
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Schema error
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The writer schema resolved to a different type than the caller asked for
    #[error("Expected record type '{expected}', writer schema resolved to '{actual}'")]
    UnexpectedType { expected: String, actual: String },
}
