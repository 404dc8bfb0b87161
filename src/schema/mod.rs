//! Avro schema types and writer/reader field mapping.
//!
//! This module defines the schema object model used by the decoder and the
//! identity-keyed field-map cache that reconciles writer and reader schemas.

mod field_map;
mod types;

pub use field_map::{FieldMap, FieldMapper};
pub use types::*;
