//! Schema-resolving decoder for generated Avro record types
//!
//! Records encoded against a writer schema are materialized into statically
//! typed Rust structs described by a (possibly different) reader schema.
//! Fields are matched by name and type, reordered, skipped or cleared as the
//! two schemas diverge, and the reconciliation is cached per schema pair.

pub mod encode;
pub mod error;
pub mod reader;
pub mod schema;
pub mod specific;

// Re-export main types
pub use encode::{encode_record, encode_value};
pub use error::{
    DecodeError, ResolutionError, SchemaError, SpecificError, UnsupportedOperationError,
};
pub use reader::{AvroValue, BinaryCursor, Cursor};
pub use schema::{
    AvroSchema, EnumSchema, FieldMap, FieldMapper, FieldSchema, FixedSchema, RecordSchema,
    SchemaId, SchemaKind,
};
pub use specific::{
    DecoderConfig, Generated, RecordAccess, SlotValue, SpecificDecoder, SpecificRecord,
    TargetType, TypeRegistry, TypeResolver,
};
