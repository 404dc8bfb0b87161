//! Specific (generated) record decoding.
//!
//! Registered Rust types stand in for Avro record schemas. Values arrive in
//! writer-schema order and land in the reader's integer slots.

pub mod decoder;
pub mod record;
pub mod resolver;

pub use decoder::{DecoderConfig, RecordAccess, SpecificDecoder};
pub use record::{Generated, SlotValue, SpecificRecord};
pub use resolver::{TargetType, TypeRegistry, TypeResolver};
