//! Decoding writer-ordered values into generated records.
//!
//! [`SpecificDecoder`] resolves the target type from the writer schema, maps
//! writer fields onto reader slots, and walks the writer fields in wire
//! order, decoding matched fields and skipping the rest.

use std::any::TypeId;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{SchemaError, SpecificError, UnsupportedOperationError};
use crate::reader::{AvroValue, Cursor};
use crate::schema::{AvroSchema, FieldMapper, RecordSchema};

use super::record::{Generated, SpecificRecord};
use super::resolver::{TypeRegistry, TypeResolver};

/// Configuration for [`SpecificDecoder`].
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Namespace prepended to the writer's simple name during resolution
    /// (default: None = use the writer's full name).
    pub namespace: Option<String>,
    /// Reuse a caller-supplied instance of the right type (default: true).
    pub reuse_instances: bool,
    /// Pass each slot's previous value to the cursor as a reuse hint
    /// (default: true).
    pub reuse_values: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            reuse_instances: true,
            reuse_values: true,
        }
    }
}

impl DecoderConfig {
    /// Create a new DecoderConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve types as `"{namespace}.{simple name}"`.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set whether a caller-supplied instance of the resolved type is reused.
    pub fn with_reuse_instances(mut self, reuse: bool) -> Self {
        self.reuse_instances = reuse;
        self
    }

    /// Set whether previous slot values are handed to the cursor for reuse.
    pub fn with_reuse_values(mut self, reuse: bool) -> Self {
        self.reuse_values = reuse;
        self
    }
}

/// Structural operations a generic record model would support.
///
/// Generated records have a fixed layout, so the specific decoder rejects
/// every one of these.
pub trait RecordAccess {
    fn add_field(
        &self,
        record: &mut dyn SpecificRecord,
        name: &str,
        value: AvroValue,
    ) -> Result<(), UnsupportedOperationError>;

    fn get_field(
        &self,
        record: &dyn SpecificRecord,
        name: &str,
    ) -> Result<Option<AvroValue>, UnsupportedOperationError>;

    fn remove_field(
        &self,
        record: &mut dyn SpecificRecord,
        name: &str,
    ) -> Result<(), UnsupportedOperationError>;

    /// Construct an empty record from a schema alone.
    fn new_record(
        &self,
        schema: &RecordSchema,
    ) -> Result<Box<dyn SpecificRecord>, UnsupportedOperationError>;
}

/// Decoder for generated record types.
///
/// Holds no per-call state; share one instance across threads, each with its
/// own cursor.
#[derive(Debug)]
pub struct SpecificDecoder {
    resolver: TypeResolver,
    mapper: FieldMapper,
    config: DecoderConfig,
}

impl SpecificDecoder {
    /// Create a new SpecificDecoder over `registry` with default configuration.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_config(registry, DecoderConfig::default())
    }

    /// Create a new SpecificDecoder with custom configuration.
    pub fn with_config(registry: Arc<TypeRegistry>, config: DecoderConfig) -> Self {
        Self {
            resolver: TypeResolver::with_namespace(registry, config.namespace.clone()),
            mapper: FieldMapper::new(),
            config,
        }
    }

    /// The configuration this decoder was built with.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    pub fn field_mapper(&self) -> &FieldMapper {
        &self.mapper
    }

    /// Decode one record written with `writer` from `cursor`.
    ///
    /// `existing` is reused when it is an instance of the resolved type. The
    /// target's own schema is the reader schema; a different `reader` is
    /// ignored. On error the partially filled record is dropped.
    pub fn decode<C: Cursor + ?Sized>(
        &self,
        existing: Option<Box<dyn SpecificRecord>>,
        writer: &RecordSchema,
        reader: Option<&RecordSchema>,
        cursor: &mut C,
    ) -> Result<Box<dyn SpecificRecord>, SpecificError> {
        let target = self.resolver.resolve_schema(writer)?;

        let mut record = match existing {
            Some(record) if self.config.reuse_instances && target.is_instance(record.as_ref()) => {
                record
            }
            _ => target.construct(),
        };

        let schema = Arc::clone(record.schema());
        if let Some(reader) = reader {
            if !reader.same_instance(&schema) {
                debug!(
                    requested = %reader.fullname(),
                    requested_id = %reader.id(),
                    actual = %schema.fullname(),
                    actual_id = %schema.id(),
                    "Reader schema overridden by target type schema"
                );
            }
        }

        let map = self.mapper.get_map(&schema, writer);

        for (field, slot) in writer.fields().iter().zip(map.iter()) {
            match slot {
                None => {
                    trace!(field = %field.name, "Skipping writer field");
                    cursor.skip_value(&field.schema)?;
                }
                Some(slot) => {
                    if let AvroSchema::Record(nested) = &field.schema {
                        if record.is_record_slot(slot) {
                            trace!(
                                field = %field.name,
                                nested = %nested.fullname(),
                                "Decoding nested record"
                            );
                            let previous = if self.config.reuse_values {
                                record.take_record(slot)
                            } else {
                                None
                            };
                            let reader = schema
                                .fields()
                                .get(slot)
                                .and_then(|f| f.schema.as_record())
                                .map(Arc::as_ref);
                            let value = self.decode(previous, nested, reader, cursor)?;
                            record.set_record(slot, value)?;
                            continue;
                        }
                    }
                    let reuse = if self.config.reuse_values {
                        record.take_slot(slot)
                    } else {
                        None
                    };
                    let value = cursor.read_value(&field.schema, reuse)?;
                    record.set_slot(slot, Some(value))?;
                }
            }
        }

        if map.matched_count() < schema.fields().len() {
            for &slot in map.unmatched_slots() {
                trace!(slot, field = %schema.fields()[slot].name, "Clearing reader slot");
                record.set_slot(slot, None)?;
            }
        }

        Ok(record)
    }

    /// Decode one record whose writer schema may be of any kind.
    ///
    /// Fails with [`SchemaError::NotARecord`] before reading anything if
    /// `writer` is not a record schema.
    pub fn decode_datum<C: Cursor + ?Sized>(
        &self,
        existing: Option<Box<dyn SpecificRecord>>,
        writer: &AvroSchema,
        cursor: &mut C,
    ) -> Result<Box<dyn SpecificRecord>, SpecificError> {
        let record = writer
            .as_record()
            .ok_or_else(|| SchemaError::NotARecord(writer.kind().to_string()))?;
        self.decode(existing, record, None, cursor)
    }

    /// Decode into a known generated type.
    ///
    /// Fails with [`SpecificError::UnexpectedType`] before reading anything
    /// if the writer schema resolves to a different type.
    pub fn decode_into<T: Generated, C: Cursor + ?Sized>(
        &self,
        existing: Option<T>,
        writer: &RecordSchema,
        cursor: &mut C,
    ) -> Result<T, SpecificError> {
        let expected = T::class_schema();
        let target = self.resolver.resolve_schema(writer)?;
        if target.type_id() != TypeId::of::<T>() {
            return Err(unexpected::<T>(target.rust_type()));
        }

        let existing = existing.map(|record| Box::new(record) as Box<dyn SpecificRecord>);
        let record = self.decode(existing, writer, Some(expected.as_ref()), cursor)?;
        record
            .into_any()
            .downcast::<T>()
            .map(|record| *record)
            .map_err(|_| unexpected::<T>(target.rust_type()))
    }
}

fn unexpected<T: Generated>(actual: &str) -> SpecificError {
    SpecificError::UnexpectedType {
        expected: std::any::type_name::<T>().to_string(),
        actual: actual.to_string(),
    }
}

impl RecordAccess for SpecificDecoder {
    fn add_field(
        &self,
        _record: &mut dyn SpecificRecord,
        _name: &str,
        _value: AvroValue,
    ) -> Result<(), UnsupportedOperationError> {
        Err(UnsupportedOperationError::new("add_field"))
    }

    fn get_field(
        &self,
        _record: &dyn SpecificRecord,
        _name: &str,
    ) -> Result<Option<AvroValue>, UnsupportedOperationError> {
        Err(UnsupportedOperationError::new("get_field"))
    }

    fn remove_field(
        &self,
        _record: &mut dyn SpecificRecord,
        _name: &str,
    ) -> Result<(), UnsupportedOperationError> {
        Err(UnsupportedOperationError::new("remove_field"))
    }

    fn new_record(
        &self,
        _schema: &RecordSchema,
    ) -> Result<Box<dyn SpecificRecord>, UnsupportedOperationError> {
        Err(UnsupportedOperationError::new("new_record"))
    }
}
