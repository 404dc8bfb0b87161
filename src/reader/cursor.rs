//! Cursor over encoded Avro values.
//!
//! The specific decoder never touches bytes directly: it asks a [`Cursor`]
//! to read or skip one value of a given writer schema. Each decode call owns
//! its cursor, so cursors need not be thread-safe.

use crate::error::DecodeError;
use crate::schema::AvroSchema;

use super::decode::{decode_value_reusing, skip_value, AvroValue};

/// Source of encoded values consumed in writer-schema order.
pub trait Cursor {
    /// Decode one value of `schema`.
    ///
    /// `reuse` is the previous value of the destination slot, offered so its
    /// allocation can be recycled. Implementations may ignore it.
    fn read_value(
        &mut self,
        schema: &AvroSchema,
        reuse: Option<AvroValue>,
    ) -> Result<AvroValue, DecodeError>;

    /// Advance past one value of `schema` without materializing it.
    fn skip_value(&mut self, schema: &AvroSchema) -> Result<(), DecodeError>;
}

impl<C: Cursor + ?Sized> Cursor for &mut C {
    fn read_value(
        &mut self,
        schema: &AvroSchema,
        reuse: Option<AvroValue>,
    ) -> Result<AvroValue, DecodeError> {
        (**self).read_value(schema, reuse)
    }

    fn skip_value(&mut self, schema: &AvroSchema) -> Result<(), DecodeError> {
        (**self).skip_value(schema)
    }
}

/// Cursor over an in-memory Avro binary buffer.
#[derive(Debug, Clone)]
pub struct BinaryCursor<'a> {
    data: &'a [u8],
    len: usize,
}

impl<'a> BinaryCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            len: data.len(),
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.len - self.data.len()
    }

    /// Unconsumed bytes.
    pub fn remaining(&self) -> &'a [u8] {
        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Cursor for BinaryCursor<'_> {
    fn read_value(
        &mut self,
        schema: &AvroSchema,
        reuse: Option<AvroValue>,
    ) -> Result<AvroValue, DecodeError> {
        decode_value_reusing(&mut self.data, schema, reuse)
    }

    fn skip_value(&mut self, schema: &AvroSchema) -> Result<(), DecodeError> {
        skip_value(&mut self.data, schema)
    }
}
