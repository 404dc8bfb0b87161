//! Avro binary decoder for primitive and complex types.
//!
//! Follows the Avro binary encoding:
//! - ints and longs are zigzag varints
//! - floats and doubles are little-endian IEEE 754
//! - bytes and strings are length-prefixed
//! - arrays and maps are sequences of counted blocks ending with a zero count
//!
//! Every decoder has a matching skip function that advances past a value
//! without materializing it. The `*_reusing` variants recycle the allocation
//! of a previously decoded value when the caller provides one.

use crate::error::DecodeError;
use crate::schema::{AvroSchema, EnumSchema, RecordSchema};

use super::varint::{decode_zigzag, skip_varint};

/// Represents a decoded Avro value.
#[derive(Debug, Clone, PartialEq)]
pub enum AvroValue {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// Byte array
    Bytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Record with named fields, in writer order
    Record(Vec<(String, AvroValue)>),
    /// Enum variant (index and symbol name)
    Enum(i32, String),
    /// Array of values
    Array(Vec<AvroValue>),
    /// Map with string keys
    Map(Vec<(String, AvroValue)>),
    /// Union variant (index and value)
    Union(i32, Box<AvroValue>),
    /// Fixed-size byte array
    Fixed(Vec<u8>),
}

impl AvroValue {
    /// Short name of the value's variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            AvroValue::Null => "null",
            AvroValue::Boolean(_) => "boolean",
            AvroValue::Int(_) => "int",
            AvroValue::Long(_) => "long",
            AvroValue::Float(_) => "float",
            AvroValue::Double(_) => "double",
            AvroValue::Bytes(_) => "bytes",
            AvroValue::String(_) => "string",
            AvroValue::Record(_) => "record",
            AvroValue::Enum(..) => "enum",
            AvroValue::Array(_) => "array",
            AvroValue::Map(_) => "map",
            AvroValue::Union(..) => "union",
            AvroValue::Fixed(_) => "fixed",
        }
    }
}

// ============================================================================
// Primitive Decoders
// ============================================================================

/// Decode a boolean value.
///
/// Avro booleans are a single byte: 0x00 for false, 0x01 for true.
#[inline]
pub fn decode_boolean(data: &mut &[u8]) -> Result<bool, DecodeError> {
    let (&byte, rest) = data.split_first().ok_or(DecodeError::UnexpectedEof)?;
    *data = rest;
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(DecodeError::InvalidData(format!(
            "Invalid boolean value: {}, expected 0 or 1",
            byte
        ))),
    }
}

/// Decode a 32-bit signed integer (zigzag varint encoded).
#[inline]
pub fn decode_int(data: &mut &[u8]) -> Result<i32, DecodeError> {
    let long = decode_long(data)?;
    i32::try_from(long).map_err(|_| {
        DecodeError::InvalidData(format!("Integer overflow: {} does not fit in i32", long))
    })
}

/// Decode a 64-bit signed integer (zigzag varint encoded).
#[inline]
pub fn decode_long(data: &mut &[u8]) -> Result<i64, DecodeError> {
    decode_zigzag(data)
}

/// Decode a 32-bit IEEE 754 floating-point number (little-endian).
#[inline]
pub fn decode_float(data: &mut &[u8]) -> Result<f32, DecodeError> {
    let bytes = take(data, 4)?;
    Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Decode a 64-bit IEEE 754 floating-point number (little-endian).
#[inline]
pub fn decode_double(data: &mut &[u8]) -> Result<f64, DecodeError> {
    let bytes = take(data, 8)?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    Ok(f64::from_le_bytes(buf))
}

/// Decode a length-prefixed byte slice without copying.
#[inline]
pub fn decode_bytes_ref<'a>(data: &mut &'a [u8]) -> Result<&'a [u8], DecodeError> {
    let len = decode_length(data)?;
    take(data, len)
}

/// Decode a byte array (length-prefixed).
#[inline]
pub fn decode_bytes(data: &mut &[u8]) -> Result<Vec<u8>, DecodeError> {
    Ok(decode_bytes_ref(data)?.to_vec())
}

/// Decode a UTF-8 string (length-prefixed).
#[inline]
pub fn decode_string(data: &mut &[u8]) -> Result<String, DecodeError> {
    let bytes = decode_bytes(data)?;
    String::from_utf8(bytes).map_err(DecodeError::from)
}

/// Decode a UTF-8 string without copying.
#[inline]
pub fn decode_string_ref<'a>(data: &mut &'a [u8]) -> Result<&'a str, DecodeError> {
    let bytes = decode_bytes_ref(data)?;
    std::str::from_utf8(bytes)
        .map_err(|e| DecodeError::InvalidData(format!("Invalid UTF-8: {}", e)))
}

/// Decode a fixed-size byte array.
#[inline]
pub fn decode_fixed(data: &mut &[u8], size: usize) -> Result<Vec<u8>, DecodeError> {
    Ok(take(data, size)?.to_vec())
}

fn take<'a>(data: &mut &'a [u8], len: usize) -> Result<&'a [u8], DecodeError> {
    if data.len() < len {
        return Err(DecodeError::UnexpectedEof);
    }
    let (head, rest) = data.split_at(len);
    *data = rest;
    Ok(head)
}

fn decode_length(data: &mut &[u8]) -> Result<usize, DecodeError> {
    let len = decode_long(data)?;
    usize::try_from(len)
        .map_err(|_| DecodeError::InvalidData(format!("Negative bytes length: {}", len)))
}

/// Read an index in `0..bound`, as used by enums and unions.
fn decode_index(data: &mut &[u8], bound: usize, what: &str) -> Result<usize, DecodeError> {
    let index = decode_int(data)?;
    match usize::try_from(index) {
        Ok(idx) if idx < bound => Ok(idx),
        _ => Err(DecodeError::InvalidData(format!(
            "{} index {} out of range (0..{})",
            what, index, bound
        ))),
    }
}

/// Read the item count of the next array/map block, discarding the byte size
/// prefix that accompanies negative counts. Returns 0 at the end marker.
fn decode_block_count(data: &mut &[u8]) -> Result<usize, DecodeError> {
    let count = decode_long(data)?;
    if count < 0 {
        let _byte_size = decode_long(data)?;
    }
    usize::try_from(count.unsigned_abs())
        .map_err(|_| DecodeError::InvalidData(format!("Block count {} too large", count)))
}

/// Upper bound on items of zero-width values (null, empty records) in one
/// array. Such items consume no input, so the input length cannot bound them.
pub const MAX_ZERO_WIDTH_ITEMS: usize = 1 << 20;

/// Smallest number of bytes a value of `schema` occupies on the wire.
///
/// Zero only for values that are always empty: `null`, zero-size fixed and
/// records made solely of such fields.
pub fn min_encoded_len(schema: &AvroSchema) -> usize {
    match schema {
        AvroSchema::Null => 0,
        AvroSchema::Float => 4,
        AvroSchema::Double => 8,
        AvroSchema::Fixed(fixed) => fixed.size,
        AvroSchema::Record(record) => record
            .fields()
            .iter()
            .map(|field| min_encoded_len(&field.schema))
            .fold(0, usize::saturating_add),
        // One varint byte: the value, length, index or end-of-blocks marker
        AvroSchema::Boolean
        | AvroSchema::Int
        | AvroSchema::Long
        | AvroSchema::Enum(_)
        | AvroSchema::Bytes
        | AvroSchema::String
        | AvroSchema::Array(_)
        | AvroSchema::Map(_)
        | AvroSchema::Union(_) => 1,
    }
}

/// Reject a block whose item count cannot be backed by the remaining input.
///
/// `seen` is the number of items already read from earlier blocks of the
/// same array or map.
fn check_block_count(
    count: usize,
    item_len: usize,
    remaining: usize,
    seen: usize,
) -> Result<(), DecodeError> {
    let fits = match item_len {
        0 => seen.saturating_add(count) <= MAX_ZERO_WIDTH_ITEMS,
        n => count <= remaining / n,
    };
    if fits {
        Ok(())
    } else {
        Err(DecodeError::InvalidData(format!(
            "Block of {} items does not fit in {} remaining bytes",
            count, remaining
        )))
    }
}

// ============================================================================
// Complex Type Decoders
// ============================================================================

/// Decode an enum value as `(index, symbol)`.
pub fn decode_enum(data: &mut &[u8], schema: &EnumSchema) -> Result<(i32, String), DecodeError> {
    let index = decode_index(data, schema.symbols.len(), "Enum")?;
    Ok((index as i32, schema.symbols[index].clone()))
}

/// Decode a record's fields in declared order.
pub fn decode_record(
    data: &mut &[u8],
    schema: &RecordSchema,
) -> Result<Vec<(String, AvroValue)>, DecodeError> {
    schema
        .fields()
        .iter()
        .map(|field| Ok((field.name.clone(), decode_value(data, &field.schema)?)))
        .collect()
}

/// Decode any Avro value based on its schema.
pub fn decode_value(data: &mut &[u8], schema: &AvroSchema) -> Result<AvroValue, DecodeError> {
    decode_value_reusing(data, schema, None)
}

/// Decode any Avro value, recycling the allocation held by `reuse`.
///
/// `reuse` is only a hint: when its variant does not fit the schema it is
/// dropped and a fresh value is allocated.
pub fn decode_value_reusing(
    data: &mut &[u8],
    schema: &AvroSchema,
    reuse: Option<AvroValue>,
) -> Result<AvroValue, DecodeError> {
    match schema {
        AvroSchema::Null => Ok(AvroValue::Null),
        AvroSchema::Boolean => decode_boolean(data).map(AvroValue::Boolean),
        AvroSchema::Int => decode_int(data).map(AvroValue::Int),
        AvroSchema::Long => decode_long(data).map(AvroValue::Long),
        AvroSchema::Float => decode_float(data).map(AvroValue::Float),
        AvroSchema::Double => decode_double(data).map(AvroValue::Double),
        AvroSchema::Bytes => {
            let src = decode_bytes_ref(data)?;
            let mut buf = match reuse {
                Some(AvroValue::Bytes(buf)) => buf,
                _ => Vec::new(),
            };
            buf.clear();
            buf.extend_from_slice(src);
            Ok(AvroValue::Bytes(buf))
        }
        AvroSchema::String => {
            let src = decode_string_ref(data)?;
            let mut buf = match reuse {
                Some(AvroValue::String(buf)) => buf,
                _ => String::new(),
            };
            buf.clear();
            buf.push_str(src);
            Ok(AvroValue::String(buf))
        }
        AvroSchema::Fixed(fixed) => {
            let src = take(data, fixed.size)?;
            let mut buf = match reuse {
                Some(AvroValue::Fixed(buf)) => buf,
                _ => Vec::new(),
            };
            buf.clear();
            buf.extend_from_slice(src);
            Ok(AvroValue::Fixed(buf))
        }
        AvroSchema::Record(record) => decode_record(data, record).map(AvroValue::Record),
        AvroSchema::Enum(enum_schema) => {
            let (index, symbol) = decode_enum(data, enum_schema)?;
            Ok(AvroValue::Enum(index, symbol))
        }
        AvroSchema::Array(item_schema) => {
            let old = match reuse {
                Some(AvroValue::Array(items)) => items,
                _ => Vec::new(),
            };
            let item_len = min_encoded_len(item_schema);
            let mut items = Vec::with_capacity(old.len());
            let mut recycled = old.into_iter();
            loop {
                let count = decode_block_count(data)?;
                if count == 0 {
                    break;
                }
                check_block_count(count, item_len, data.len(), items.len())?;
                items.reserve(count);
                for _ in 0..count {
                    items.push(decode_value_reusing(data, item_schema, recycled.next())?);
                }
            }
            Ok(AvroValue::Array(items))
        }
        AvroSchema::Map(value_schema) => {
            // Each entry carries at least its key length
            let entry_len = 1 + min_encoded_len(value_schema);
            let mut entries = Vec::new();
            loop {
                let count = decode_block_count(data)?;
                if count == 0 {
                    break;
                }
                check_block_count(count, entry_len, data.len(), entries.len())?;
                entries.reserve(count);
                for _ in 0..count {
                    let key = decode_string(data)?;
                    entries.push((key, decode_value(data, value_schema)?));
                }
            }
            Ok(AvroValue::Map(entries))
        }
        AvroSchema::Union(variants) => {
            let index = decode_index(data, variants.len(), "Union")?;
            let inner_reuse = match reuse {
                Some(AvroValue::Union(old, inner)) if old as usize == index => Some(*inner),
                _ => None,
            };
            let value = decode_value_reusing(data, &variants[index], inner_reuse)?;
            Ok(AvroValue::Union(index as i32, Box::new(value)))
        }
    }
}

// ============================================================================
// Skip Functions
// ============================================================================

/// Skip over a fixed-size value.
#[inline]
pub fn skip_fixed(data: &mut &[u8], size: usize) -> Result<(), DecodeError> {
    take(data, size).map(|_| ())
}

/// Skip over a bytes or string value.
#[inline]
pub fn skip_bytes(data: &mut &[u8]) -> Result<(), DecodeError> {
    let len = decode_length(data)?;
    skip_fixed(data, len)
}

/// Skip a sequence of array/map blocks, jumping over blocks that declare
/// their byte size. `skip_item` consumes one item of at least `item_len`
/// bytes.
fn skip_blocks<F>(data: &mut &[u8], item_len: usize, mut skip_item: F) -> Result<(), DecodeError>
where
    F: FnMut(&mut &[u8]) -> Result<(), DecodeError>,
{
    let mut seen = 0usize;
    loop {
        let count = decode_long(data)?;
        if count == 0 {
            return Ok(());
        }
        if count < 0 {
            let byte_size = decode_long(data)?;
            let byte_size = usize::try_from(byte_size).map_err(|_| {
                DecodeError::InvalidData(format!("Negative block byte size: {}", byte_size))
            })?;
            skip_fixed(data, byte_size)?;
            continue;
        }
        let count = usize::try_from(count)
            .map_err(|_| DecodeError::InvalidData(format!("Block count {} too large", count)))?;
        check_block_count(count, item_len, data.len(), seen)?;
        seen = seen.saturating_add(count);
        // Zero-width items occupy no input
        if item_len == 0 {
            continue;
        }
        for _ in 0..count {
            skip_item(data)?;
        }
    }
}

/// Skip over any Avro value based on its schema.
pub fn skip_value(data: &mut &[u8], schema: &AvroSchema) -> Result<(), DecodeError> {
    match schema {
        AvroSchema::Null => Ok(()),
        AvroSchema::Boolean => skip_fixed(data, 1),
        AvroSchema::Int | AvroSchema::Long | AvroSchema::Enum(_) => skip_varint(data),
        AvroSchema::Float => skip_fixed(data, 4),
        AvroSchema::Double => skip_fixed(data, 8),
        AvroSchema::Bytes | AvroSchema::String => skip_bytes(data),
        AvroSchema::Fixed(fixed) => skip_fixed(data, fixed.size),
        AvroSchema::Array(item_schema) => {
            skip_blocks(data, min_encoded_len(item_schema), |d| {
                skip_value(d, item_schema)
            })
        }
        AvroSchema::Map(value_schema) => {
            skip_blocks(data, 1 + min_encoded_len(value_schema), |d| {
                skip_bytes(d)?;
                skip_value(d, value_schema)
            })
        }
        AvroSchema::Union(variants) => {
            let index = decode_index(data, variants.len(), "Union")?;
            skip_value(data, &variants[index])
        }
        AvroSchema::Record(record) => record
            .fields()
            .iter()
            .try_for_each(|field| skip_value(data, &field.schema)),
    }
}
