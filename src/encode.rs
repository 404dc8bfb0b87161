//! Avro binary encoding of [`AvroValue`]s.
//!
//! Produces writer-side bytes for tests, benchmarks and fixtures. Arrays and
//! maps are written as a single counted block followed by the end marker.

use crate::error::SchemaError;
use crate::reader::varint::{write_varint, write_zigzag};
use crate::reader::AvroValue;
use crate::schema::{AvroSchema, RecordSchema};

/// Append the encoding of `value` under `schema` to `out`.
pub fn encode_value(
    value: &AvroValue,
    schema: &AvroSchema,
    out: &mut Vec<u8>,
) -> Result<(), SchemaError> {
    match (schema, value) {
        (AvroSchema::Null, AvroValue::Null) => Ok(()),
        (AvroSchema::Boolean, AvroValue::Boolean(b)) => {
            out.push(u8::from(*b));
            Ok(())
        }
        (AvroSchema::Int, AvroValue::Int(v)) => {
            write_zigzag(i64::from(*v), out);
            Ok(())
        }
        (AvroSchema::Long, AvroValue::Long(v)) => {
            write_zigzag(*v, out);
            Ok(())
        }
        (AvroSchema::Float, AvroValue::Float(v)) => {
            out.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        (AvroSchema::Double, AvroValue::Double(v)) => {
            out.extend_from_slice(&v.to_le_bytes());
            Ok(())
        }
        (AvroSchema::Bytes, AvroValue::Bytes(b)) => {
            write_len_prefixed(b, out);
            Ok(())
        }
        (AvroSchema::String, AvroValue::String(s)) => {
            write_len_prefixed(s.as_bytes(), out);
            Ok(())
        }
        (AvroSchema::Fixed(fixed), AvroValue::Fixed(b)) if b.len() == fixed.size => {
            out.extend_from_slice(b);
            Ok(())
        }
        (AvroSchema::Enum(enum_schema), AvroValue::Enum(index, _))
            if *index >= 0 && (*index as usize) < enum_schema.symbols.len() =>
        {
            write_zigzag(i64::from(*index), out);
            Ok(())
        }
        (AvroSchema::Array(item_schema), AvroValue::Array(items)) => {
            if !items.is_empty() {
                write_zigzag(items.len() as i64, out);
                for item in items {
                    encode_value(item, item_schema, out)?;
                }
            }
            write_varint(0, out);
            Ok(())
        }
        (AvroSchema::Map(value_schema), AvroValue::Map(entries)) => {
            if !entries.is_empty() {
                write_zigzag(entries.len() as i64, out);
                for (key, value) in entries {
                    write_len_prefixed(key.as_bytes(), out);
                    encode_value(value, value_schema, out)?;
                }
            }
            write_varint(0, out);
            Ok(())
        }
        (AvroSchema::Union(variants), AvroValue::Union(index, inner)) => {
            let variant = usize::try_from(*index)
                .ok()
                .and_then(|idx| variants.get(idx))
                .ok_or_else(|| {
                    SchemaError::ValueMismatch(format!(
                        "Union index {} out of range (0..{})",
                        index,
                        variants.len()
                    ))
                })?;
            write_zigzag(i64::from(*index), out);
            encode_value(inner, variant, out)
        }
        (AvroSchema::Record(record), AvroValue::Record(fields)) => {
            let fields: Vec<(&str, &AvroValue)> =
                fields.iter().map(|(name, v)| (name.as_str(), v)).collect();
            write_record_fields(&fields, record, out)
        }
        (schema, value) => Err(SchemaError::ValueMismatch(format!(
            "Cannot write {} value as {}",
            value.type_name(),
            schema.kind()
        ))),
    }
}

/// Encode a whole record given its field values by name, in any order.
pub fn encode_record(
    fields: &[(&str, AvroValue)],
    schema: &RecordSchema,
) -> Result<Vec<u8>, SchemaError> {
    let fields: Vec<(&str, &AvroValue)> = fields.iter().map(|(name, v)| (*name, v)).collect();
    let mut out = Vec::new();
    write_record_fields(&fields, schema, &mut out)?;
    Ok(out)
}

fn write_record_fields(
    fields: &[(&str, &AvroValue)],
    record: &RecordSchema,
    out: &mut Vec<u8>,
) -> Result<(), SchemaError> {
    for field in record.fields() {
        let value = fields
            .iter()
            .find(|(name, _)| *name == field.name)
            .map(|(_, v)| *v)
            .ok_or_else(|| {
                SchemaError::ValueMismatch(format!(
                    "Missing field '{}' for record '{}'",
                    field.name,
                    record.name()
                ))
            })?;
        encode_value(value, &field.schema, out)?;
    }
    Ok(())
}

fn write_len_prefixed(bytes: &[u8], out: &mut Vec<u8>) {
    write_zigzag(bytes.len() as i64, out);
    out.extend_from_slice(bytes);
}
