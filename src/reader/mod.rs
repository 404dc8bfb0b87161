//! Binary reading components
//!
//! Varint coding, value decoding and skipping, and the [`Cursor`] abstraction
//! the specific decoder reads through.

pub mod cursor;
pub mod decode;
pub mod varint;

pub use cursor::{BinaryCursor, Cursor};
pub use decode::{
    decode_boolean, decode_bytes, decode_bytes_ref, decode_double, decode_enum, decode_fixed,
    decode_float, decode_int, decode_long, decode_record, decode_string, decode_string_ref,
    decode_value, decode_value_reusing, min_encoded_len, skip_bytes, skip_fixed, skip_value,
    AvroValue, MAX_ZERO_WIDTH_ITEMS,
};
pub use varint::{decode_varint, decode_zigzag, skip_varint, write_varint, write_zigzag};
