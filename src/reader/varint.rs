//! Variable-length integer coding used by Avro binary data.
//!
//! Avro shares the Protocol Buffers varint layout (7 data bits per byte,
//! little-endian groups, MSB as continuation flag) and maps signed values
//! through zigzag: `0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, ...`.

use crate::error::DecodeError;

/// Longest legal encoding of a 64-bit value.
pub const MAX_VARINT_LEN: usize = 10;

/// Decode an unsigned varint, advancing `data` past it.
///
/// # Errors
/// - `DecodeError::UnexpectedEof` if the input ends mid-varint
/// - `DecodeError::InvalidVarint` if more than [`MAX_VARINT_LEN`] bytes are used
#[inline]
pub fn decode_varint(data: &mut &[u8]) -> Result<u64, DecodeError> {
    let mut result: u64 = 0;

    for (consumed, &byte) in data.iter().enumerate() {
        if consumed == MAX_VARINT_LEN {
            return Err(DecodeError::InvalidVarint);
        }
        result |= ((byte & 0x7F) as u64) << (7 * consumed as u32);
        if byte & 0x80 == 0 {
            *data = &data[consumed + 1..];
            return Ok(result);
        }
    }

    if data.len() >= MAX_VARINT_LEN {
        return Err(DecodeError::InvalidVarint);
    }
    Err(DecodeError::UnexpectedEof)
}

/// Decode a zigzag-encoded signed varint.
#[inline]
pub fn decode_zigzag(data: &mut &[u8]) -> Result<i64, DecodeError> {
    let unsigned = decode_varint(data)?;
    Ok(((unsigned >> 1) as i64) ^ (-((unsigned & 1) as i64)))
}

/// Advance past a varint without assembling its value.
#[inline]
pub fn skip_varint(data: &mut &[u8]) -> Result<(), DecodeError> {
    match data.iter().take(MAX_VARINT_LEN).position(|b| b & 0x80 == 0) {
        Some(last) => {
            *data = &data[last + 1..];
            Ok(())
        }
        None if data.len() >= MAX_VARINT_LEN => Err(DecodeError::InvalidVarint),
        None => Err(DecodeError::UnexpectedEof),
    }
}

/// Append an unsigned varint to `out`.
#[inline]
pub fn write_varint(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Append a zigzag-encoded signed varint to `out`.
#[inline]
pub fn write_zigzag(value: i64, out: &mut Vec<u8>) {
    write_varint(((value << 1) ^ (value >> 63)) as u64, out);
}
