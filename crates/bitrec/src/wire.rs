//! Discriminator scheme and primitive value codec shared by every field.
//!
//! Every top-level field encoding opens with a 2-bit tag. `00`/`01` carry a
//! boolean or a zero/"unchanged" value on their own, `10` is the version
//! separator, and `11` announces a wide value: a 6-bit size field follows,
//! then the payload. A size of 0 switches to the array form (one byte of
//! element count, then self-sizing elements).

use crate::errors::{ReadError, WriteError};
use crate::stream::BitStream;

/// Width of the leading discriminator.
pub const BASE_BITS: usize = 2;
/// Width of the size field following [`TAG_WIDE`].
pub const SIZE_BITS: usize = 6;

/// Zero number, false boolean, or "no change" in a diff.
pub const TAG_ZERO: u64 = 0b00;
/// True boolean.
pub const TAG_ONE: u64 = 0b01;
/// Version separator.
pub const TAG_VERSION: u64 = 0b10;
/// Wide value; a size field follows.
pub const TAG_WIDE: u64 = 0b11;

/// Longest byte string representable in the 6-bit size field.
pub const MAX_STRING_LEN: usize = (1 << SIZE_BITS) - 1;

/// Widest scalar payload the size field can announce. A size of 0 is the
/// array header, so 64-bit-wide fields ship their low 63 bits.
pub const MAX_SCALAR_BITS: usize = (1 << SIZE_BITS) - 1;

/// Payload widths selected by the 2-bit array-element tag.
const ELEM_PAYLOAD_BITS: [usize; 4] = [6, 14, 30, 62];

/// Sign-extends the low `bits` of `value` to a full `i64`.
pub fn sign_extend(value: u64, bits: usize) -> i64 {
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

/// Writes an unsigned number: `00` alone for zero, otherwise `11` + size +
/// the value in `bits` bits. `bits` must fit the size field.
pub fn write_unsigned(stream: &mut BitStream, value: u64, bits: usize) -> Result<(), WriteError> {
    debug_assert!(bits >= 1 && bits <= MAX_SCALAR_BITS);
    if value == 0 {
        return stream.write_bits(TAG_ZERO, BASE_BITS);
    }
    stream.with_rollback(|s| {
        s.write_bits(TAG_WIDE, BASE_BITS)?;
        s.write_bits(bits as u64, SIZE_BITS)?;
        s.write_bits(value, bits)
    })
}

/// Writes a signed number; the payload uses the sign/magnitude window rule.
pub fn write_signed(stream: &mut BitStream, value: i64, bits: usize) -> Result<(), WriteError> {
    debug_assert!(bits >= 1 && bits <= MAX_SCALAR_BITS);
    if value == 0 {
        return stream.write_bits(TAG_ZERO, BASE_BITS);
    }
    stream.with_rollback(|s| {
        s.write_bits(TAG_WIDE, BASE_BITS)?;
        s.write_bits(bits as u64, SIZE_BITS)?;
        s.write_signed(value, bits)
    })
}

/// Reads a number written by [`write_unsigned`].
pub fn read_unsigned(stream: &mut BitStream) -> Result<u64, ReadError> {
    stream.with_rollback(|s| {
        let tag = s.read_bits(BASE_BITS)?;
        match tag {
            TAG_ZERO => Ok(0),
            TAG_WIDE => {
                let bits = s.read_bits(SIZE_BITS)? as usize;
                if bits == 0 {
                    // Array header in scalar position.
                    return Err(ReadError::UnexpectedArray);
                }
                s.read_bits(bits)
            }
            _ => Err(ReadError::TagMismatch),
        }
    })
}

/// Reads a number written by [`write_signed`].
pub fn read_signed(stream: &mut BitStream) -> Result<i64, ReadError> {
    stream.with_rollback(|s| {
        let tag = s.read_bits(BASE_BITS)?;
        match tag {
            TAG_ZERO => Ok(0),
            TAG_WIDE => {
                let bits = s.read_bits(SIZE_BITS)? as usize;
                if bits == 0 {
                    return Err(ReadError::UnexpectedArray);
                }
                s.read_signed(bits)
            }
            _ => Err(ReadError::TagMismatch),
        }
    })
}

/// Writes a byte string: `11` + length, then the bytes starting on a byte
/// boundary. An empty string ends after the length field.
pub fn write_string(stream: &mut BitStream, value: &[u8]) -> Result<(), WriteError> {
    if value.len() > MAX_STRING_LEN {
        return Err(WriteError::StringTooLong);
    }
    stream.with_rollback(|s| {
        s.write_bits(TAG_WIDE, BASE_BITS)?;
        s.write_bits(value.len() as u64, SIZE_BITS)?;
        if value.is_empty() {
            return Ok(());
        }
        s.pad_to_next()?;
        for &byte in value {
            s.write_byte(byte)?;
        }
        Ok(())
    })
}

fn read_string_body(stream: &mut BitStream) -> Result<Vec<u8>, ReadError> {
    let len = stream.read_bits(SIZE_BITS)? as usize;
    if len == 0 {
        return Ok(Vec::new());
    }
    stream.align_byte();
    let mut bytes = Vec::with_capacity(len);
    for _ in 0..len {
        bytes.push(stream.read_byte()?);
    }
    Ok(bytes)
}

/// Reads a byte string written by [`write_string`].
pub fn read_string(stream: &mut BitStream) -> Result<Vec<u8>, ReadError> {
    stream.with_rollback(|s| {
        let tag = s.read_bits(BASE_BITS)?;
        if tag != TAG_WIDE {
            return Err(ReadError::TagMismatch);
        }
        read_string_body(s)
    })
}

/// Reads a string diff: `None` for the "unchanged" tag, otherwise the
/// replacement bytes.
pub fn read_string_diff(stream: &mut BitStream) -> Result<Option<Vec<u8>>, ReadError> {
    stream.with_rollback(|s| {
        let tag = s.read_bits(BASE_BITS)?;
        match tag {
            TAG_ZERO => Ok(None),
            TAG_WIDE => Ok(Some(read_string_body(s)?)),
            _ => Err(ReadError::TagMismatch),
        }
    })
}

/// Writes the array header: `11`, size 0, one byte of element count.
pub fn write_array_header(stream: &mut BitStream, len: usize) -> Result<(), WriteError> {
    debug_assert!(len <= u8::MAX as usize);
    stream.with_rollback(|s| {
        s.write_bits(TAG_WIDE, BASE_BITS)?;
        s.write_bits(0, SIZE_BITS)?;
        s.write_bits(len as u64, 8)
    })
}

/// Reads the array header, returning the element count.
pub fn read_array_header(stream: &mut BitStream) -> Result<usize, ReadError> {
    stream.with_rollback(|s| {
        let tag = s.read_bits(BASE_BITS)?;
        if tag != TAG_WIDE {
            return Err(ReadError::TagMismatch);
        }
        let size = s.read_bits(SIZE_BITS)?;
        if size != 0 {
            return Err(ReadError::TagMismatch);
        }
        Ok(s.read_bits(8)? as usize)
    })
}

/// Writes one unsigned array element with the smallest covering width tag.
pub fn write_array_value(stream: &mut BitStream, value: u64) -> Result<(), WriteError> {
    let tag = if value < 1 << 6 {
        0
    } else if value < 1 << 14 {
        1
    } else if value < 1 << 30 {
        2
    } else {
        // The full 64 bits are not representable; the payload caps at 62.
        3
    };
    stream.with_rollback(|s| {
        s.write_bits(tag as u64, 2)?;
        s.write_bits(value, ELEM_PAYLOAD_BITS[tag])
    })
}

/// Writes one signed array element; the magnitude picks the width tag.
pub fn write_array_value_signed(stream: &mut BitStream, value: i64) -> Result<(), WriteError> {
    let magnitude = value.unsigned_abs();
    let tag = if magnitude < 1 << 5 {
        0
    } else if magnitude < 1 << 13 {
        1
    } else if magnitude < 1 << 29 {
        2
    } else {
        3
    };
    stream.with_rollback(|s| {
        s.write_bits(tag as u64, 2)?;
        s.write_signed(value, ELEM_PAYLOAD_BITS[tag])
    })
}

/// Reads one unsigned array element.
pub fn read_array_value(stream: &mut BitStream) -> Result<u64, ReadError> {
    stream.with_rollback(|s| {
        let tag = s.read_bits(2)? as usize;
        s.read_bits(ELEM_PAYLOAD_BITS[tag])
    })
}

/// Reads one signed array element.
pub fn read_array_value_signed(stream: &mut BitStream) -> Result<i64, ReadError> {
    stream.with_rollback(|s| {
        let tag = s.read_bits(2)? as usize;
        s.read_signed(ELEM_PAYLOAD_BITS[tag])
    })
}
