//! Typed record fields and their wire encodings.
//!
//! A [`Field`] is one element of a record: a boolean, a version separator, a
//! short byte string, a fixed-width number (optionally used as a bit set),
//! or a fixed-count array of numbers. Dispatch over the variants happens at
//! the record walking loop in [`crate::link`].

use crate::errors::{ReadError, WriteError};
use crate::stream::BitStream;
use crate::wire;

/// Storage width of a number field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    W8,
    W16,
    W32,
    W64,
}

impl Width {
    pub const fn bits(self) -> usize {
        match self {
            Width::W8 => 8,
            Width::W16 => 16,
            Width::W32 => 32,
            Width::W64 => 64,
        }
    }

    pub const fn bytes(self) -> usize {
        self.bits() / 8
    }
}

fn truncate(value: u64, width: Width) -> u64 {
    if width.bits() >= 64 {
        value
    } else {
        value & ((1u64 << width.bits()) - 1)
    }
}

/// A fixed-width scalar. Stores the value as raw low bits (two's complement
/// for signed types); the wire form is sign/magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Number {
    width: Width,
    signed: bool,
    bits: u64,
}

impl Number {
    fn new_unsigned(width: Width, value: u64) -> Self {
        Self {
            width,
            signed: false,
            bits: truncate(value, width),
        }
    }

    fn new_signed(width: Width, value: i64) -> Self {
        Self {
            width,
            signed: true,
            bits: truncate(value as u64, width),
        }
    }

    pub fn width(&self) -> Width {
        self.width
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Raw value, zero-extended.
    pub fn unsigned_value(&self) -> u64 {
        self.bits
    }

    /// Value sign-extended from the storage width.
    pub fn signed_value(&self) -> i64 {
        wire::sign_extend(self.bits, self.width.bits())
    }

    pub fn set_unsigned(&mut self, value: u64) {
        self.bits = truncate(value, self.width);
    }

    pub fn set_signed(&mut self, value: i64) {
        self.bits = truncate(value as u64, self.width);
    }

    /// Tests one bit of the stored value. Out-of-range bits read as false.
    pub fn get_bit(&self, bit: u32) -> bool {
        (bit as usize) < self.width.bits() && (self.bits >> bit) & 1 != 0
    }

    /// Sets or clears one bit of the stored value. Out-of-range bits are
    /// ignored.
    pub fn set_bit(&mut self, bit: u32, on: bool) {
        if (bit as usize) >= self.width.bits() {
            return;
        }
        if on {
            self.bits |= 1 << bit;
        } else {
            self.bits &= !(1 << bit);
        }
    }

    /// Payload width on the wire. The size field cannot announce 64, so
    /// 64-bit fields carry their low 63 bits (62 magnitude bits plus sign
    /// when signed).
    fn wire_bits(&self) -> usize {
        self.width.bits().min(wire::MAX_SCALAR_BITS)
    }

    fn serialize(&self, stream: &mut BitStream) -> Result<(), WriteError> {
        if self.signed {
            wire::write_signed(stream, self.signed_value(), self.wire_bits())
        } else {
            wire::write_unsigned(stream, self.bits, self.wire_bits())
        }
    }

    fn serialize_diff(&self, stream: &mut BitStream, base: &Number) -> Result<(), WriteError> {
        if self.signed {
            let diff = base.signed_value().wrapping_sub(self.signed_value());
            wire::write_signed(stream, diff, self.wire_bits())
        } else {
            let diff = base.bits.wrapping_sub(self.bits);
            wire::write_unsigned(stream, diff, self.wire_bits())
        }
    }

    fn deserialize(&mut self, stream: &mut BitStream) -> Result<(), ReadError> {
        if self.signed {
            let value = wire::read_signed(stream)?;
            self.bits = truncate(value as u64, self.width);
        } else {
            let value = wire::read_unsigned(stream)?;
            self.bits = truncate(value, self.width);
        }
        Ok(())
    }

    fn deserialize_diff(&mut self, stream: &mut BitStream) -> Result<(), ReadError> {
        if self.signed {
            let diff = wire::read_signed(stream)?;
            self.bits = truncate(self.signed_value().wrapping_add(diff) as u64, self.width);
        } else {
            let diff = wire::read_unsigned(stream)?;
            self.bits = truncate(self.bits.wrapping_add(diff), self.width);
        }
        Ok(())
    }
}

/// A fixed-count array of numbers sharing one width and signedness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberArray {
    width: Width,
    signed: bool,
    values: Vec<u64>,
}

impl NumberArray {
    fn new_unsigned(width: Width, init: u64, len: usize) -> Self {
        debug_assert!(len >= 1 && len <= u8::MAX as usize);
        Self {
            width,
            signed: false,
            values: vec![truncate(init, width); len],
        }
    }

    fn new_signed(width: Width, init: i64, len: usize) -> Self {
        debug_assert!(len >= 1 && len <= u8::MAX as usize);
        Self {
            width,
            signed: true,
            values: vec![truncate(init as u64, width); len],
        }
    }

    pub fn width(&self) -> Width {
        self.width
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get_unsigned(&self, index: usize) -> u64 {
        self.values[index]
    }

    pub fn get_signed(&self, index: usize) -> i64 {
        wire::sign_extend(self.values[index], self.width.bits())
    }

    pub fn set_unsigned(&mut self, index: usize, value: u64) {
        self.values[index] = truncate(value, self.width);
    }

    pub fn set_signed(&mut self, index: usize, value: i64) {
        self.values[index] = truncate(value as u64, self.width);
    }

    pub fn fill_unsigned(&mut self, value: u64) {
        self.values.fill(truncate(value, self.width));
    }

    pub fn fill_signed(&mut self, value: i64) {
        self.values.fill(truncate(value as u64, self.width));
    }

    fn serialize(&self, stream: &mut BitStream) -> Result<(), WriteError> {
        stream.with_rollback(|s| {
            wire::write_array_header(s, self.values.len())?;
            for index in 0..self.values.len() {
                if self.signed {
                    wire::write_array_value_signed(s, self.get_signed(index))?;
                } else {
                    wire::write_array_value(s, self.values[index])?;
                }
            }
            Ok(())
        })
    }

    fn serialize_diff(&self, stream: &mut BitStream, base: &NumberArray) -> Result<(), WriteError> {
        stream.with_rollback(|s| {
            wire::write_array_header(s, self.values.len())?;
            for index in 0..self.values.len() {
                if self.signed {
                    let diff = base.get_signed(index).wrapping_sub(self.get_signed(index));
                    wire::write_array_value_signed(s, diff)?;
                } else {
                    let diff = base.values[index].wrapping_sub(self.values[index]);
                    wire::write_array_value(s, diff)?;
                }
            }
            Ok(())
        })
    }

    fn deserialize(&mut self, stream: &mut BitStream) -> Result<(), ReadError> {
        let decoded = stream.with_rollback(|s| {
            let count = wire::read_array_header(s)?;
            if count != self.values.len() {
                return Err(ReadError::LengthMismatch);
            }
            let mut decoded = Vec::with_capacity(count);
            for _ in 0..count {
                let raw = if self.signed {
                    wire::read_array_value_signed(s)? as u64
                } else {
                    wire::read_array_value(s)?
                };
                decoded.push(truncate(raw, self.width));
            }
            Ok(decoded)
        })?;
        self.values = decoded;
        Ok(())
    }

    fn deserialize_diff(&mut self, stream: &mut BitStream) -> Result<(), ReadError> {
        let decoded = stream.with_rollback(|s| {
            let count = wire::read_array_header(s)?;
            if count != self.values.len() {
                return Err(ReadError::LengthMismatch);
            }
            let mut decoded = Vec::with_capacity(count);
            for index in 0..count {
                let raw = if self.signed {
                    let diff = wire::read_array_value_signed(s)?;
                    self.get_signed(index).wrapping_add(diff) as u64
                } else {
                    let diff = wire::read_array_value(s)?;
                    self.values[index].wrapping_add(diff)
                };
                decoded.push(truncate(raw, self.width));
            }
            Ok(decoded)
        })?;
        self.values = decoded;
        Ok(())
    }
}

/// One typed element of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// Single logical bit of state.
    Bool(bool),
    /// Zero-payload schema boundary marker.
    Version,
    /// Byte string of up to 63 bytes.
    Str(String),
    /// Fixed-width number, also usable as a bit set.
    Number(Number),
    /// Fixed-count array of numbers.
    Array(NumberArray),
}

macro_rules! number_field {
    ($ctor:ident, $getter:ident, $setter:ident, $ty:ty, $width:expr, unsigned) => {
        pub fn $ctor(init: $ty) -> Self {
            Field::Number(Number::new_unsigned($width, init as u64))
        }

        pub fn $getter(&self) -> Option<$ty> {
            match self {
                Field::Number(n) if n.width == $width && !n.signed => {
                    Some(n.unsigned_value() as $ty)
                }
                _ => None,
            }
        }

        pub fn $setter(&mut self, value: $ty) {
            match self {
                Field::Number(n) if n.width == $width && !n.signed => {
                    n.set_unsigned(value as u64)
                }
                _ => debug_assert!(false, "setter type does not match field"),
            }
        }
    };
    ($ctor:ident, $getter:ident, $setter:ident, $ty:ty, $width:expr, signed) => {
        pub fn $ctor(init: $ty) -> Self {
            Field::Number(Number::new_signed($width, init as i64))
        }

        pub fn $getter(&self) -> Option<$ty> {
            match self {
                Field::Number(n) if n.width == $width && n.signed => {
                    Some(n.signed_value() as $ty)
                }
                _ => None,
            }
        }

        pub fn $setter(&mut self, value: $ty) {
            match self {
                Field::Number(n) if n.width == $width && n.signed => n.set_signed(value as i64),
                _ => debug_assert!(false, "setter type does not match field"),
            }
        }
    };
}

macro_rules! array_field {
    ($ctor:ident, $ty:ty, $width:expr, unsigned) => {
        pub fn $ctor(init: $ty, len: usize) -> Self {
            Field::Array(NumberArray::new_unsigned($width, init as u64, len))
        }
    };
    ($ctor:ident, $ty:ty, $width:expr, signed) => {
        pub fn $ctor(init: $ty, len: usize) -> Self {
            Field::Array(NumberArray::new_signed($width, init as i64, len))
        }
    };
}

impl Field {
    pub fn bool(init: bool) -> Self {
        Field::Bool(init)
    }

    pub fn version() -> Self {
        Field::Version
    }

    /// A byte-string field. Values longer than 63 bytes fail to serialize.
    pub fn string(init: impl Into<String>) -> Self {
        Field::Str(init.into())
    }

    number_field!(u8, as_u8, set_u8, u8, Width::W8, unsigned);
    number_field!(u16, as_u16, set_u16, u16, Width::W16, unsigned);
    number_field!(u32, as_u32, set_u32, u32, Width::W32, unsigned);
    number_field!(u64, as_u64, set_u64, u64, Width::W64, unsigned);
    number_field!(i8, as_i8, set_i8, i8, Width::W8, signed);
    number_field!(i16, as_i16, set_i16, i16, Width::W16, signed);
    number_field!(i32, as_i32, set_i32, i32, Width::W32, signed);
    number_field!(i64, as_i64, set_i64, i64, Width::W64, signed);

    /// Unsigned number intended for bit-set use; see [`Field::get_bit`].
    pub fn bits8(init: u8) -> Self {
        Self::u8(init)
    }

    pub fn bits16(init: u16) -> Self {
        Self::u16(init)
    }

    pub fn bits32(init: u32) -> Self {
        Self::u32(init)
    }

    pub fn bits64(init: u64) -> Self {
        Self::u64(init)
    }

    array_field!(array_u8, u8, Width::W8, unsigned);
    array_field!(array_u16, u16, Width::W16, unsigned);
    array_field!(array_u32, u32, Width::W32, unsigned);
    array_field!(array_u64, u64, Width::W64, unsigned);
    array_field!(array_i8, i8, Width::W8, signed);
    array_field!(array_i16, i16, Width::W16, signed);
    array_field!(array_i32, i32, Width::W32, signed);
    array_field!(array_i64, i64, Width::W64, signed);

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Field::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn set_bool(&mut self, value: bool) {
        match self {
            Field::Bool(slot) => *slot = value,
            _ => debug_assert!(false, "setter type does not match field"),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn set_str(&mut self, value: impl Into<String>) {
        match self {
            Field::Str(slot) => *slot = value.into(),
            _ => debug_assert!(false, "setter type does not match field"),
        }
    }

    pub fn as_array(&self) -> Option<&NumberArray> {
        match self {
            Field::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut NumberArray> {
        match self {
            Field::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Tests one bit of a number field; false on any other variant.
    pub fn get_bit(&self, bit: u32) -> bool {
        match self {
            Field::Number(n) => n.get_bit(bit),
            _ => false,
        }
    }

    /// Sets one bit of a number field; ignored on any other variant.
    pub fn set_bit(&mut self, bit: u32, on: bool) {
        if let Field::Number(n) = self {
            n.set_bit(bit, on);
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Field::Bool(_))
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Field::Version)
    }

    /// Byte size of a single element, for buffer sizing.
    pub fn byte_size(&self) -> usize {
        match self {
            Field::Bool(_) | Field::Version => 0,
            Field::Str(value) => value.len(),
            Field::Number(n) => n.width.bytes(),
            Field::Array(array) => array.width.bytes(),
        }
    }

    /// Element count, for buffer sizing. Scalar payloads count as 1.
    pub fn array_len(&self) -> usize {
        match self {
            Field::Bool(_) | Field::Version => 0,
            Field::Str(_) | Field::Number(_) => 1,
            Field::Array(array) => array.len(),
        }
    }

    /// Assigns `other`'s value if the two fields have the same shape;
    /// otherwise leaves `self` unchanged.
    pub fn copy_from(&mut self, other: &Field) {
        match (self, other) {
            (Field::Bool(slot), Field::Bool(value)) => *slot = *value,
            (Field::Version, Field::Version) => {}
            (Field::Str(slot), Field::Str(value)) => slot.clone_from(value),
            (Field::Number(slot), Field::Number(value))
                if slot.width == value.width && slot.signed == value.signed =>
            {
                slot.bits = value.bits;
            }
            (Field::Array(slot), Field::Array(value))
                if slot.width == value.width
                    && slot.signed == value.signed
                    && slot.values.len() == value.values.len() =>
            {
                slot.values.copy_from_slice(&value.values);
            }
            _ => {}
        }
    }

    /// Appends one self-delimited encoding of the current value.
    pub fn serialize(&self, stream: &mut BitStream) -> Result<(), WriteError> {
        match self {
            Field::Bool(value) => stream.write_bits(
                if *value { wire::TAG_ONE } else { wire::TAG_ZERO },
                wire::BASE_BITS,
            ),
            Field::Version => stream.write_bits(wire::TAG_VERSION, wire::BASE_BITS),
            Field::Str(value) => wire::write_string(stream, value.as_bytes()),
            Field::Number(n) => n.serialize(stream),
            Field::Array(array) => array.serialize(stream),
        }
    }

    /// Appends an encoding of `base - self`; a receiver holding this
    /// field's value reconstructs `base` from it.
    pub fn serialize_diff(&self, stream: &mut BitStream, base: &Field) -> Result<(), WriteError> {
        match (self, base) {
            // Booleans carry no arithmetic delta; the base's state is the
            // whole transfer, same cost as a full encoding.
            (Field::Bool(_), Field::Bool(base_value)) => stream.write_bits(
                if *base_value { wire::TAG_ONE } else { wire::TAG_ZERO },
                wire::BASE_BITS,
            ),
            (Field::Version, _) => self.serialize(stream),
            (Field::Str(value), Field::Str(base_value)) => {
                if value == base_value {
                    stream.write_bits(wire::TAG_ZERO, wire::BASE_BITS)
                } else {
                    wire::write_string(stream, base_value.as_bytes())
                }
            }
            (Field::Number(n), Field::Number(base_n))
                if n.width == base_n.width && n.signed == base_n.signed =>
            {
                n.serialize_diff(stream, base_n)
            }
            (Field::Array(array), Field::Array(base_array))
                if array.width == base_array.width
                    && array.signed == base_array.signed
                    && array.values.len() == base_array.values.len() =>
            {
                array.serialize_diff(stream, base_array)
            }
            _ => Err(WriteError::ShapeMismatch),
        }
    }

    /// Parses a full encoding into this field. The discriminator must match
    /// the variant; on failure the cursor and the value are unchanged.
    pub fn deserialize(&mut self, stream: &mut BitStream) -> Result<(), ReadError> {
        match self {
            Field::Bool(slot) => stream.with_rollback(|s| {
                match s.read_bits(wire::BASE_BITS)? {
                    wire::TAG_ZERO => *slot = false,
                    wire::TAG_ONE => *slot = true,
                    _ => return Err(ReadError::TagMismatch),
                }
                Ok(())
            }),
            Field::Version => stream.with_rollback(|s| {
                if s.read_bits(wire::BASE_BITS)? != wire::TAG_VERSION {
                    return Err(ReadError::TagMismatch);
                }
                Ok(())
            }),
            Field::Str(slot) => {
                let text = stream.with_rollback(|s| {
                    let bytes = wire::read_string(s)?;
                    String::from_utf8(bytes).map_err(|_| ReadError::InvalidUtf8)
                })?;
                *slot = text;
                Ok(())
            }
            Field::Number(n) => n.deserialize(stream),
            Field::Array(array) => array.deserialize(stream),
        }
    }

    /// Parses a delta encoding and applies it to the current value.
    pub fn deserialize_diff(&mut self, stream: &mut BitStream) -> Result<(), ReadError> {
        match self {
            Field::Bool(_) | Field::Version => self.deserialize(stream),
            Field::Str(slot) => {
                let replacement = stream.with_rollback(|s| {
                    match wire::read_string_diff(s)? {
                        None => Ok(None),
                        Some(bytes) => String::from_utf8(bytes)
                            .map(Some)
                            .map_err(|_| ReadError::InvalidUtf8),
                    }
                })?;
                if let Some(text) = replacement {
                    *slot = text;
                }
                Ok(())
            }
            Field::Number(n) => n.deserialize_diff(stream),
            Field::Array(array) => array.deserialize_diff(stream),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_roundtrip() {
        let mut stream = BitStream::with_capacity(32);
        Field::u32(1_024_000).serialize(&mut stream).unwrap();
        Field::i16(-2).serialize(&mut stream).unwrap();

        stream.reset();
        let mut count = Field::u32(0);
        let mut code = Field::i16(0);
        count.deserialize(&mut stream).unwrap();
        code.deserialize(&mut stream).unwrap();

        assert_eq!(count.as_u32(), Some(1_024_000));
        assert_eq!(code.as_i16(), Some(-2));
    }

    #[test]
    fn test_wide_scalars_use_63_bit_payload() {
        let mut stream = BitStream::with_capacity(32);
        Field::u64((1 << 63) - 1).serialize(&mut stream).unwrap();
        assert_eq!(stream.tell(), 2 + 6 + 63);
        Field::i64(-(1 << 62) + 1).serialize(&mut stream).unwrap();

        stream.reset();
        let mut big = Field::u64(0);
        let mut neg = Field::i64(0);
        big.deserialize(&mut stream).unwrap();
        neg.deserialize(&mut stream).unwrap();

        assert_eq!(big.as_u64(), Some((1 << 63) - 1));
        assert_eq!(neg.as_i64(), Some(-(1 << 62) + 1));
    }

    #[test]
    fn test_number_rejects_wrong_tag() {
        let mut stream = BitStream::with_capacity(4);
        Field::version().serialize(&mut stream).unwrap();

        stream.reset();
        let mut number = Field::u32(7);
        assert_eq!(
            number.deserialize(&mut stream).unwrap_err(),
            ReadError::TagMismatch
        );
        assert_eq!(number.as_u32(), Some(7));
        assert_eq!(stream.tell(), 0);
    }

    #[test]
    fn test_number_diff_zero_is_two_bits() {
        let a = Field::u32(555);
        let b = Field::u32(555);
        let mut stream = BitStream::with_capacity(8);
        a.serialize_diff(&mut stream, &b).unwrap();
        assert_eq!(stream.tell(), 2);
    }

    #[test]
    fn test_number_diff_applies() {
        let mut receiver = Field::u32(100);
        let target = Field::u32(40);

        let mut stream = BitStream::with_capacity(8);
        receiver.serialize_diff(&mut stream, &target).unwrap();
        stream.reset();
        receiver.deserialize_diff(&mut stream).unwrap();
        assert_eq!(receiver.as_u32(), Some(40));
    }

    #[test]
    fn test_signed_diff_applies() {
        let mut receiver = Field::i16(-2);
        let target = Field::i16(900);

        let mut stream = BitStream::with_capacity(8);
        receiver.serialize_diff(&mut stream, &target).unwrap();
        stream.reset();
        receiver.deserialize_diff(&mut stream).unwrap();
        assert_eq!(receiver.as_i16(), Some(900));
    }

    #[test]
    fn test_diff_shape_mismatch() {
        let a = Field::u32(1);
        let b = Field::u16(1);
        let mut stream = BitStream::with_capacity(8);
        assert_eq!(
            a.serialize_diff(&mut stream, &b).unwrap_err(),
            WriteError::ShapeMismatch
        );
        assert_eq!(stream.tell(), 0);
    }

    #[test]
    fn test_string_roundtrip() {
        let mut stream = BitStream::with_capacity(64);
        Field::string("Namae").serialize(&mut stream).unwrap();

        stream.reset();
        let mut name = Field::string("");
        name.deserialize(&mut stream).unwrap();
        assert_eq!(name.as_str(), Some("Namae"));
    }

    #[test]
    fn test_string_diff_unchanged_keeps_value() {
        let a = Field::string("same");
        let mut stream = BitStream::with_capacity(8);
        a.serialize_diff(&mut stream, &Field::string("same")).unwrap();
        assert_eq!(stream.tell(), 2);

        stream.reset();
        let mut receiver = Field::string("same");
        receiver.deserialize_diff(&mut stream).unwrap();
        assert_eq!(receiver.as_str(), Some("same"));
    }

    #[test]
    fn test_string_diff_transfers_base_value() {
        let current = Field::string("Namae");
        let base = Field::string("DiffTarget");
        let mut stream = BitStream::with_capacity(64);
        current.serialize_diff(&mut stream, &base).unwrap();

        stream.reset();
        let mut receiver = Field::string("Namae");
        receiver.deserialize_diff(&mut stream).unwrap();
        assert_eq!(receiver.as_str(), Some("DiffTarget"));
    }

    #[test]
    fn test_bool_diff_transfers_base_state() {
        let current = Field::bool(false);
        let base = Field::bool(true);
        let mut stream = BitStream::with_capacity(4);
        current.serialize_diff(&mut stream, &base).unwrap();
        assert_eq!(stream.tell(), 2);

        stream.reset();
        let mut receiver = Field::bool(false);
        receiver.deserialize_diff(&mut stream).unwrap();
        assert_eq!(receiver.as_bool(), Some(true));
    }

    #[test]
    fn test_string_rejects_invalid_utf8() {
        let mut stream = BitStream::with_capacity(16);
        wire::write_string(&mut stream, &[0xff, 0xfe]).unwrap();

        stream.reset();
        let mut name = Field::string("before");
        assert_eq!(
            name.deserialize(&mut stream).unwrap_err(),
            ReadError::InvalidUtf8
        );
        assert_eq!(name.as_str(), Some("before"));
        assert_eq!(stream.tell(), 0);
    }

    #[test]
    fn test_array_roundtrip() {
        let mut points = Field::array_u32(0, 16);
        points.as_array_mut().unwrap().set_unsigned(3, 77);
        points.as_array_mut().unwrap().set_unsigned(15, 1 << 20);

        let mut stream = BitStream::with_capacity(256);
        points.serialize(&mut stream).unwrap();

        stream.reset();
        let mut decoded = Field::array_u32(9, 16);
        decoded.deserialize(&mut stream).unwrap();
        assert_eq!(decoded, points);
    }

    #[test]
    fn test_array_count_mismatch() {
        let points = Field::array_u32(0, 16);
        let mut stream = BitStream::with_capacity(256);
        points.serialize(&mut stream).unwrap();

        stream.reset();
        let mut shorter = Field::array_u32(5, 8);
        assert_eq!(
            shorter.deserialize(&mut stream).unwrap_err(),
            ReadError::LengthMismatch
        );
        assert_eq!(shorter, Field::array_u32(5, 8));
        assert_eq!(stream.tell(), 0);
    }

    #[test]
    fn test_array_diff_wraps_backwards() {
        let mut receiver = Field::array_u32(500, 4);
        let mut target = Field::array_u32(0, 4);
        target.as_array_mut().unwrap().set_unsigned(2, 100);

        let mut stream = BitStream::with_capacity(64);
        receiver.serialize_diff(&mut stream, &target).unwrap();
        stream.reset();
        receiver.deserialize_diff(&mut stream).unwrap();
        assert_eq!(receiver, target);
    }

    #[test]
    fn test_signed_array_diff() {
        let mut receiver = Field::array_i16(-5, 4);
        let mut target = Field::array_i16(0, 4);
        target.as_array_mut().unwrap().set_signed(0, 1_000);
        target.as_array_mut().unwrap().set_signed(3, -1_000);

        let mut stream = BitStream::with_capacity(64);
        receiver.serialize_diff(&mut stream, &target).unwrap();
        stream.reset();
        receiver.deserialize_diff(&mut stream).unwrap();
        assert_eq!(receiver, target);
    }

    #[test]
    fn test_bit_accessors() {
        let mut flags = Field::bits32(0);
        flags.set_bit(5, true);
        assert!(flags.get_bit(5));
        assert!(!flags.get_bit(4));
        assert_eq!(flags.as_u32(), Some(0x20));

        flags.set_bit(5, false);
        assert_eq!(flags.as_u32(), Some(0));

        // Out-of-range bits are ignored.
        flags.set_bit(40, true);
        assert_eq!(flags.as_u32(), Some(0));
        assert!(!flags.get_bit(40));
    }

    #[test]
    fn test_copy_from_shape_mismatch_is_noop() {
        let mut target = Field::u32(1);
        target.copy_from(&Field::i32(9));
        assert_eq!(target.as_u32(), Some(1));

        target.copy_from(&Field::u32(9));
        assert_eq!(target.as_u32(), Some(9));
    }

    #[test]
    fn test_version_roundtrip() {
        let mut stream = BitStream::with_capacity(4);
        Field::version().serialize(&mut stream).unwrap();
        assert_eq!(stream.tell(), 2);

        stream.reset();
        let mut marker = Field::version();
        marker.deserialize(&mut stream).unwrap();
        assert_eq!(stream.tell(), 2);
    }

    #[test]
    fn test_bool_rejects_wide_tag() {
        let mut stream = BitStream::with_capacity(8);
        Field::u32(9).serialize(&mut stream).unwrap();

        stream.reset();
        let mut flag = Field::bool(true);
        assert_eq!(
            flag.deserialize(&mut stream).unwrap_err(),
            ReadError::TagMismatch
        );
        assert_eq!(flag.as_bool(), Some(true));
    }
}
