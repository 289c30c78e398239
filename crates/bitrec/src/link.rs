//! Ordered field sequences and the record-level codec walk.
//!
//! A [`FieldLink`] owns its fields and hands out stable [`FieldId`] index
//! handles at registration time. Field order is the schema: reader and
//! writer must register the same sequence, and version separators mark
//! where one schema generation ends and the next begins.

use std::ops::{Index, IndexMut};

use crate::errors::{ReadError, WriteError};
use crate::field::Field;
use crate::stream::BitStream;
use crate::wire;

/// Stable handle to a field registered in a [`FieldLink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldId(usize);

/// An ordered, owning sequence of fields plus the record-level operations
/// that walk it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldLink {
    fields: Vec<Field>,
}

impl FieldLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a field at the end of the sequence and returns its handle.
    pub fn add(&mut self, field: Field) -> FieldId {
        self.fields.push(field);
        FieldId(self.fields.len() - 1)
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.0]
    }

    pub fn field_mut(&mut self, id: FieldId) -> &mut Field {
        &mut self.fields[id.0]
    }

    /// Handles for every registered field, in registration order. Useful
    /// for links whose construction did not keep the handles, e.g. ones
    /// built from a layout definition.
    pub fn ids(&self) -> impl Iterator<Item = FieldId> + '_ {
        (0..self.fields.len()).map(FieldId)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of version separators, i.e. the schema generation.
    pub fn data_version(&self) -> u32 {
        self.fields.iter().filter(|f| f.is_separator()).count() as u32
    }

    /// Copies every field value from a link of the same shape; a length
    /// mismatch leaves `self` unchanged.
    pub fn copy_from(&mut self, other: &FieldLink) {
        if self.fields.len() != other.fields.len() {
            return;
        }
        for (field, source) in self.fields.iter_mut().zip(&other.fields) {
            field.copy_from(source);
        }
    }

    /// Appends the concatenated encodings of every field, in registration
    /// order. On failure the stream is rewound to the pre-call position.
    pub fn serialize(&self, stream: &mut BitStream) -> Result<(), WriteError> {
        stream.with_rollback(|s| {
            for field in &self.fields {
                field.serialize(s)?;
            }
            Ok(())
        })
    }

    /// Appends a delta against `base`, a link of the same shape.
    pub fn serialize_diff(
        &self,
        stream: &mut BitStream,
        base: &FieldLink,
    ) -> Result<(), WriteError> {
        if self.fields.len() != base.fields.len() {
            return Err(WriteError::ShapeMismatch);
        }
        stream.with_rollback(|s| {
            for (field, base_field) in self.fields.iter().zip(&base.fields) {
                field.serialize_diff(s, base_field)?;
            }
            Ok(())
        })
    }

    /// Serializes the delta against `base` and, on success, adopts `base`'s
    /// values so the next delta is produced against the state just sent.
    pub fn serialize_diff_and_copy(
        &mut self,
        stream: &mut BitStream,
        base: &FieldLink,
    ) -> Result<(), WriteError> {
        self.serialize_diff(stream, base)?;
        self.copy_from(base);
        Ok(())
    }

    /// Decodes a full encoding into the fields, in order.
    ///
    /// A version separator that fails to decode ends the walk successfully:
    /// the payload came from an older schema generation and the remaining
    /// fields keep their values, with the cursor left just before the
    /// separator's position. Any other field failure rewinds the cursor to
    /// the pre-call position and reports the error; fields decoded before
    /// the failing one keep their decoded values. Callers that need
    /// whole-record atomicity decode into a scratch record and
    /// [`FieldLink::copy_from`] on success.
    pub fn deserialize(&mut self, stream: &mut BitStream) -> Result<(), ReadError> {
        let start = stream.tell();
        for field in &mut self.fields {
            if let Err(err) = field.deserialize(stream) {
                if field.is_separator() {
                    return Ok(());
                }
                stream.seek(start);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Decodes a delta encoding, applying each field's delta in place. The
    /// version-separator rule matches [`FieldLink::deserialize`].
    pub fn deserialize_diff(&mut self, stream: &mut BitStream) -> Result<(), ReadError> {
        let start = stream.tell();
        for field in &mut self.fields {
            if let Err(err) = field.deserialize_diff(stream) {
                if field.is_separator() {
                    return Ok(());
                }
                stream.seek(start);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Upper bound in bits for a full encoding of this link.
    pub fn need_total_bits(&self) -> usize {
        let mut bits = 0;
        for field in &self.fields {
            bits += wire::BASE_BITS;
            if field.is_bool() || field.is_separator() {
                continue;
            }
            bits += wire::SIZE_BITS;
            bits += field.array_len() * field.byte_size() * 8;
            if field.array_len() > 1 {
                // Element count byte.
                bits += 8;
            } else {
                // Worst-case byte alignment padding.
                bits += 7;
            }
        }
        bits
    }

    /// Upper bound in bytes for a full encoding of this link.
    pub fn need_total_size(&self) -> usize {
        (self.need_total_bits() + 7) / 8
    }
}

impl Index<FieldId> for FieldLink {
    type Output = Field;

    fn index(&self, id: FieldId) -> &Field {
        self.field(id)
    }
}

impl IndexMut<FieldId> for FieldLink {
    fn index_mut(&mut self, id: FieldId) -> &mut Field {
        self.field_mut(id)
    }
}
