//! Record-level composition of fields into versioned composites.
//!
//! A record type owns one [`FieldLink`] and the [`FieldId`] handles it got
//! back while registering fields in construction order. Extending a schema
//! means re-registering the previous generation's fields, adding a
//! [`Field::version`] marker, then the new fields:
//!
//! ```
//! use bitrec::field::Field;
//! use bitrec::link::{FieldId, FieldLink};
//! use bitrec::record::Record;
//!
//! struct Player {
//!     link: FieldLink,
//!     enabled: FieldId,
//!     count: FieldId,
//! }
//!
//! impl Player {
//!     fn new() -> Self {
//!         let mut link = FieldLink::new();
//!         let enabled = link.add(Field::bool(false));
//!         let count = link.add(Field::u32(1000));
//!         Self { link, enabled, count }
//!     }
//! }
//!
//! impl Record for Player {
//!     fn link(&self) -> &FieldLink {
//!         &self.link
//!     }
//!
//!     fn link_mut(&mut self) -> &mut FieldLink {
//!         &mut self.link
//!     }
//! }
//!
//! let player = Player::new();
//! assert_eq!(player.data_version(), 0);
//! assert_eq!(player.link()[player.count].as_u32(), Some(1000));
//! # let _ = player.enabled;
//! ```

use crate::errors::{ReadError, WriteError};
use crate::link::FieldLink;
use crate::stream::BitStream;

/// A composite of fields with full and delta codec operations.
///
/// Implementors supply the link accessors; every operation is provided.
pub trait Record {
    fn link(&self) -> &FieldLink;

    fn link_mut(&mut self) -> &mut FieldLink;

    /// Schema generation: the number of version separators registered.
    fn data_version(&self) -> u32 {
        self.link().data_version()
    }

    /// Upper bound in bytes for a full encoding of this record.
    fn need_total_size(&self) -> usize {
        self.link().need_total_size()
    }

    fn serialize(&self, stream: &mut BitStream) -> Result<(), WriteError> {
        self.link().serialize(stream)
    }

    fn serialize_diff(&self, stream: &mut BitStream, base: &Self) -> Result<(), WriteError>
    where
        Self: Sized,
    {
        self.link().serialize_diff(stream, base.link())
    }

    /// Serializes the delta against `base` and adopts its values on
    /// success, priming this record for the next delta.
    fn serialize_diff_and_copy(
        &mut self,
        stream: &mut BitStream,
        base: &Self,
    ) -> Result<(), WriteError>
    where
        Self: Sized,
    {
        self.link_mut().serialize_diff_and_copy(stream, base.link())
    }

    fn deserialize(&mut self, stream: &mut BitStream) -> Result<(), ReadError> {
        self.link_mut().deserialize(stream)
    }

    fn deserialize_diff(&mut self, stream: &mut BitStream) -> Result<(), ReadError> {
        self.link_mut().deserialize_diff(stream)
    }

    fn equal(&self, other: &Self) -> bool
    where
        Self: Sized,
    {
        self.link() == other.link()
    }

    fn copy_from(&mut self, other: &Self)
    where
        Self: Sized,
    {
        self.link_mut().copy_from(other.link());
    }
}
