//! # bitrec
//!
//! A compact, self-describing bit codec for structured records whose field
//! layout evolves over time between producer and consumer.
//!
//! Records are ordered sequences of typed fields (booleans, fixed-width
//! numbers, bit sets, short byte strings, fixed-count number arrays)
//! punctuated by zero-width version separators. The field order *is* the
//! schema: nothing is named on the wire, and an older reader consuming a
//! newer payload stops cleanly at the first separator it does not know.
//! Every record supports a full encoding and a delta encoding against a
//! known base, sharing one discriminator scheme.
//!
//! ## Example
//!
//! ```
//! use bitrec::field::Field;
//! use bitrec::link::FieldLink;
//! use bitrec::stream::BitStream;
//!
//! let mut link = FieldLink::new();
//! let enabled = link.add(Field::bool(false));
//! let count = link.add(Field::u32(0));
//!
//! link[enabled].set_bool(true);
//! link[count].set_u32(7);
//!
//! let mut stream = BitStream::with_capacity(link.need_total_size());
//! link.serialize(&mut stream).unwrap();
//!
//! stream.reset();
//! let mut incoming = FieldLink::new();
//! incoming.add(Field::bool(false));
//! let incoming_count = incoming.add(Field::u32(0));
//! incoming.deserialize(&mut stream).unwrap();
//!
//! assert_eq!(incoming[incoming_count].as_u32(), Some(7));
//! ```

pub mod block;
pub mod errors;
pub mod field;
pub mod link;
pub mod record;
#[cfg(feature = "serde")]
pub mod serde;
pub mod stream;
pub mod wire;
