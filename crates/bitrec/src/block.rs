//! Length-prefixed block codec for arrays of packed bit-field structs.
//!
//! Separate from the field model: elements are fixed-layout `#[repr(C)]`
//! structs whose size is a multiple of 4 bytes and at most 32 bytes,
//! written as raw 32-bit words. The header is self-describing enough for a
//! reader whose element layout grew or shrank by whole words to consume the
//! common prefix of every element.

use core::mem;

use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::errors::{ReadError, WriteError};
use crate::stream::BitStream;

/// Bits of header in front of a block body.
pub const BLOCK_HEADER_BITS: usize = 3 + 13;

/// Most elements a single block can carry (13-bit count field).
pub const MAX_BLOCK_ELEMENTS: usize = (1 << 13) - 1;

const WORD_BYTES: usize = 4;

/// Writes `items` as one block: a 3-bit word count (`size/4 - 1`), a 13-bit
/// element count, then every element as consecutive 32-bit words.
pub fn write_blocks<T>(stream: &mut BitStream, items: &[T]) -> Result<(), WriteError>
where
    T: IntoBytes + Immutable,
{
    const {
        assert!(mem::size_of::<T>() % WORD_BYTES == 0);
        assert!(mem::size_of::<T>() > 0 && mem::size_of::<T>() <= 32);
    }
    if items.len() > MAX_BLOCK_ELEMENTS {
        return Err(WriteError::TooManyElements);
    }

    let words = mem::size_of::<T>() / WORD_BYTES;
    stream.with_rollback(|s| {
        s.write_bits((words - 1) as u64, 3)?;
        s.write_bits(items.len() as u64, 13)?;

        let bytes = items.as_bytes();
        if mem::size_of::<T>() % 8 == 0 {
            for chunk in bytes.chunks_exact(8) {
                s.write_bits(u64::from_le_bytes(chunk.try_into().unwrap()), 64)?;
            }
        } else {
            for chunk in bytes.chunks_exact(WORD_BYTES) {
                s.write_bits(u32::from_le_bytes(chunk.try_into().unwrap()) as u64, 32)?;
            }
        }
        Ok(())
    })
}

/// Reads a block written by [`write_blocks`] into `items`, adapting between
/// the writer's element width and the reader's.
///
/// Per element, only the words both sides share are transferred: a writer
/// with wider elements has its trailing words skipped, a reader with wider
/// elements keeps its trailing bytes untouched. At most `items.len()`
/// elements are decoded; a longer block's remaining elements are left
/// unconsumed. Returns the decoded element count.
pub fn read_blocks<T>(stream: &mut BitStream, items: &mut [T]) -> Result<usize, ReadError>
where
    T: FromBytes + IntoBytes,
{
    const {
        assert!(mem::size_of::<T>() % WORD_BYTES == 0);
        assert!(mem::size_of::<T>() > 0);
    }

    stream.with_rollback(|s| {
        let wire_words = s.read_bits(3)? as usize + 1;
        let wire_count = s.read_bits(13)? as usize;

        let count = wire_count.min(items.len());
        let dest_words = mem::size_of::<T>() / WORD_BYTES;
        let shared_words = dest_words.min(wire_words);
        let skip_bits = (wire_words - shared_words) * 32;

        for item in items[..count].iter_mut() {
            let bytes = item.as_mut_bytes();
            for word in 0..shared_words {
                let value = s.read_bits(32)? as u32;
                bytes[word * WORD_BYTES..(word + 1) * WORD_BYTES]
                    .copy_from_slice(&value.to_le_bytes());
            }
            if skip_bits > 0 {
                s.seek(s.tell() + skip_bits);
            }
        }
        Ok(count)
    })
}
