//! Deduplicating string arena.
//!
//! Strings are copied into fixed-capacity blocks that are only ever
//! appended, never resized or compacted. An entry is a `(block, start, len)`
//! span resolved against the pool, so an index handed out by
//! [`StringPool::register`] keeps naming the same bytes for the pool's whole
//! lifetime.

use crate::error::{CoreError, CoreResult};
use cpsave_codec::{ArchiveReader, ArchiveWriter};
use std::collections::HashMap;
use std::hash::{BuildHasher, RandomState};

/// Capacity of one arena block in bytes.
pub const BLOCK_SIZE: usize = 0x10000;

/// Longest string the packed descriptor table can describe.
pub const MAX_DESCRIBED_LEN: usize = 0xff;

const DESC_OFFSET_MASK: u32 = 0x00ff_ffff;
const DESC_LEN_SHIFT: u32 = 24;
const DESC_SIZE: u32 = 4;

#[derive(Debug, Clone, Copy)]
struct Span {
    block: u32,
    start: u32,
    len: u32,
}

/// An append-only, deduplicating table of strings.
///
/// ```rust
/// use cpsave_core::StringPool;
///
/// let mut pool = StringPool::new();
/// let a = pool.register("Items.Preset_Katana").unwrap();
/// let b = pool.register("Items.Preset_Katana").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(pool.at(a), Some("Items.Preset_Katana"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    blocks: Vec<String>,
    spans: Vec<Span>,
    // content hash -> indices with that hash
    lookup: HashMap<u64, Vec<u32>>,
    hasher: RandomState,
}

impl StringPool {
    /// Creates an empty pool. No block is allocated until the first string.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether the pool holds no strings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Number of arena blocks allocated so far.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Whether `s` has been registered.
    #[must_use]
    pub fn has_string(&self, s: &str) -> bool {
        self.find(s).is_some()
    }

    /// Returns the index of `s` if it has been registered.
    #[must_use]
    pub fn find(&self, s: &str) -> Option<usize> {
        let hash = self.hasher.hash_one(s);
        self.lookup
            .get(&hash)?
            .iter()
            .map(|&idx| idx as usize)
            .find(|&idx| self.at(idx) == Some(s))
    }

    /// Returns the string at `idx` without copying.
    #[must_use]
    pub fn at(&self, idx: usize) -> Option<&str> {
        let span = self.spans.get(idx)?;
        let start = span.start as usize;
        self.blocks
            .get(span.block as usize)?
            .get(start..start + span.len as usize)
    }

    /// Iterates the strings in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.len()).filter_map(|idx| self.at(idx))
    }

    /// Registers `s`, returning its index.
    ///
    /// An equal string already in the pool returns its existing index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::StringTooLong`] if `s` does not fit in a block;
    /// the pool is left unchanged.
    pub fn register(&mut self, s: &str) -> CoreResult<usize> {
        if let Some(idx) = self.find(s) {
            return Ok(idx);
        }
        if s.len() > BLOCK_SIZE {
            return Err(CoreError::StringTooLong {
                len: s.len(),
                max: BLOCK_SIZE,
            });
        }

        let needs_block = self
            .blocks
            .last()
            .map_or(true, |block| block.len() + s.len() > BLOCK_SIZE);
        if needs_block {
            self.blocks.push(String::with_capacity(BLOCK_SIZE));
        }

        let block_idx = self.blocks.len() - 1;
        let block = &mut self.blocks[block_idx];
        let start = block.len();
        block.push_str(s);

        let idx = self.spans.len();
        self.spans.push(Span {
            block: block_idx as u32,
            start: start as u32,
            len: s.len() as u32,
        });
        let hash = self.hasher.hash_one(s);
        self.lookup.entry(hash).or_default().push(idx as u32);

        Ok(idx)
    }

    /// Replaces the pool's contents with a descriptor table and string data
    /// read from `reader`.
    ///
    /// The table is `descs_size` bytes of little-endian `u32` descriptors,
    /// each packing a 24-bit offset and an 8-bit length. Offsets count from
    /// `descs_offset`, the position assigned to the start of the table, so
    /// the string data block begins at offset `descs_offset + descs_size`.
    /// The `pool_size`-byte data block follows the table and is consumed
    /// whole.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput` if the reader runs out, `StructuralValidation`
    /// for misaligned tables, out-of-range spans or repeated strings, and
    /// `Encoding` for bytes that are not UTF-8. On error the pool is unchanged.
    pub fn serialize_in(
        &mut self,
        reader: &mut ArchiveReader<'_>,
        descs_size: u32,
        pool_size: u32,
        descs_offset: u32,
    ) -> CoreResult<()> {
        let table_pos = cpsave_codec::Archive::position(reader);
        if descs_size % DESC_SIZE != 0 {
            return Err(CoreError::structural(
                table_pos,
                format!("descriptor table size {descs_size} is not a multiple of {DESC_SIZE}"),
            ));
        }

        let mut table = reader.split_off(descs_size as usize)?;
        let data_pos = cpsave_codec::Archive::position(reader);
        let data = reader.read_bytes(pool_size as usize)?;
        let data_base = u64::from(descs_offset) + u64::from(descs_size);

        let mut pool = Self::new();
        for expected_idx in 0..(descs_size / DESC_SIZE) as usize {
            let desc_pos = cpsave_codec::Archive::position(&table);
            let desc = table.read_u32()?;
            let offset = u64::from(desc & DESC_OFFSET_MASK);
            let len = (desc >> DESC_LEN_SHIFT) as usize;

            let start = offset
                .checked_sub(data_base)
                .map(|start| start as usize)
                .filter(|&start| start + len <= data.len())
                .ok_or_else(|| {
                    CoreError::structural(
                        desc_pos,
                        format!("string span {offset:#x}+{len} lies outside the data block"),
                    )
                })?;

            let text = std::str::from_utf8(&data[start..start + len]).map_err(|e| {
                CoreError::encoding(data_pos + start as u64, format!("invalid UTF-8: {e}"))
            })?;

            if pool.register(text)? != expected_idx {
                return Err(CoreError::structural(
                    desc_pos,
                    format!("string {text:?} appears twice"),
                ));
            }
        }

        *self = pool;
        Ok(())
    }

    /// Writes the descriptor table and string data, the mirror of
    /// [`serialize_in`](Self::serialize_in).
    ///
    /// Returns `(descs_size, pool_size)`.
    ///
    /// # Errors
    ///
    /// Returns `StructuralValidation` if a string is longer than
    /// [`MAX_DESCRIBED_LEN`] or an offset does not fit in 24 bits. Nothing
    /// is written on error.
    pub fn serialize_out(
        &self,
        writer: &mut ArchiveWriter,
        descs_offset: u32,
    ) -> CoreResult<(u32, u32)> {
        let too_large = || CoreError::structural(writer.len() as u64, "string pool too large");
        let descs_size = u32::try_from(self.len() * DESC_SIZE as usize).map_err(|_| too_large())?;
        let data_base = u64::from(descs_offset) + u64::from(descs_size);

        let mut table = Vec::with_capacity(self.len());
        let mut data_len = 0u64;
        for text in self.iter() {
            if text.len() > MAX_DESCRIBED_LEN {
                return Err(CoreError::structural(
                    writer.len() as u64,
                    format!(
                        "string of {} bytes exceeds the {MAX_DESCRIBED_LEN} byte descriptor limit",
                        text.len()
                    ),
                ));
            }
            let offset = data_base + data_len;
            if offset > u64::from(DESC_OFFSET_MASK) {
                return Err(too_large());
            }
            table.push(offset as u32 | ((text.len() as u32) << DESC_LEN_SHIFT));
            data_len += text.len() as u64;
        }
        let pool_size = u32::try_from(data_len).map_err(|_| too_large())?;

        for desc in table {
            writer.write_u32(desc);
        }
        for text in self.iter() {
            writer.write_bytes(text.as_bytes());
        }
        Ok((descs_size, pool_size))
    }

    /// Reads a TweakDB string pool payload: a `u32` count followed by that
    /// many length-prefixed strings.
    ///
    /// With `reject_duplicates` a repeated string is a structural error;
    /// otherwise it is dropped.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput`, `Encoding` or `StructuralValidation` errors
    /// with the offset of the offending element.
    pub fn read_payload(reader: &mut ArchiveReader<'_>, reject_duplicates: bool) -> CoreResult<Self> {
        let count_pos = cpsave_codec::Archive::position(reader);
        let count = reader.read_u32()? as usize;
        // every element takes at least its one-byte length prefix
        if count > reader.remaining_len() {
            return Err(CoreError::structural(
                count_pos,
                format!(
                    "{count} strings declared but only {} bytes remain",
                    reader.remaining_len()
                ),
            ));
        }

        let mut pool = Self::new();
        for _ in 0..count {
            let pos = cpsave_codec::Archive::position(reader);
            let text = reader.read_string()?;
            let before = pool.len();
            if pool.register(&text)? < before && reject_duplicates {
                return Err(CoreError::structural(
                    pos,
                    format!("string {text:?} appears twice"),
                ));
            }
        }
        Ok(pool)
    }

    /// Writes the pool as a TweakDB payload.
    ///
    /// # Errors
    ///
    /// Fails only if a string is too long for its packed length prefix.
    pub fn write_payload(&self, writer: &mut ArchiveWriter) -> CoreResult<()> {
        let count = u32::try_from(self.len())
            .map_err(|_| CoreError::structural(writer.len() as u64, "too many strings"))?;
        writer.write_u32(count);
        for text in self.iter() {
            writer.write_string(text)?;
        }
        Ok(())
    }
}
