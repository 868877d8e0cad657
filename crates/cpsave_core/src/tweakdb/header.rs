//! Fixed 32-byte TweakDB header.

use crate::config::TweakDbConfig;
use crate::error::{CoreError, CoreResult};
use cpsave_codec::{Archive, ArchiveReader, ArchiveWriter};
use serde::Serialize;

/// Magic of shipped TweakDB blobs.
pub const TWEAKDB_MAGIC: u32 = 0x0bb1_db57;

/// Expected value of [`TweakDbHeader::blob_version`].
pub const BLOB_VERSION: u32 = 5;

/// Expected value of [`TweakDbHeader::parser_version`].
pub const PARSER_VERSION: u32 = 4;

/// Encoded size of the header.
pub const HEADER_SIZE: u64 = 32;

/// The header at the start of every TweakDB blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TweakDbHeader {
    /// File magic. Only checked when the config asks for it.
    pub magic: u32,
    /// Format constant, always 5.
    pub blob_version: u32,
    /// Format constant, always 4.
    pub parser_version: u32,
    /// Hash over all type names in group order. Carried through unchanged.
    pub version_hash: u32,
    /// Start of the variables section.
    pub variables_offset: u32,
    /// Start of the groups section.
    pub groups_offset: u32,
    /// Start of the inline groups section.
    pub inline_groups_offset: u32,
    /// Start of the packages section.
    pub packages_offset: u32,
}

impl TweakDbHeader {
    /// A header for an empty database whose sections all start at `offset`.
    #[must_use]
    pub fn empty(offset: u32) -> Self {
        Self {
            magic: TWEAKDB_MAGIC,
            blob_version: BLOB_VERSION,
            parser_version: PARSER_VERSION,
            version_hash: 0,
            variables_offset: offset,
            groups_offset: offset,
            inline_groups_offset: offset,
            packages_offset: offset,
        }
    }

    /// Reads the header fields. No validation happens here.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput` if fewer than 32 bytes remain.
    pub fn read(reader: &mut ArchiveReader<'_>) -> CoreResult<Self> {
        let mut header = Self::empty(0);
        header.visit(reader)?;
        Ok(header)
    }

    /// Writes the header fields.
    pub fn write(&self, writer: &mut ArchiveWriter) {
        let mut header = *self;
        // writers cannot fail
        let _ = header.visit(writer);
    }

    fn visit(&mut self, ar: &mut impl Archive) -> CoreResult<()> {
        ar.serialize_u32(&mut self.magic)?;
        ar.serialize_u32(&mut self.blob_version)?;
        ar.serialize_u32(&mut self.parser_version)?;
        ar.serialize_u32(&mut self.version_hash)?;
        for offset in self.section_offsets_mut() {
            ar.serialize_u32(offset)?;
        }
        Ok(())
    }

    /// The four section offsets in file order.
    #[must_use]
    pub fn section_offsets(&self) -> [u32; 4] {
        [
            self.variables_offset,
            self.groups_offset,
            self.inline_groups_offset,
            self.packages_offset,
        ]
    }

    pub(crate) fn section_offsets_mut(&mut self) -> [&mut u32; 4] {
        [
            &mut self.variables_offset,
            &mut self.groups_offset,
            &mut self.inline_groups_offset,
            &mut self.packages_offset,
        ]
    }

    /// Checks format constants and section offset ordering.
    ///
    /// `base` is the absolute offset the header was read from; error offsets
    /// point at the offending field.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` for a wrong magic or format constant and
    /// `StructuralValidation` for out-of-order or out-of-range offsets.
    pub fn validate(&self, base: u64, blob_size: u64, config: &TweakDbConfig) -> CoreResult<()> {
        if let Some(expected) = config.expected_magic {
            if self.magic != expected {
                return Err(CoreError::unsupported(
                    base,
                    format!("magic {:#010x}, expected {expected:#010x}", self.magic),
                ));
            }
        }
        if self.blob_version != BLOB_VERSION {
            return Err(CoreError::unsupported(
                base + 4,
                format!("blob version {}, expected {BLOB_VERSION}", self.blob_version),
            ));
        }
        if self.parser_version != PARSER_VERSION {
            return Err(CoreError::unsupported(
                base + 8,
                format!("parser version {}, expected {PARSER_VERSION}", self.parser_version),
            ));
        }

        const NAMES: [&str; 4] = ["variables", "groups", "inline groups", "packages"];
        let offsets = self.section_offsets();
        for i in 1..offsets.len() {
            if offsets[i - 1] > offsets[i] {
                return Err(CoreError::structural(
                    base + 16 + 4 * i as u64,
                    format!(
                        "{} offset {:#x} precedes {} offset {:#x}",
                        NAMES[i],
                        offsets[i],
                        NAMES[i - 1],
                        offsets[i - 1]
                    ),
                ));
            }
        }
        if u64::from(self.packages_offset) > blob_size {
            return Err(CoreError::structural(
                base + 28,
                format!(
                    "packages offset {:#x} beyond blob size {blob_size:#x}",
                    self.packages_offset
                ),
            ));
        }
        Ok(())
    }
}
