//! Pool descriptor table.

use crate::error::{CoreError, CoreResult};
use crate::names::CName;
use cpsave_codec::{ArchiveReader, ArchiveWriter};
use serde::Serialize;

/// Encoded size of one descriptor.
pub const DESCRIPTOR_SIZE: u64 = 12;

/// Names the type of one pool and the byte length of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolDescriptor {
    /// Type name hash of the pool's values.
    pub type_name: CName,
    /// Payload length in bytes.
    pub len: u32,
}

impl PoolDescriptor {
    /// Reads `count` descriptors as one contiguous block.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedInput` if the table runs past the end of input.
    pub fn read_table(reader: &mut ArchiveReader<'_>, count: u32) -> CoreResult<Vec<Self>> {
        let size = u64::from(count) * DESCRIPTOR_SIZE;
        let size = usize::try_from(size).map_err(|_| {
            CoreError::structural(
                cpsave_codec::Archive::position(reader),
                format!("descriptor table of {size} bytes"),
            )
        })?;
        let mut table = reader.split_off(size)?;

        let mut descriptors = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let type_name = CName::from_hash(table.read_u64()?);
            let len = table.read_u32()?;
            descriptors.push(Self { type_name, len });
        }
        Ok(descriptors)
    }

    /// Writes the table.
    pub fn write_table(descriptors: &[Self], writer: &mut ArchiveWriter) {
        for desc in descriptors {
            writer.write_u64(desc.type_name.as_u64());
            writer.write_u32(desc.len);
        }
    }
}
