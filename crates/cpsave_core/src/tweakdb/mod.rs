//! TweakDB blob model.
//!
//! A blob is laid out as:
//!
//! ```text
//! header (32 bytes)
//! descriptor count (u32)
//! descriptors (count * 12 bytes)
//! pool payloads, back to back
//! trailing sections (variables, groups, inline groups, packages)
//! ```
//!
//! Only the pools are decoded. The trailing sections are carried verbatim,
//! and their header offsets are rebased when the pool region changes size.

mod descriptor;
mod header;
mod loader;
mod pool;

pub use descriptor::{PoolDescriptor, DESCRIPTOR_SIZE};
pub use header::{TweakDbHeader, BLOB_VERSION, HEADER_SIZE, PARSER_VERSION, TWEAKDB_MAGIC};
pub use loader::{LoadFailure, LoadState, TweakDbLoader};
pub use pool::{Pool, PoolKind, RecordLayout};

use crate::config::TweakDbConfig;
use crate::error::{CoreError, CoreResult};
use crate::names::{CName, NameRegistry};
use cpsave_codec::{Archive, ArchiveReader, ArchiveWriter};
use cpsave_storage::StorageBackend;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Offset of the first descriptor.
const DESCRIPTORS_START: u64 = HEADER_SIZE + 4;

/// A decoded TweakDB blob.
#[derive(Debug, Clone)]
pub struct TweakDb {
    header: TweakDbHeader,
    descriptors: Vec<PoolDescriptor>,
    type_names: Vec<Option<Arc<str>>>,
    pools: Vec<Pool>,
    trailing: Vec<u8>,
    /// End of the pool region as last read or written.
    pools_end: u64,
}

impl TweakDb {
    /// An empty database with no pools and empty sections.
    #[must_use]
    pub fn new() -> Self {
        Self {
            header: TweakDbHeader::empty(DESCRIPTORS_START as u32),
            descriptors: Vec::new(),
            type_names: Vec::new(),
            pools: Vec::new(),
            trailing: Vec::new(),
            pools_end: DESCRIPTORS_START,
        }
    }

    /// Decodes a whole blob.
    ///
    /// Descriptor type names are resolved through `registry`. Once every
    /// pool has decoded, ids it has not seen are registered anonymously.
    ///
    /// # Errors
    ///
    /// Returns the first truncation, structural, format or encoding error,
    /// with the absolute offset at which it was detected.
    pub fn read(data: &[u8], registry: &NameRegistry, config: &TweakDbConfig) -> CoreResult<Self> {
        let blob_size = data.len() as u64;
        let mut reader = ArchiveReader::new(data);

        debug!(blob_size, "reading header");
        let header = TweakDbHeader::read(&mut reader)?;
        header.validate(0, blob_size, config)?;

        let count_pos = reader.position();
        let count = reader.read_u32()?;
        if count > config.max_pools {
            return Err(CoreError::structural(
                count_pos,
                format!("{count} pools exceeds the limit of {}", config.max_pools),
            ));
        }
        if u64::from(count) * DESCRIPTOR_SIZE > reader.remaining_len() as u64 {
            return Err(CoreError::structural(
                count_pos,
                format!(
                    "{count} descriptors do not fit in the {} remaining bytes",
                    reader.remaining_len()
                ),
            ));
        }

        debug!(offset = reader.position(), count, "reading descriptors");
        let descriptors = PoolDescriptor::read_table(&mut reader, count)?;

        let mut type_names = Vec::with_capacity(descriptors.len());
        let mut pools = Vec::with_capacity(descriptors.len());
        for (i, desc) in descriptors.iter().enumerate() {
            let desc_pos = DESCRIPTORS_START + i as u64 * DESCRIPTOR_SIZE;
            let start = reader.position();
            let end = start + u64::from(desc.len);
            if end > blob_size {
                return Err(CoreError::structural(
                    desc_pos,
                    format!(
                        "pool {i} spans {start:#x}..{end:#x}, beyond blob size {blob_size:#x}"
                    ),
                ));
            }

            let name = registry.resolve(desc.type_name);
            let kind = match name.as_deref().and_then(PoolKind::for_type) {
                Some(kind) => kind,
                None if config.allow_unknown_pools => {
                    warn!(
                        pool = i,
                        type_name = %registry.display_name(desc.type_name),
                        len = desc.len,
                        "keeping pool of unknown type as raw bytes"
                    );
                    PoolKind::Opaque
                }
                None => {
                    return Err(CoreError::unsupported(
                        desc_pos,
                        format!(
                            "pool {i} has unsupported type {}",
                            registry.display_name(desc.type_name)
                        ),
                    ));
                }
            };

            debug!(pool = i, offset = start, len = desc.len, ?kind, "reading pool");
            let mut payload = reader.split_off(desc.len as usize)?;
            let pool = Pool::read(&mut payload, kind, config.reject_duplicates)?;
            if !payload.is_empty() {
                return Err(CoreError::structural(
                    payload.position(),
                    format!(
                        "pool {i} leaves {} of {} payload bytes unread",
                        payload.remaining_len(),
                        desc.len
                    ),
                ));
            }

            type_names.push(name);
            pools.push(pool);
        }

        for desc in &descriptors {
            registry.register_id(desc.type_name);
        }

        let pools_end = reader.position();
        let trailing = reader.remaining_bytes().to_vec();
        debug!(offset = pools_end, len = trailing.len(), "keeping trailing sections");

        Ok(Self {
            header,
            descriptors,
            type_names,
            pools,
            trailing,
            pools_end,
        })
    }

    /// Encodes the blob.
    ///
    /// Descriptor lengths are recomputed from the pools and section offsets
    /// behind the pool region move with it.
    ///
    /// # Errors
    ///
    /// Fails if a pool cannot be encoded or the blob outgrows 32-bit offsets.
    pub fn write(&self) -> CoreResult<Vec<u8>> {
        let mut payloads = Vec::with_capacity(self.pools.len());
        for pool in &self.pools {
            let mut writer = ArchiveWriter::new();
            pool.write(&mut writer)?;
            payloads.push(writer.into_bytes());
        }

        let mut descriptors = self.descriptors.clone();
        for (i, (desc, payload)) in descriptors.iter_mut().zip(&payloads).enumerate() {
            desc.len = u32::try_from(payload.len()).map_err(|_| {
                CoreError::structural(
                    DESCRIPTORS_START + i as u64 * DESCRIPTOR_SIZE,
                    format!("pool {i} payload of {} bytes", payload.len()),
                )
            })?;
        }

        let pools_end = DESCRIPTORS_START
            + descriptors.len() as u64 * DESCRIPTOR_SIZE
            + payloads.iter().map(|p| p.len() as u64).sum::<u64>();
        let header = self.rebased_header(pools_end)?;

        let total = pools_end as usize + self.trailing.len();
        let mut writer = ArchiveWriter::with_capacity(total);
        header.write(&mut writer);
        writer.write_u32(descriptors.len() as u32);
        PoolDescriptor::write_table(&descriptors, &mut writer);
        for payload in &payloads {
            writer.write_bytes(payload);
        }
        writer.write_bytes(&self.trailing);

        debug!(len = writer.len(), pools = descriptors.len(), "encoded tweakdb");
        Ok(writer.into_vec())
    }

    /// Encodes the blob into an empty `backend` and syncs it. Returns the
    /// byte count.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the backend already holds data, or
    /// propagates encoding and storage errors.
    pub fn write_to(&self, backend: &mut dyn StorageBackend) -> CoreResult<u64> {
        let existing = backend.size()?;
        if existing != 0 {
            return Err(CoreError::InvalidOperation(format!(
                "backend already holds {existing} bytes"
            )));
        }
        let bytes = self.write()?;
        backend.append(&bytes)?;
        backend.flush()?;
        backend.sync()?;
        Ok(bytes.len() as u64)
    }

    fn rebased_header(&self, pools_end: u64) -> CoreResult<TweakDbHeader> {
        let mut header = self.header;
        for offset in header.section_offsets_mut() {
            // an offset inside the pool region may not pass the new end
            if u64::from(*offset) < self.pools_end {
                if u64::from(*offset) > pools_end {
                    *offset = pools_end as u32;
                }
                continue;
            }
            let moved = u64::from(*offset) + pools_end - self.pools_end;
            *offset = u32::try_from(moved).map_err(|_| {
                CoreError::structural(0, format!("section offset {moved:#x} exceeds 32 bits"))
            })?;
        }
        Ok(header)
    }

    /// Appends an empty pool for `type_name` and returns its index.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPoolType` if no decoder exists for the type.
    pub fn add_pool(&mut self, registry: &NameRegistry, type_name: &str) -> CoreResult<usize> {
        let kind = PoolKind::for_type(type_name).ok_or_else(|| CoreError::UnknownPoolType {
            name: type_name.to_string(),
        })?;
        let id = registry.register_name(type_name);

        self.descriptors.push(PoolDescriptor {
            type_name: id,
            len: 0,
        });
        self.type_names.push(Some(Arc::from(type_name)));
        self.pools.push(Pool::empty(kind));
        Ok(self.pools.len() - 1)
    }

    /// The header as read. Offsets are rebased only when writing.
    #[must_use]
    pub fn header(&self) -> &TweakDbHeader {
        &self.header
    }

    /// The descriptor table as read.
    #[must_use]
    pub fn descriptors(&self) -> &[PoolDescriptor] {
        &self.descriptors
    }

    /// All pools in file order.
    #[must_use]
    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    /// Pool at `idx`.
    #[must_use]
    pub fn pool(&self, idx: usize) -> Option<&Pool> {
        self.pools.get(idx)
    }

    /// Mutable pool at `idx`.
    pub fn pool_mut(&mut self, idx: usize) -> Option<&mut Pool> {
        self.pools.get_mut(idx)
    }

    /// First pool whose type is `type_name`.
    #[must_use]
    pub fn pool_by_type(&self, type_name: &str) -> Option<&Pool> {
        let id = CName::from_name(type_name);
        self.descriptors
            .iter()
            .position(|desc| desc.type_name == id)
            .and_then(|idx| self.pools.get(idx))
    }

    /// Resolved type name of pool `idx`, if known.
    #[must_use]
    pub fn type_name(&self, idx: usize) -> Option<&str> {
        self.type_names.get(idx)?.as_deref()
    }

    /// Bytes after the pool region.
    #[must_use]
    pub fn trailing(&self) -> &[u8] {
        &self.trailing
    }

    /// Number of pools.
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    pub(crate) fn log_loaded(&self, blob_size: u64) {
        info!(
            pools = self.pools.len(),
            blob_size,
            trailing = self.trailing.len(),
            "tweakdb loaded"
        );
    }
}

impl Default for TweakDb {
    fn default() -> Self {
        Self::new()
    }
}
