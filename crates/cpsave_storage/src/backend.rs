//! Storage backend trait definition.

use crate::error::{StorageError, StorageResult};

/// Largest byte source the archive layer accepts.
///
/// TweakDB section offsets and pool lengths are 32-bit, so anything larger
/// cannot be a well-formed blob.
pub const MAX_SOURCE_SIZE: u64 = u32::MAX as u64;

/// A byte source/sink for archives.
///
/// Storage backends are **opaque byte stores**. The archive layer asks for
/// exact byte ranges, appends encoded output, and uses [`size`](Self::size)
/// as the bounds hint for validating offsets.
///
/// # Invariants
///
/// - `append` returns the offset where data was written
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `read_at` never returns fewer bytes than requested
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadPastEnd`] if the range extends beyond the
    /// current size, or an I/O error.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data to the end of the storage.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is read-only or an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Flushes pending writes to the OS.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size of the storage in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Reads the whole source.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::TooLarge`] if the source exceeds
    /// [`MAX_SOURCE_SIZE`], or any error from [`read_at`](Self::read_at).
    fn read_all(&self) -> StorageResult<Vec<u8>> {
        let size = self.size()?;
        if size > MAX_SOURCE_SIZE {
            return Err(StorageError::TooLarge {
                size,
                max: MAX_SOURCE_SIZE,
            });
        }
        self.read_at(0, size as usize)
    }
}
