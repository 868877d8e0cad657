//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of the byte source.
    #[error("read beyond end of storage: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current storage size.
        size: u64,
    },

    /// The backend was opened read-only and cannot accept writes.
    #[error("storage is read-only")]
    ReadOnly,

    /// The source is larger than the archive layer can address.
    #[error("storage too large: {size} bytes exceeds the {max} byte limit")]
    TooLarge {
        /// The size of the source.
        size: u64,
        /// The largest supported size.
        max: u64,
    },
}
