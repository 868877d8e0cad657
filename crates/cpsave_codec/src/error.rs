//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while reading or writing an archive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The stream ended before a read completed.
    #[error("truncated input at offset {offset:#x}: need {need} bytes, have {have}")]
    TruncatedInput {
        /// Absolute offset of the read that failed.
        offset: u64,
        /// Bytes requested.
        need: u64,
        /// Bytes left in the stream.
        have: u64,
    },

    /// String bytes could not be converted to text.
    #[error("string encoding error at offset {offset:#x}: {message}")]
    Encoding {
        /// Absolute offset of the string's length prefix.
        offset: u64,
        /// Description of the encoding error.
        message: String,
    },

    /// The magnitude does not fit in the 35 bits a packed integer carries.
    #[error("packed integer overflow: {value} does not fit in 35 bits")]
    PackedIntOverflow {
        /// The value that was being encoded.
        value: i64,
    },
}

impl CodecError {
    /// Create an encoding error.
    pub fn encoding(offset: u64, message: impl Into<String>) -> Self {
        Self::Encoding {
            offset,
            message: message.into(),
        }
    }

    /// Returns the stream offset the error refers to, if any.
    #[must_use]
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::TruncatedInput { offset, .. } | Self::Encoding { offset, .. } => Some(*offset),
            Self::PackedIntOverflow { .. } => None,
        }
    }
}
