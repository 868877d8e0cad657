//! Error types for cpsave core.

use cpsave_codec::CodecError;
use serde::Serialize;
use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Coarse classification of a [`CoreError`].
///
/// A failed load reports this together with the byte offset so the caller
/// can tell which part of the file is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// The input ended before a read completed.
    TruncatedInput,
    /// A header, offset, descriptor or pool invariant does not hold.
    StructuralValidation,
    /// A format constant or pool type is not supported.
    UnsupportedFormat,
    /// String bytes could not be converted to text.
    EncodingError,
    /// The byte source itself failed.
    Io,
    /// The operation does not apply in the current state.
    InvalidOperation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TruncatedInput => "truncated input",
            Self::StructuralValidation => "structural validation",
            Self::UnsupportedFormat => "unsupported format",
            Self::EncodingError => "encoding error",
            Self::Io => "I/O",
            Self::InvalidOperation => "invalid operation",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in pool and TweakDB operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The input ended before a read completed.
    #[error("truncated input at offset {offset:#x}: need {need} bytes, have {have}")]
    TruncatedInput {
        /// Absolute offset of the failed read.
        offset: u64,
        /// Bytes requested.
        need: u64,
        /// Bytes available.
        have: u64,
    },

    /// A structural invariant was violated.
    #[error("structural validation failed at offset {offset:#x}: {message}")]
    StructuralValidation {
        /// Offset of the offending field.
        offset: u64,
        /// Description of the violation.
        message: String,
    },

    /// A format constant or pool type is not supported.
    #[error("unsupported format at offset {offset:#x}: {message}")]
    UnsupportedFormat {
        /// Offset of the offending field.
        offset: u64,
        /// Description of the mismatch.
        message: String,
    },

    /// String bytes could not be converted to text.
    #[error("string encoding error at offset {offset:#x}: {message}")]
    Encoding {
        /// Offset of the string.
        offset: u64,
        /// Description of the encoding problem.
        message: String,
    },

    /// A string does not fit in a single arena block.
    #[error("string of {len} bytes exceeds the {max} byte arena block")]
    StringTooLong {
        /// Length of the rejected string.
        len: usize,
        /// Capacity of an arena block.
        max: usize,
    },

    /// A pool was requested for a type the database cannot decode.
    #[error("unknown pool type {name:?}")]
    UnknownPoolType {
        /// The requested type name.
        name: String,
    },

    /// The operation does not apply in the current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A value could not be encoded.
    #[error("codec error: {0}")]
    Codec(CodecError),

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] cpsave_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<CodecError> for CoreError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::TruncatedInput { offset, need, have } => {
                Self::TruncatedInput { offset, need, have }
            }
            CodecError::Encoding { offset, message } => Self::Encoding { offset, message },
            other => Self::Codec(other),
        }
    }
}

impl CoreError {
    /// Creates a structural validation error.
    pub fn structural(offset: u64, message: impl Into<String>) -> Self {
        Self::StructuralValidation {
            offset,
            message: message.into(),
        }
    }

    /// Creates an unsupported format error.
    pub fn unsupported(offset: u64, message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            offset,
            message: message.into(),
        }
    }

    /// Creates an encoding error.
    pub fn encoding(offset: u64, message: impl Into<String>) -> Self {
        Self::Encoding {
            offset,
            message: message.into(),
        }
    }

    /// Classifies the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TruncatedInput { .. } => ErrorKind::TruncatedInput,
            Self::StructuralValidation { .. } | Self::StringTooLong { .. } => {
                ErrorKind::StructuralValidation
            }
            Self::UnsupportedFormat { .. } | Self::UnknownPoolType { .. } => {
                ErrorKind::UnsupportedFormat
            }
            Self::InvalidOperation(_) => ErrorKind::InvalidOperation,
            Self::Encoding { .. } => ErrorKind::EncodingError,
            Self::Codec(CodecError::TruncatedInput { .. }) => ErrorKind::TruncatedInput,
            Self::Codec(CodecError::Encoding { .. }) => ErrorKind::EncodingError,
            Self::Codec(CodecError::PackedIntOverflow { .. }) => ErrorKind::StructuralValidation,
            Self::Storage(_) | Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Byte offset the error refers to, when known.
    #[must_use]
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::TruncatedInput { offset, .. }
            | Self::StructuralValidation { offset, .. }
            | Self::UnsupportedFormat { offset, .. }
            | Self::Encoding { offset, .. } => Some(*offset),
            Self::Codec(err) => err.offset(),
            Self::StringTooLong { .. }
            | Self::UnknownPoolType { .. }
            | Self::InvalidOperation(_)
            | Self::Storage(_)
            | Self::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_errors_keep_kind_and_offset() {
        let err: CoreError = CodecError::TruncatedInput {
            offset: 12,
            need: 4,
            have: 1,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::TruncatedInput);
        assert_eq!(err.offset(), Some(12));

        let err: CoreError = CodecError::encoding(7, "bad").into();
        assert_eq!(err.kind(), ErrorKind::EncodingError);
        assert_eq!(err.offset(), Some(7));

        let err: CoreError = CodecError::PackedIntOverflow { value: 1 << 40 }.into();
        assert!(matches!(err, CoreError::Codec(_)));
        assert_eq!(err.offset(), None);
    }

    #[test]
    fn display_includes_offset() {
        let err = CoreError::structural(0x24, "groups before variables");
        assert_eq!(
            err.to_string(),
            "structural validation failed at offset 0x24: groups before variables"
        );
        assert_eq!(ErrorKind::StructuralValidation.to_string(), "structural validation");
    }
}
