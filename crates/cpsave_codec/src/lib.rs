//! # cpsave Codec
//!
//! The byte-stream archive every save-archive and TweakDB structure is
//! encoded through.
//!
//! This crate provides:
//! - [`Archive`], a bidirectional stream trait whose single primitive
//!   [`Archive::serialize`] either reads or writes a block of bytes
//! - [`ArchiveReader`] (bounds-checked, zero-copy over a slice) and
//!   [`ArchiveWriter`] (growable buffer)
//! - the packed variable-length integer codec (1 to 5 bytes, sign carried
//!   out of band)
//! - the length-prefixed string codec (negative count = raw bytes,
//!   non-negative count = UTF-16LE code units)
//!
//! ## Usage
//!
//! ```
//! use cpsave_codec::{ArchiveReader, ArchiveWriter};
//!
//! let mut writer = ArchiveWriter::new();
//! writer.write_packed_int(70).unwrap();
//! writer.write_string("TweakDBID").unwrap();
//!
//! let bytes = writer.into_vec();
//! assert_eq!(&bytes[..2], &[0x46, 0x01]);
//!
//! let mut reader = ArchiveReader::new(&bytes);
//! assert_eq!(reader.read_packed_int().unwrap(), 70);
//! assert_eq!(reader.read_string().unwrap(), "TweakDBID");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod archive;
mod error;
mod packed;
mod reader;
mod string;
mod writer;

pub use archive::Archive;
pub use error::{CodecError, CodecResult};
pub use packed::{
    decode_packed_int, decode_packed_int_with, encode_packed_int, packed_int_len, PackedInt,
    PACKED_INT_MAX_BYTES, PACKED_INT_MAX_MAGNITUDE,
};
pub use reader::ArchiveReader;
pub use string::{decode_utf16le, encode_utf16le};
pub use writer::ArchiveWriter;
