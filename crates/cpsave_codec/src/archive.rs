//! The bidirectional archive trait.

use crate::error::{CodecError, CodecResult};
use crate::packed::{decode_packed_int_with, encode_packed_int};
use crate::string::decode_utf16le;

macro_rules! serialize_le {
    ($($(#[$doc:meta])* $name:ident => $ty:ty;)*) => {
        $(
            $(#[$doc])*
            fn $name(&mut self, value: &mut $ty) -> CodecResult<()> {
                let mut bytes = value.to_le_bytes();
                self.serialize(&mut bytes)?;
                if self.is_reader() {
                    *value = <$ty>::from_le_bytes(bytes);
                }
                Ok(())
            }
        )*
    };
}

/// A byte stream that is either being read or being written.
///
/// Higher-level codecs are written once against this trait: when the archive
/// is a reader every `serialize_*` call fills its argument from the stream,
/// when it is a writer the argument is appended to the stream. Only
/// [`serialize`](Self::serialize) touches the underlying bytes, so it is the
/// single place where bounds are enforced.
///
/// ```rust
/// use cpsave_codec::{Archive, ArchiveReader, ArchiveWriter};
///
/// fn visit(ar: &mut impl Archive, count: &mut u32, name: &mut String) {
///     ar.serialize_u32(count).unwrap();
///     ar.serialize_string(name).unwrap();
/// }
///
/// let mut writer = ArchiveWriter::new();
/// visit(&mut writer, &mut 3, &mut "Vector3".to_string());
///
/// let bytes = writer.into_vec();
/// let mut reader = ArchiveReader::new(&bytes);
/// let (mut count, mut name) = (0, String::new());
/// visit(&mut reader, &mut count, &mut name);
/// assert_eq!((count, name.as_str()), (3, "Vector3"));
/// ```
pub trait Archive {
    /// True if this archive reads from its stream.
    fn is_reader(&self) -> bool;

    /// Absolute stream position of the next byte.
    fn position(&self) -> u64;

    /// Bytes left to read, or `None` for writers.
    fn remaining(&self) -> Option<u64>;

    /// Fill `buf` from the stream (reading) or append it (writing).
    ///
    /// # Errors
    ///
    /// Readers return [`CodecError::TruncatedInput`] without consuming
    /// anything if fewer than `buf.len()` bytes remain.
    fn serialize(&mut self, buf: &mut [u8]) -> CodecResult<()>;

    serialize_le! {
        /// Serialize a byte.
        serialize_u8 => u8;
        /// Serialize a little-endian `u16`.
        serialize_u16 => u16;
        /// Serialize a little-endian `u32`.
        serialize_u32 => u32;
        /// Serialize a little-endian `u64`.
        serialize_u64 => u64;
        /// Serialize a little-endian `i32`.
        serialize_i32 => i32;
        /// Serialize a little-endian `f32`.
        serialize_f32 => f32;
    }

    /// Serialize a packed variable-length integer.
    ///
    /// # Errors
    ///
    /// Readers fail with [`CodecError::TruncatedInput`] if the stream ends
    /// mid-integer; writers fail with [`CodecError::PackedIntOverflow`] if
    /// the value needs more than 35 bits.
    fn serialize_packed_int(&mut self, value: &mut i64) -> CodecResult<()> {
        if self.is_reader() {
            *value = decode_packed_int_with(|| {
                let mut byte = [0u8; 1];
                self.serialize(&mut byte)?;
                Ok(byte[0])
            })?;
            Ok(())
        } else {
            let packed = encode_packed_int(*value)?;
            let mut bytes = [0u8; crate::PACKED_INT_MAX_BYTES];
            bytes[..packed.len()].copy_from_slice(packed.as_bytes());
            self.serialize(&mut bytes[..packed.len()])
        }
    }

    /// Serialize a length-prefixed string.
    ///
    /// Reading accepts both wire forms; writing always emits the raw-byte
    /// form with a negative count.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TruncatedInput`] if the declared length runs past
    /// the stream, or [`CodecError::Encoding`] if the bytes are not valid
    /// UTF-8 (raw form) or UTF-16 (wide form).
    fn serialize_string(&mut self, text: &mut String) -> CodecResult<()> {
        if self.is_reader() {
            *text = read_prefixed_string(self, None)?;
            Ok(())
        } else {
            let len = i64::try_from(text.len())
                .map_err(|_| CodecError::encoding(self.position(), "string too long"))?;
            let mut count = -len;
            self.serialize_packed_int(&mut count)?;
            if len > 0 {
                let mut bytes = text.as_bytes().to_vec();
                self.serialize(&mut bytes)?;
            }
            Ok(())
        }
    }
}

/// Read a length-prefixed string, optionally capping its decoded size.
pub(crate) fn read_prefixed_string<A>(ar: &mut A, max_bytes: Option<usize>) -> CodecResult<String>
where
    A: Archive + ?Sized,
{
    let start = ar.position();
    let mut count = 0i64;
    ar.serialize_packed_int(&mut count)?;

    let wide = count >= 0;
    let byte_len = if wide {
        count.unsigned_abs() * 2
    } else {
        count.unsigned_abs()
    };

    if let Some(max) = max_bytes {
        // every UTF-16 unit decodes to at least one byte
        let limit = if wide { max as u64 * 2 } else { max as u64 };
        if byte_len > limit {
            return Err(CodecError::encoding(
                start,
                format!("string of {byte_len} bytes exceeds the {max} byte limit"),
            ));
        }
    }

    if let Some(have) = ar.remaining() {
        if byte_len > have {
            return Err(CodecError::TruncatedInput {
                offset: ar.position(),
                need: byte_len,
                have,
            });
        }
    }

    let len = usize::try_from(byte_len).map_err(|_| CodecError::TruncatedInput {
        offset: ar.position(),
        need: byte_len,
        have: ar.remaining().unwrap_or(0),
    })?;
    let mut bytes = vec![0u8; len];
    ar.serialize(&mut bytes)?;

    let text = if wide {
        decode_utf16le(&bytes).map_err(|message| CodecError::encoding(start, message))?
    } else {
        String::from_utf8(bytes)
            .map_err(|e| CodecError::encoding(start, format!("invalid UTF-8: {e}")))?
    };

    if let Some(max) = max_bytes {
        if text.len() > max {
            return Err(CodecError::encoding(
                start,
                format!("string of {} bytes exceeds the {max} byte limit", text.len()),
            ));
        }
    }

    Ok(text)
}
