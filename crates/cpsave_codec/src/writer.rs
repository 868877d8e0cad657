//! Archive writer backed by a growable buffer.

use crate::archive::Archive;
use crate::error::CodecResult;
use crate::packed::encode_packed_int;
use bytes::{BufMut, Bytes, BytesMut};

/// A writing archive.
///
/// Output accumulates in memory; callers hand the finished bytes to a
/// storage backend once the whole blob has been encoded, so a failed encode
/// never leaves a half-written file behind.
#[derive(Debug, Default, Clone)]
pub struct ArchiveWriter {
    buffer: BytesMut,
}

impl ArchiveWriter {
    /// Create an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The bytes written so far.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the writer and return its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }

    /// Consume the writer and return its bytes as a vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buffer.to_vec()
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.put_slice(bytes);
    }

    /// Append a byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.put_u8(value);
    }

    /// Append a little-endian `u16`.
    pub fn write_u16(&mut self, value: u16) {
        self.buffer.put_u16_le(value);
    }

    /// Append a little-endian `u32`.
    pub fn write_u32(&mut self, value: u32) {
        self.buffer.put_u32_le(value);
    }

    /// Append a little-endian `u64`.
    pub fn write_u64(&mut self, value: u64) {
        self.buffer.put_u64_le(value);
    }

    /// Append a little-endian `i32`.
    pub fn write_i32(&mut self, value: i32) {
        self.buffer.put_i32_le(value);
    }

    /// Append a packed variable-length integer.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::PackedIntOverflow`](crate::CodecError::PackedIntOverflow)
    /// if the value needs more than 35 bits.
    pub fn write_packed_int(&mut self, value: i64) -> CodecResult<()> {
        let packed = encode_packed_int(value)?;
        self.buffer.put_slice(packed.as_bytes());
        Ok(())
    }

    /// Append a length-prefixed string in the raw-byte form.
    ///
    /// # Errors
    ///
    /// Fails only if the string is too long for the packed length prefix.
    pub fn write_string(&mut self, text: &str) -> CodecResult<()> {
        let len = i64::try_from(text.len()).unwrap_or(i64::MAX);
        self.write_packed_int(-len)?;
        self.buffer.put_slice(text.as_bytes());
        Ok(())
    }
}

impl Archive for ArchiveWriter {
    fn is_reader(&self) -> bool {
        false
    }

    fn position(&self) -> u64 {
        self.buffer.len() as u64
    }

    fn remaining(&self) -> Option<u64> {
        None
    }

    fn serialize(&mut self, buf: &mut [u8]) -> CodecResult<()> {
        self.buffer.put_slice(buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ArchiveReader;
    use crate::CodecError;
    use proptest::prelude::*;

    #[test]
    fn write_fixed_width() {
        let mut writer = ArchiveWriter::new();
        writer.write_u8(1);
        writer.write_u16(2);
        writer.write_u32(0x1234_5678);
        assert_eq!(writer.as_slice(), &[0x01, 0x02, 0x00, 0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn write_string_uses_negative_count() {
        let mut writer = ArchiveWriter::new();
        writer.write_string("hello").unwrap();
        assert_eq!(writer.as_slice(), &[0x85, b'h', b'e', b'l', b'l', b'o']);
    }

    #[test]
    fn write_empty_string_is_single_zero_byte() {
        let mut writer = ArchiveWriter::new();
        writer.write_string("").unwrap();
        assert_eq!(writer.as_slice(), &[0x00]);
    }

    #[test]
    fn write_string_matches_serialize_string() {
        let mut direct = ArchiveWriter::new();
        direct.write_string("Vector3").unwrap();

        let mut via_trait = ArchiveWriter::new();
        via_trait.serialize_string(&mut "Vector3".to_string()).unwrap();

        assert_eq!(direct.as_slice(), via_trait.as_slice());
    }

    #[test]
    fn write_packed_overflow() {
        let mut writer = ArchiveWriter::new();
        assert!(matches!(
            writer.write_packed_int(1 << 40),
            Err(CodecError::PackedIntOverflow { .. })
        ));
        assert!(writer.is_empty());
    }

    #[test]
    fn serialize_mirrors_reader() {
        let mut writer = ArchiveWriter::with_capacity(16);
        let mut a = 0xdead_beefu32;
        let mut b = -70i64;
        let mut c = 1.5f32;
        writer.serialize_u32(&mut a).unwrap();
        writer.serialize_packed_int(&mut b).unwrap();
        writer.serialize_f32(&mut c).unwrap();

        let bytes = writer.into_bytes();
        let mut reader = ArchiveReader::new(&bytes);
        let (mut ra, mut rb, mut rc) = (0u32, 0i64, 0f32);
        reader.serialize_u32(&mut ra).unwrap();
        reader.serialize_packed_int(&mut rb).unwrap();
        reader.serialize_f32(&mut rc).unwrap();
        assert_eq!((ra, rb, rc), (a, b, c));
        assert!(reader.is_empty());
    }

    proptest! {
        #[test]
        fn string_roundtrip(text in ".{0,200}") {
            let mut writer = ArchiveWriter::new();
            writer.write_string(&text).unwrap();
            let bytes = writer.into_vec();

            let mut reader = ArchiveReader::new(&bytes);
            prop_assert_eq!(reader.read_string().unwrap(), text);
            prop_assert!(reader.is_empty());
        }

        #[test]
        fn wide_and_raw_forms_decode_alike(text in ".{0,64}") {
            let units = text.encode_utf16().count() as i64;
            let mut wide = ArchiveWriter::new();
            wide.write_packed_int(units).unwrap();
            wide.write_bytes(&crate::string::encode_utf16le(&text));

            let mut raw = ArchiveWriter::new();
            raw.write_string(&text).unwrap();

            let wide = wide.into_vec();
            let raw = raw.into_vec();
            prop_assert_eq!(
                ArchiveReader::new(&wide).read_string().unwrap(),
                ArchiveReader::new(&raw).read_string().unwrap()
            );
        }
    }
}
