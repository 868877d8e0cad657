//! Archive reader over a borrowed byte slice.

use crate::archive::{read_prefixed_string, Archive};
use crate::error::{CodecError, CodecResult};
use crate::packed::decode_packed_int_with;

/// A reading archive over a byte slice. All fixed-width reads are little-endian.
///
/// Every read is bounds-checked against the slice; a short read fails with
/// [`CodecError::TruncatedInput`] and leaves the cursor where it was.
/// Positions are absolute: a reader split off a larger one with
/// [`split_off`](Self::split_off) reports offsets within the original blob.
#[derive(Debug, Clone)]
pub struct ArchiveReader<'a> {
    data: &'a [u8],
    pos: usize,
    base: u64,
}

impl<'a> ArchiveReader<'a> {
    /// Create a reader positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    /// Create a reader whose first byte sits at absolute offset `base`.
    #[must_use]
    pub fn with_base(data: &'a [u8], base: u64) -> Self {
        Self { data, pos: 0, base }
    }

    /// Total length of the underlying slice.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether every byte has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Bytes left from the cursor.
    #[must_use]
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Unread bytes from the cursor.
    #[must_use]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Move the cursor to absolute position `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TruncatedInput`] if `pos` lies outside the slice.
    pub fn seek(&mut self, pos: u64) -> CodecResult<()> {
        let end = self.base + self.data.len() as u64;
        if pos < self.base || pos > end {
            return Err(CodecError::TruncatedInput {
                offset: pos,
                need: 0,
                have: 0,
            });
        }
        self.pos = (pos - self.base) as usize;
        Ok(())
    }

    /// Skip `n` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TruncatedInput`] if fewer than `n` bytes remain.
    pub fn skip(&mut self, n: usize) -> CodecResult<()> {
        self.read_bytes(n).map(|_| ())
    }

    /// Read `n` bytes without copying.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TruncatedInput`] if fewer than `n` bytes remain.
    pub fn read_bytes(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        self.ensure(n)?;
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Read `n` bytes into a new reader and advance past them.
    ///
    /// The returned reader reports absolute offsets.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TruncatedInput`] if fewer than `n` bytes remain.
    pub fn split_off(&mut self, n: usize) -> CodecResult<ArchiveReader<'a>> {
        let base = Archive::position(self);
        let bytes = self.read_bytes(n)?;
        Ok(Self::with_base(bytes, base))
    }

    /// Read a byte.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TruncatedInput`] at end of input.
    pub fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a little-endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TruncatedInput`] at end of input.
    pub fn read_u16(&mut self) -> CodecResult<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Read a little-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TruncatedInput`] at end of input.
    pub fn read_u32(&mut self) -> CodecResult<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Read a little-endian `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TruncatedInput`] at end of input.
    pub fn read_u64(&mut self) -> CodecResult<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Read a little-endian `i32`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TruncatedInput`] at end of input.
    pub fn read_i32(&mut self) -> CodecResult<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Read a packed variable-length integer.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TruncatedInput`] if the input ends mid-integer.
    pub fn read_packed_int(&mut self) -> CodecResult<i64> {
        decode_packed_int_with(|| self.read_u8())
    }

    /// Read a length-prefixed string in either wire form.
    ///
    /// # Errors
    ///
    /// See [`Archive::serialize_string`].
    pub fn read_string(&mut self) -> CodecResult<String> {
        read_prefixed_string(self, None)
    }

    /// Read a length-prefixed string, refusing strings longer than
    /// `max_bytes` once decoded.
    ///
    /// Callers that used to read into fixed-capacity buffers use this so an
    /// oversized string fails instead of bleeding into the next field.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encoding`] for oversized strings, otherwise the
    /// same errors as [`read_string`](Self::read_string).
    pub fn read_string_limited(&mut self, max_bytes: usize) -> CodecResult<String> {
        read_prefixed_string(self, Some(max_bytes))
    }

    fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    #[inline]
    fn ensure(&self, n: usize) -> CodecResult<()> {
        let have = self.remaining_len();
        if n > have {
            return Err(CodecError::TruncatedInput {
                offset: self.base + self.pos as u64,
                need: n as u64,
                have: have as u64,
            });
        }
        Ok(())
    }
}

impl Archive for ArchiveReader<'_> {
    fn is_reader(&self) -> bool {
        true
    }

    fn position(&self) -> u64 {
        self.base + self.pos as u64
    }

    fn remaining(&self) -> Option<u64> {
        Some(self.remaining_len() as u64)
    }

    fn serialize(&mut self, buf: &mut [u8]) -> CodecResult<()> {
        buf.copy_from_slice(self.read_bytes(buf.len())?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::string::encode_utf16le;

    #[test]
    fn read_fixed_width() {
        let data = [0x01, 0x02, 0x00, 0x78, 0x56, 0x34, 0x12];
        let mut reader = ArchiveReader::new(&data);
        assert_eq!(reader.read_u8().unwrap(), 1);
        assert_eq!(reader.read_u16().unwrap(), 2);
        assert_eq!(reader.read_u32().unwrap(), 0x1234_5678);
        assert!(reader.is_empty());
    }

    #[test]
    fn short_read_reports_offset_and_keeps_cursor() {
        let data = [0xaa, 0xbb, 0xcc];
        let mut reader = ArchiveReader::new(&data);
        reader.read_u8().unwrap();

        let err = reader.read_u32().unwrap_err();
        assert_eq!(
            err,
            CodecError::TruncatedInput {
                offset: 1,
                need: 4,
                have: 2
            }
        );
        assert_eq!(reader.read_u16().unwrap(), 0xccbb);
    }

    #[test]
    fn serialize_never_fills_past_end() {
        let data = [1, 2, 3];
        let mut reader = ArchiveReader::new(&data);
        let mut buf = [0u8; 8];
        assert!(matches!(
            reader.serialize(&mut buf),
            Err(CodecError::TruncatedInput { need: 8, have: 3, .. })
        ));
        assert_eq!(buf, [0u8; 8]);
    }

    #[test]
    fn split_off_reports_absolute_offsets() {
        let data = [0u8; 10];
        let mut reader = ArchiveReader::new(&data);
        reader.skip(4).unwrap();

        let mut inner = reader.split_off(2).unwrap();
        assert_eq!(inner.position(), 4);
        inner.read_u16().unwrap();
        assert!(matches!(
            inner.read_u8(),
            Err(CodecError::TruncatedInput { offset: 6, .. })
        ));
        assert_eq!(reader.position(), 6);
    }

    #[test]
    fn seek_bounds() {
        let data = [0u8; 4];
        let mut reader = ArchiveReader::with_base(&data, 100);
        reader.seek(104).unwrap();
        assert!(reader.is_empty());
        assert!(reader.seek(105).is_err());
        assert!(reader.seek(99).is_err());
        reader.seek(101).unwrap();
        assert_eq!(reader.remaining_bytes().len(), 3);
    }

    #[test]
    fn read_raw_string() {
        // -5 packed is 0x85
        let data = [0x85, b'h', b'e', b'l', b'l', b'o'];
        let mut reader = ArchiveReader::new(&data);
        assert_eq!(reader.read_string().unwrap(), "hello");
    }

    #[test]
    fn read_wide_string_matches_raw() {
        let mut wide = vec![0x05];
        wide.extend(encode_utf16le("hello"));
        let raw = [0x85, b'h', b'e', b'l', b'l', b'o'];

        let from_wide = ArchiveReader::new(&wide).read_string().unwrap();
        let from_raw = ArchiveReader::new(&raw).read_string().unwrap();
        assert_eq!(from_wide, from_raw);
    }

    #[test]
    fn read_empty_string_both_forms() {
        assert_eq!(ArchiveReader::new(&[0x00]).read_string().unwrap(), "");
        assert_eq!(ArchiveReader::new(&[0x80]).read_string().unwrap(), "");
    }

    #[test]
    fn read_string_longer_than_input_fails_before_allocating() {
        // declares 2^34 wide units
        let data = [0x40, 0x80, 0x80, 0x80, 0x80, b'x'];
        let err = ArchiveReader::new(&data).read_string().unwrap_err();
        assert!(matches!(
            err,
            CodecError::TruncatedInput { offset: 5, have: 1, .. }
        ));
    }

    #[test]
    fn read_string_invalid_utf8() {
        let data = [0x82, 0xff, 0xfe];
        let err = ArchiveReader::new(&data).read_string().unwrap_err();
        assert!(matches!(err, CodecError::Encoding { offset: 0, .. }));
    }

    #[test]
    fn read_string_unpaired_surrogate() {
        let data = [0x01, 0x00, 0xd8];
        let err = ArchiveReader::new(&data).read_string().unwrap_err();
        assert!(matches!(err, CodecError::Encoding { .. }));
    }

    #[test]
    fn read_string_limited() {
        let data = [0x85, b'h', b'e', b'l', b'l', b'o'];
        assert_eq!(
            ArchiveReader::new(&data).read_string_limited(5).unwrap(),
            "hello"
        );
        assert!(matches!(
            ArchiveReader::new(&data).read_string_limited(4),
            Err(CodecError::Encoding { .. })
        ));

        // three wide units that decode to nine UTF-8 bytes
        let mut wide = vec![0x03];
        wide.extend(encode_utf16le("\u{4e16}\u{754c}\u{4eba}"));
        assert!(ArchiveReader::new(&wide).read_string_limited(8).is_err());
        assert_eq!(
            ArchiveReader::new(&wide).read_string_limited(9).unwrap(),
            "\u{4e16}\u{754c}\u{4eba}"
        );
    }
}
