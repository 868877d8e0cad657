//! Packed variable-length integer codec.
//!
//! A packed integer stores a sign bit plus a magnitude of up to 35 bits in
//! one to five bytes:
//!
//! | byte | bit 7        | bit 6        | remaining bits       |
//! |------|--------------|--------------|----------------------|
//! | 0    | sign         | more follows | magnitude bits 0-5   |
//! | 1-3  | more follows | value        | magnitude 7 bits each|
//! | 4    | value        | value        | magnitude bits 27-34 |
//!
//! The magnitude is not two's complement; the sign travels separately, so
//! `-5` and `5` differ only in bit 7 of the first byte.

use crate::error::{CodecError, CodecResult};

/// Maximum number of bytes a packed integer occupies.
pub const PACKED_INT_MAX_BYTES: usize = 5;

/// Largest magnitude a packed integer can carry.
pub const PACKED_INT_MAX_MAGNITUDE: u64 = (1 << 35) - 1;

const SIGN_BIT: u8 = 0x80;
const FIRST_CONTINUATION: u8 = 0x40;
const CONTINUATION: u8 = 0x80;
const FIRST_VALUE_MASK: u8 = 0x3f;
const VALUE_MASK: u8 = 0x7f;

/// An encoded packed integer held on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedInt {
    bytes: [u8; PACKED_INT_MAX_BYTES],
    len: u8,
}

impl PackedInt {
    /// The encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..usize::from(self.len)]
    }

    /// Number of encoded bytes (1 to 5).
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        usize::from(self.len)
    }
}

/// Encode a signed integer.
///
/// # Errors
///
/// Returns [`CodecError::PackedIntOverflow`] if `|value|` exceeds
/// [`PACKED_INT_MAX_MAGNITUDE`].
#[allow(clippy::cast_possible_truncation)]
pub fn encode_packed_int(value: i64) -> CodecResult<PackedInt> {
    let mut magnitude = value.unsigned_abs();
    if magnitude > PACKED_INT_MAX_MAGNITUDE {
        return Err(CodecError::PackedIntOverflow { value });
    }

    let mut bytes = [0u8; PACKED_INT_MAX_BYTES];
    if value < 0 {
        bytes[0] |= SIGN_BIT;
    }
    bytes[0] |= (magnitude as u8) & FIRST_VALUE_MASK;
    magnitude >>= 6;

    let mut len = 1;
    while magnitude != 0 {
        bytes[len - 1] |= if len == 1 {
            FIRST_CONTINUATION
        } else {
            CONTINUATION
        };
        if len == PACKED_INT_MAX_BYTES - 1 {
            // last byte carries a full 8 bits and no flag
            bytes[len] = magnitude as u8;
            magnitude >>= 8;
        } else {
            bytes[len] = (magnitude as u8) & VALUE_MASK;
            magnitude >>= 7;
        }
        len += 1;
    }

    Ok(PackedInt {
        bytes,
        len: len as u8,
    })
}

/// Number of bytes `value` encodes to, without encoding it.
///
/// Values beyond the representable range report the maximum width.
#[must_use]
pub fn packed_int_len(value: i64) -> usize {
    match value.unsigned_abs() {
        0..=0x3f => 1,
        0x40..=0x1fff => 2,
        0x2000..=0xf_ffff => 3,
        0x10_0000..=0x7ff_ffff => 4,
        _ => PACKED_INT_MAX_BYTES,
    }
}

/// Decode a packed integer, pulling bytes from `next_byte` one at a time.
///
/// This is the one decoding routine; slice decoding and archive reads both
/// go through it so their behavior cannot drift apart.
///
/// # Errors
///
/// Propagates any error returned by `next_byte`.
pub fn decode_packed_int_with<F>(mut next_byte: F) -> CodecResult<i64>
where
    F: FnMut() -> CodecResult<u8>,
{
    let first = next_byte()?;
    let negative = first & SIGN_BIT != 0;
    let mut magnitude = u64::from(first & FIRST_VALUE_MASK);

    if first & FIRST_CONTINUATION != 0 {
        magnitude |= decode_tail(&mut next_byte)?;
    }

    #[allow(clippy::cast_possible_wrap)]
    let value = magnitude as i64;
    Ok(if negative { -value } else { value })
}

fn decode_tail<F>(next_byte: &mut F) -> CodecResult<u64>
where
    F: FnMut() -> CodecResult<u8>,
{
    let mut magnitude = 0u64;
    let mut shift = 6;
    for _ in 1..PACKED_INT_MAX_BYTES - 1 {
        let byte = next_byte()?;
        magnitude |= u64::from(byte & VALUE_MASK) << shift;
        shift += 7;
        if byte & CONTINUATION == 0 {
            return Ok(magnitude);
        }
    }
    let last = next_byte()?;
    Ok(magnitude | (u64::from(last) << shift))
}

/// Decode a packed integer from the start of `bytes`.
///
/// Returns the value and the number of bytes consumed.
///
/// # Errors
///
/// Returns [`CodecError::TruncatedInput`] if `bytes` ends mid-integer.
pub fn decode_packed_int(bytes: &[u8]) -> CodecResult<(i64, usize)> {
    let mut pos = 0usize;
    let value = decode_packed_int_with(|| {
        let byte = bytes.get(pos).copied().ok_or(CodecError::TruncatedInput {
            offset: pos as u64,
            need: 1,
            have: 0,
        })?;
        pos += 1;
        Ok(byte)
    })?;
    Ok((value, pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode(value: i64) -> Vec<u8> {
        encode_packed_int(value).unwrap().as_bytes().to_vec()
    }

    #[test]
    fn encode_zero() {
        assert_eq!(encode(0), vec![0x00]);
    }

    #[test]
    fn encode_single_byte_values() {
        assert_eq!(encode(1), vec![0x01]);
        assert_eq!(encode(63), vec![0x3f]);
        assert_eq!(encode(-1), vec![0x81]);
        assert_eq!(encode(-63), vec![0xbf]);
    }

    #[test]
    fn encode_seventy_uses_two_bytes() {
        // 70 = 0b1_000110: low six bits with the continuation flag, then 1
        assert_eq!(encode(70), vec![0x46, 0x01]);
        assert_eq!(decode_packed_int(&[0x46, 0x01]).unwrap(), (70, 2));
    }

    #[test]
    fn encode_width_boundaries() {
        assert_eq!(encode(64), vec![0x40, 0x01]);
        assert_eq!(encode(0x1fff).len(), 2);
        assert_eq!(encode(0x2000).len(), 3);
        assert_eq!(encode(0xf_ffff).len(), 3);
        assert_eq!(encode(0x10_0000).len(), 4);
        assert_eq!(encode(0x7ff_ffff).len(), 4);
        assert_eq!(encode(0x800_0000).len(), 5);
    }

    #[test]
    fn encode_maximum_magnitude() {
        let bytes = encode(PACKED_INT_MAX_MAGNITUDE as i64);
        assert_eq!(bytes, vec![0x7f, 0xff, 0xff, 0xff, 0xff]);

        let bytes = encode(-(PACKED_INT_MAX_MAGNITUDE as i64));
        assert_eq!(bytes, vec![0xff, 0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn encode_rejects_overflow() {
        let too_big = (PACKED_INT_MAX_MAGNITUDE + 1) as i64;
        assert!(matches!(
            encode_packed_int(too_big),
            Err(CodecError::PackedIntOverflow { .. })
        ));
        assert!(encode_packed_int(-too_big).is_err());
        assert!(encode_packed_int(i64::MIN).is_err());
    }

    #[test]
    fn decode_negative_zero_is_zero() {
        assert_eq!(decode_packed_int(&[0x80]).unwrap(), (0, 1));
    }

    #[test]
    fn decode_stops_at_cleared_continuation() {
        // trailing byte must not be consumed
        assert_eq!(decode_packed_int(&[0x46, 0x01, 0xaa]).unwrap(), (70, 2));
    }

    #[test]
    fn decode_last_byte_uses_all_bits() {
        let bytes = [0x40, 0x80, 0x80, 0x80, 0x80];
        assert_eq!(decode_packed_int(&bytes).unwrap(), (1 << 34, 5));
    }

    #[test]
    fn decode_truncated() {
        assert!(matches!(
            decode_packed_int(&[]),
            Err(CodecError::TruncatedInput { offset: 0, .. })
        ));
        assert!(matches!(
            decode_packed_int(&[0x40]),
            Err(CodecError::TruncatedInput { offset: 1, .. })
        ));
        assert!(matches!(
            decode_packed_int(&[0x40, 0x80, 0x80, 0x80]),
            Err(CodecError::TruncatedInput { offset: 4, .. })
        ));
    }

    proptest! {
        #[test]
        fn packed_roundtrip(value in -(1i64 << 34)..(1i64 << 34)) {
            let packed = encode_packed_int(value).unwrap();
            prop_assert!(packed.len() <= PACKED_INT_MAX_BYTES);
            prop_assert_eq!(packed.len(), packed_int_len(value));
            prop_assert_eq!(decode_packed_int(packed.as_bytes()).unwrap(), (value, packed.len()));
        }

        #[test]
        fn packed_sign_only_touches_top_bit(value in 1i64..=(PACKED_INT_MAX_MAGNITUDE as i64)) {
            let positive = encode(value);
            let negative = encode(-value);
            prop_assert_eq!(positive[0] | 0x80, negative[0]);
            prop_assert_eq!(&positive[1..], &negative[1..]);
        }
    }
}
