//! UTF-16 helpers for the length-prefixed string codec.
//!
//! Strings on the wire come in two flavors selected by the sign of their
//! packed length prefix: a negative count means raw bytes, a non-negative
//! count means UTF-16LE code units. Writers only ever produce the raw form.

/// Decode UTF-16LE bytes into a `String`.
///
/// # Errors
///
/// Returns a description of the problem if `bytes` has an odd length or
/// contains an unpaired surrogate.
pub fn decode_utf16le(bytes: &[u8]) -> Result<String, String> {
    if bytes.len() % 2 != 0 {
        return Err(format!("odd UTF-16 byte length {}", bytes.len()));
    }
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|unit| unit.map_err(|e| format!("unpaired surrogate {:#06x}", e.unpaired_surrogate())))
        .collect()
}

/// Encode a string as UTF-16LE bytes.
#[must_use]
pub fn encode_utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_ascii() {
        assert_eq!(encode_utf16le("ab"), vec![b'a', 0, b'b', 0]);
        assert_eq!(decode_utf16le(&[b'a', 0, b'b', 0]).unwrap(), "ab");
    }

    #[test]
    fn utf16_surrogate_pair() {
        let bytes = encode_utf16le("\u{1F600}");
        assert_eq!(bytes.len(), 4);
        assert_eq!(decode_utf16le(&bytes).unwrap(), "\u{1F600}");
    }

    #[test]
    fn utf16_unpaired_surrogate_rejected() {
        assert!(decode_utf16le(&[0x00, 0xd8]).is_err());
    }

    #[test]
    fn utf16_odd_length_rejected() {
        assert!(decode_utf16le(&[b'a', 0, b'b']).is_err());
    }
}
