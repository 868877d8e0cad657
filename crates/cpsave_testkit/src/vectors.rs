//! Encoding test vectors.
//!
//! Byte-exact expectations for the packed integer and string codecs, shared
//! between crates and exportable as JSON for other implementations.

use serde::{Deserialize, Serialize};

/// A single encoding expectation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// The decoded value, as text.
    pub value: String,
    /// Encoded bytes (hex-encoded).
    pub encoded_hex: String,
    /// Whether writers produce exactly these bytes for `value`.
    pub canonical: bool,
    /// Expected error class if decoding should fail.
    pub expected_error: Option<String>,
}

impl TestVector {
    fn ok(id: &str, description: &str, value: &str, encoded_hex: &str) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            value: value.into(),
            encoded_hex: encoded_hex.into(),
            canonical: true,
            expected_error: None,
        }
    }

    fn read_only(mut self) -> Self {
        self.canonical = false;
        self
    }

    fn failing(id: &str, description: &str, encoded_hex: &str, error: &str) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            value: String::new(),
            encoded_hex: encoded_hex.into(),
            canonical: false,
            expected_error: Some(error.into()),
        }
    }
}

/// Packed integer vectors.
pub fn packed_int_vectors() -> Vec<TestVector> {
    vec![
        TestVector::ok("packed_0", "zero", "0", "00"),
        TestVector::ok("packed_1", "one", "1", "01"),
        TestVector::ok("packed_63", "largest single byte", "63", "3f"),
        TestVector::ok("packed_neg_1", "minus one", "-1", "81"),
        TestVector::ok("packed_64", "smallest two bytes", "64", "4001"),
        TestVector::ok("packed_70", "two bytes", "70", "4601"),
        TestVector::ok("packed_neg_70", "negative two bytes", "-70", "c601"),
        TestVector::ok("packed_8191", "largest two bytes", "8191", "7f7f"),
        TestVector::ok("packed_8192", "smallest three bytes", "8192", "408001"),
        TestVector::ok("packed_max", "largest magnitude", "34359738367", "7fffffffff"),
        TestVector::ok("packed_min", "largest negative magnitude", "-34359738367", "ffffffffff"),
        TestVector::ok("packed_neg_0", "negative zero", "0", "80").read_only(),
        TestVector::failing("packed_truncated", "continuation at end of input", "40", "truncated"),
    ]
}

/// Length-prefixed string vectors.
pub fn string_vectors() -> Vec<TestVector> {
    vec![
        TestVector::ok("string_empty", "empty string", "", "00"),
        TestVector::ok("string_ascii", "raw form", "abc", "83616263"),
        TestVector::ok("string_utf8", "raw form with multibyte text", "é", "82c3a9"),
        TestVector::ok("string_wide", "UTF-16 form", "hi", "0268006900").read_only(),
        TestVector::failing("string_truncated", "length past end of input", "836162", "truncated"),
        TestVector::failing("string_bad_utf8", "raw form with invalid UTF-8", "81ff", "encoding"),
        TestVector::failing("string_lone_surrogate", "UTF-16 form with unpaired surrogate", "0100d8", "encoding"),
    ]
}

/// Returns all test vectors as JSON.
pub fn all_vectors_json() -> String {
    let vectors = AllTestVectors {
        packed_int: packed_int_vectors(),
        string: string_vectors(),
    };
    serde_json::to_string_pretty(&vectors).expect("Failed to serialize vectors")
}

#[derive(Debug, Serialize, Deserialize)]
struct AllTestVectors {
    packed_int: Vec<TestVector>,
    string: Vec<TestVector>,
}

/// Encodes bytes as hexadecimal string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decodes hexadecimal string to bytes.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    let hex = hex.replace([' ', '\n', '\r'], "");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex"))
        .collect()
}
