//! Test fixtures and blob helpers.
//!
//! Provides a builder for hand-assembled TweakDB blobs, pool payload
//! helpers, and temporary files to load them from.

use cpsave_codec::{encode_packed_int, encode_utf16le, ArchiveWriter};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Size of the fixed header.
pub const HEADER_LEN: u32 = 32;

/// Size of one pool descriptor.
pub const DESCRIPTOR_LEN: u32 = 12;

/// Builds raw TweakDB blobs, including malformed ones.
///
/// Unless overridden, the descriptor count and lengths match the pools and
/// all four section offsets point at the end of the pool region.
#[derive(Debug, Clone)]
pub struct TweakDbBlobBuilder {
    magic: u32,
    versions: (u32, u32),
    version_hash: u32,
    offsets: Option<[u32; 4]>,
    declared_count: Option<u32>,
    pools: Vec<(u64, Vec<u8>, Option<u32>)>,
    trailing: Vec<u8>,
}

impl Default for TweakDbBlobBuilder {
    fn default() -> Self {
        Self {
            magic: 0x0bb1_db57,
            versions: (5, 4),
            version_hash: 0,
            offsets: None,
            declared_count: None,
            pools: Vec::new(),
            trailing: Vec::new(),
        }
    }
}

impl TweakDbBlobBuilder {
    /// Creates a builder for an empty, well-formed blob.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the magic.
    #[must_use]
    pub fn magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    /// Sets the two format constants.
    #[must_use]
    pub fn versions(mut self, blob: u32, parser: u32) -> Self {
        self.versions = (blob, parser);
        self
    }

    /// Sets the type-name hash field.
    #[must_use]
    pub fn version_hash(mut self, hash: u32) -> Self {
        self.version_hash = hash;
        self
    }

    /// Sets the variables, groups, inline groups and packages offsets.
    #[must_use]
    pub fn section_offsets(mut self, offsets: [u32; 4]) -> Self {
        self.offsets = Some(offsets);
        self
    }

    /// Writes `count` as the descriptor count regardless of the pools.
    #[must_use]
    pub fn declared_count(mut self, count: u32) -> Self {
        self.declared_count = Some(count);
        self
    }

    /// Appends a pool with the given type hash and payload.
    #[must_use]
    pub fn pool(mut self, type_hash: u64, payload: Vec<u8>) -> Self {
        self.pools.push((type_hash, payload, None));
        self
    }

    /// Appends a pool whose descriptor claims `declared_len` bytes.
    #[must_use]
    pub fn pool_with_len(mut self, type_hash: u64, payload: Vec<u8>, declared_len: u32) -> Self {
        self.pools.push((type_hash, payload, Some(declared_len)));
        self
    }

    /// Appends bytes after the pool region.
    #[must_use]
    pub fn trailing(mut self, bytes: &[u8]) -> Self {
        self.trailing.extend_from_slice(bytes);
        self
    }

    /// Offset just past the last pool payload.
    #[must_use]
    pub fn pools_end(&self) -> u32 {
        let payloads: usize = self.pools.iter().map(|(_, p, _)| p.len()).sum();
        HEADER_LEN + 4 + DESCRIPTOR_LEN * self.pools.len() as u32 + payloads as u32
    }

    /// Assembles the blob.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let end = self.pools_end();
        let offsets = self.offsets.unwrap_or([end; 4]);

        let mut writer = ArchiveWriter::new();
        writer.write_u32(self.magic);
        writer.write_u32(self.versions.0);
        writer.write_u32(self.versions.1);
        writer.write_u32(self.version_hash);
        for offset in offsets {
            writer.write_u32(offset);
        }

        writer.write_u32(self.declared_count.unwrap_or(self.pools.len() as u32));
        for (hash, payload, declared) in &self.pools {
            writer.write_u64(*hash);
            writer.write_u32(declared.unwrap_or(payload.len() as u32));
        }
        for (_, payload, _) in &self.pools {
            writer.write_bytes(payload);
        }
        writer.write_bytes(&self.trailing);
        writer.into_vec()
    }
}

/// A `String` pool payload in its canonical form.
pub fn string_payload(strings: &[&str]) -> Vec<u8> {
    let mut writer = ArchiveWriter::new();
    writer.write_u32(strings.len() as u32);
    for text in strings {
        writer.write_string(text).expect("Failed to encode string");
    }
    writer.into_vec()
}

/// A record pool payload: the count followed by the records verbatim.
pub fn record_payload<R: AsRef<[u8]>>(records: &[R]) -> Vec<u8> {
    let mut bytes = (records.len() as u32).to_le_bytes().to_vec();
    for record in records {
        bytes.extend_from_slice(record.as_ref());
    }
    bytes
}

/// An `array:<scalar>` record.
pub fn array_record<R: AsRef<[u8]>>(elements: &[R]) -> Vec<u8> {
    record_payload(elements)
}

/// A string in the UTF-16 wire form, which writers never produce.
pub fn wide_string(text: &str) -> Vec<u8> {
    let units = encode_utf16le(text);
    let count = (units.len() / 2) as i64;
    let prefix = encode_packed_int(count).expect("Failed to encode length");

    let mut bytes = prefix.as_bytes().to_vec();
    bytes.extend_from_slice(&units);
    bytes
}

/// A blob written to a temporary directory, removed on drop.
pub struct TempBlob {
    path: PathBuf,
    _temp_dir: TempDir,
}

impl TempBlob {
    /// Writes `bytes` to `tweakdb.bin` in a fresh temporary directory.
    pub fn new(bytes: &[u8]) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("tweakdb.bin");
        fs::write(&path, bytes).expect("Failed to write blob");
        Self {
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Path of the blob file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A sibling path in the same directory, for output files.
    pub fn sibling(&self, name: &str) -> PathBuf {
        self._temp_dir.path().join(name)
    }
}

/// Runs a test against `bytes` stored in a temporary file.
///
/// # Example
///
/// ```rust
/// use cpsave_testkit::with_temp_blob;
///
/// let len = with_temp_blob(&[1, 2, 3], |path| std::fs::read(path).unwrap().len());
/// assert_eq!(len, 3);
/// ```
pub fn with_temp_blob<F, R>(bytes: &[u8], f: F) -> R
where
    F: FnOnce(&Path) -> R,
{
    let blob = TempBlob::new(bytes);
    f(blob.path())
}
