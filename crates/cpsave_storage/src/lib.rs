//! # cpsave Storage
//!
//! Byte sources and sinks for the cpsave archive layer.
//!
//! Backends are **opaque byte stores**: they hand out and accept raw bytes and
//! report their size, which the archive layer uses as the bounds hint for every
//! read. They know nothing about packed integers, pools or TweakDB blobs.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For tests and blobs already held in memory
//! - [`FileBackend`] - For save files and database blobs on disk
//!
//! ## Example
//!
//! ```rust
//! use cpsave_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"tweakdb").unwrap();
//! let data = backend.read_at(offset, 7).unwrap();
//! assert_eq!(&data, b"tweakdb");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::{StorageBackend, MAX_SOURCE_SIZE};
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
