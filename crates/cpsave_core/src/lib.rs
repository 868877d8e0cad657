//! # cpsave core
//!
//! Pools and the TweakDB loader for the cpsave archive toolkit.
//!
//! This crate provides:
//! - [`StringPool`]: interned strings in a block arena
//! - [`ValuePool`]: deduplicated values with a sorted lookup index
//! - [`NameRegistry`]: hashed type names shared across loads
//! - [`TweakDbLoader`] and [`TweakDb`]: decoding and re-encoding of TweakDB blobs

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod names;
mod string_pool;
mod tweakdb;
mod value_pool;

pub use config::TweakDbConfig;
pub use error::{CoreError, CoreResult, ErrorKind};
pub use names::{CName, NameRegistry, BUILTIN_TYPE_NAMES};
pub use string_pool::{StringPool, BLOCK_SIZE, MAX_DESCRIBED_LEN};
pub use tweakdb::{
    LoadFailure, LoadState, Pool, PoolDescriptor, PoolKind, RecordLayout, TweakDb, TweakDbHeader,
    TweakDbLoader, BLOB_VERSION, DESCRIPTOR_SIZE, HEADER_SIZE, PARSER_VERSION, TWEAKDB_MAGIC,
};
pub use value_pool::ValuePool;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
