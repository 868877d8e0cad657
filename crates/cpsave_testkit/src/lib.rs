//! # cpsave testkit
//!
//! Test utilities for cpsave.
//!
//! This crate provides:
//! - A TweakDB blob builder and temporary file helpers
//! - Property-based test generators using proptest
//! - Encoding test vectors for packed integers and strings
//!
//! ## Usage
//!
//! ```rust
//! use cpsave_testkit::prelude::*;
//!
//! let blob = TweakDbBlobBuilder::new()
//!     .pool(0x1234, string_payload(&["a", "b"]))
//!     .build();
//! with_temp_blob(&blob, |path| assert!(path.exists()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use generators::*;
pub use vectors::*;
