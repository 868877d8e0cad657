//! CLI command implementations.

pub mod inspect;
pub mod packed;
pub mod verify;

use cpsave_core::{NameRegistry, TweakDbConfig, TweakDbLoader};
use std::path::Path;

/// Loads the blob at `path` with the built-in type names registered.
pub(crate) fn load<'r>(
    registry: &'r NameRegistry,
    path: &Path,
) -> Result<TweakDbLoader<'r>, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No TweakDB found at {:?}", path).into());
    }
    let mut loader = TweakDbLoader::new(registry, TweakDbConfig::default());
    // the failure stays in the loader state for the caller to report
    let _ = loader.open(path);
    Ok(loader)
}
