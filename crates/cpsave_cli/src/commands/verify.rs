//! Verify command implementation.

use cpsave_core::{NameRegistry, TweakDb};
use std::path::Path;

/// Verification result.
#[derive(Debug)]
pub struct VerifyResult {
    /// Size of the blob on disk.
    pub original_size: usize,
    /// Size of the re-encoded blob.
    pub written_size: usize,
    /// Number of pools decoded.
    pub pool_count: usize,
    /// Offset of the first byte that differs, if any.
    pub first_difference: Option<usize>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.first_difference.is_none()
    }
}

/// Runs the verify command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying TweakDB at {:?}", path);
    println!();

    let registry = NameRegistry::with_builtin_types();
    let loader = super::load(&registry, path)?;
    let db = match (loader.database(), loader.failure()) {
        (Some(db), _) => db,
        (_, failure) => {
            if let Some(failure) = failure {
                println!("Decoding failed: {}", failure.message);
            }
            println!();
            println!("✗ TweakDB verification failed");
            return Err("Verification failed".into());
        }
    };

    let original = std::fs::read(path)?;
    let result = verify_roundtrip(&original, db)?;
    print_result(&result);

    println!();
    if result.is_ok() {
        println!("✓ TweakDB verification passed");
        Ok(())
    } else {
        println!("✗ TweakDB verification failed");
        Err("Verification failed".into())
    }
}

fn verify_roundtrip(
    original: &[u8],
    db: &TweakDb,
) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let written = db.write()?;
    Ok(VerifyResult {
        original_size: original.len(),
        written_size: written.len(),
        pool_count: db.pool_count(),
        first_difference: first_difference(original, &written),
    })
}

fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}

fn print_result(result: &VerifyResult) {
    println!("  Pools decoded:  {}", result.pool_count);
    println!("  Original size:  {} bytes", result.original_size);
    println!("  Written size:   {} bytes", result.written_size);
    if let Some(offset) = result.first_difference {
        println!("  First difference at offset {:#x}", offset);
    }
}
