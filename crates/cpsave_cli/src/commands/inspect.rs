//! Inspect command implementation.

use cpsave_core::{
    CName, LoadFailure, NameRegistry, PoolKind, TweakDb, TweakDbHeader, TweakDbLoader,
};
use serde::Serialize;
use std::path::Path;

/// Blob inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Blob path.
    pub path: String,
    /// Blob size in bytes.
    pub blob_size: u64,
    /// Decoded header.
    pub header: TweakDbHeader,
    /// Number of pools.
    pub pool_count: usize,
    /// Bytes in the pool region, descriptors included.
    pub pool_region_size: u64,
    /// Bytes after the pool region.
    pub trailing_size: u64,
    /// Per-pool statistics (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pools: Option<Vec<PoolStats>>,
}

/// Statistics for a single pool.
#[derive(Debug, Serialize)]
pub struct PoolStats {
    /// Position in the descriptor table.
    pub index: usize,
    /// Resolved type name, or the hash if unknown.
    pub type_name: String,
    /// Type name hash.
    pub type_hash: CName,
    /// How the payload was decoded.
    pub kind: PoolKind,
    /// Payload size in bytes.
    pub payload_size: u32,
    /// Number of values, absent for opaque pools.
    pub values: Option<usize>,
}

/// Output when the blob fails to load.
#[derive(Debug, Serialize)]
struct InspectFailure<'a> {
    path: String,
    error: &'a LoadFailure,
}

/// Runs the inspect command.
pub fn run(path: &Path, show_pools: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let registry = NameRegistry::with_builtin_types();
    let loader = super::load(&registry, path)?;

    let db = match (loader.database(), loader.failure()) {
        (Some(db), _) => db,
        (None, Some(failure)) => {
            report_failure(path, failure, format)?;
            return Err("Inspection failed".into());
        }
        (None, None) => return Err("Nothing loaded".into()),
    };

    let blob_size = std::fs::metadata(path)?.len();
    let result = summarize(path, blob_size, db, &registry, show_pools);
    print_result(&loader, &result, format)?;
    Ok(())
}

fn summarize(
    path: &Path,
    blob_size: u64,
    db: &TweakDb,
    registry: &NameRegistry,
    show_pools: bool,
) -> InspectResult {
    let trailing_size = db.trailing().len() as u64;
    let pools = show_pools.then(|| {
        db.descriptors()
            .iter()
            .zip(db.pools())
            .enumerate()
            .map(|(index, (desc, pool))| PoolStats {
                index,
                type_name: registry.display_name(desc.type_name),
                type_hash: desc.type_name,
                kind: pool.kind(),
                payload_size: desc.len,
                values: pool.value_count(),
            })
            .collect()
    });

    InspectResult {
        path: path.display().to_string(),
        blob_size,
        header: *db.header(),
        pool_count: db.pool_count(),
        pool_region_size: blob_size - trailing_size - cpsave_core::HEADER_SIZE,
        trailing_size,
        pools,
    }
}

fn report_failure(
    path: &Path,
    failure: &LoadFailure,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "json" => {
            let output = InspectFailure {
                path: path.display().to_string(),
                error: failure,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => {
            println!("Failed to load {}", path.display());
            match failure.offset {
                Some(offset) => println!("  {} at offset {:#x}", failure.kind, offset),
                None => println!("  {}", failure.kind),
            }
            println!("  {}", failure.message);
        }
    }
    Ok(())
}

fn print_result(
    loader: &TweakDbLoader<'_>,
    result: &InspectResult,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        _ => print_text_output(loader, result),
    }
    Ok(())
}

fn print_text_output(loader: &TweakDbLoader<'_>, result: &InspectResult) {
    let header = &result.header;
    println!("TweakDB Inspection");
    println!("==================");
    println!();
    println!("Path: {}", result.path);
    println!("Size: {} bytes", format_size(result.blob_size));
    println!();
    println!("Header:");
    println!("  Magic:          {:#010x}", header.magic);
    println!(
        "  Versions:       {} / {}",
        header.blob_version, header.parser_version
    );
    println!("  Version hash:   {:#010x}", header.version_hash);
    println!("  Variables:      {:#x}", header.variables_offset);
    println!("  Groups:         {:#x}", header.groups_offset);
    println!("  Inline groups:  {:#x}", header.inline_groups_offset);
    println!("  Packages:       {:#x}", header.packages_offset);
    println!();
    println!("Pools:");
    println!("  Count:          {}", result.pool_count);
    println!(
        "  Region size:    {} bytes",
        format_size(result.pool_region_size)
    );
    println!(
        "  Trailing size:  {} bytes",
        format_size(result.trailing_size)
    );
    if loader.config().expected_magic.is_none() {
        println!("  (magic not checked)");
    }

    if let Some(pools) = &result.pools {
        println!();
        for pool in pools {
            let values = pool
                .values
                .map_or_else(|| "opaque".to_string(), |n| format!("{n} values"));
            println!(
                "  [{}] {} ({}), {} bytes",
                pool.index, pool.type_name, values, pool.payload_size
            );
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{}", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
