//! cpsave CLI
//!
//! Command-line tools for TweakDB blobs.
//!
//! # Commands
//!
//! - `inspect` - Display header fields and pool statistics
//! - `verify` - Check that a blob decodes and writes back unchanged
//! - `packed` - Show the packed encoding of an integer

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// cpsave command-line TweakDB tools.
#[derive(Parser)]
#[command(name = "cpsave")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TweakDB blob
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display header fields and pool statistics
    Inspect {
        /// List every pool
        #[arg(long)]
        pools: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Decode the blob, write it back and compare the bytes
    Verify,

    /// Print the packed encoding of an integer
    Packed {
        /// Value to encode
        #[arg(allow_hyphen_values = true)]
        value: i64,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { pools, format } => {
            let path = cli.path.ok_or("Blob path required for inspect")?;
            commands::inspect::run(&path, pools, &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Blob path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Packed { value } => {
            commands::packed::run(value)?;
        }
        Commands::Version => {
            println!("cpsave CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("cpsave core v{}", cpsave_core::VERSION);
        }
    }

    Ok(())
}
