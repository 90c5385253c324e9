// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! phototag-thumbs: bounded thumbnails for every photo
//!
//! Runs with no arguments: reads `config.json` if present (defaults
//! otherwise) and writes `photos/thumbnails/thumb_<name>` for each photo.

use clap::Parser;
use std::path::PathBuf;
use tracing::error;

use phototag::{AppConfig, Result, Thumbnailer};

#[derive(Parser, Debug)]
#[command(name = "phototag-thumbs")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Generate aspect-preserving thumbnails for a photos directory")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long)]
    trace: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.trace {
        "trace"
    } else if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = AppConfig::load(&args.config)?;

    Thumbnailer::new(&config).run().map_err(|e| {
        error!("Thumbnail run aborted: {}", e);
        e
    })?;

    Ok(())
}
