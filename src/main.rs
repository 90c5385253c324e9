// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! phototag-annotate: tag every photo with a cloud vision model
//!
//! Runs with no arguments: reads `config.json` if present (defaults
//! otherwise), tags `photos/*` and rewrites `photos/images.json`.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use phototag::{Annotator, AppConfig, PhototagError, Result};

/// phototag-annotate - batch photo tagging
#[derive(Parser, Debug)]
#[command(name = "phototag-annotate")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Tag every photo in a directory using a cloud vision model", long_about = None)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long)]
    trace: bool,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long)]
    quiet: bool,

    /// Output format for the run summary
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Write a default configuration file and exit
    #[arg(long)]
    init_config: bool,

    /// Overwrite an existing configuration file with --init-config
    #[arg(long, requires = "init_config")]
    force: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if cli.init_config {
        return init_config(&cli.config, cli.force);
    }

    let config = AppConfig::load(&cli.config)?;

    let annotator = Annotator::from_config(&config).map_err(|e| {
        error!("Cannot start annotator: {}", e);
        e
    })?;

    let summary = annotator.run().await.map_err(|e| {
        error!("Annotation run aborted: {}", e);
        e
    })?;

    if cli.format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

/// Write the default configuration so it can be edited
fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(PhototagError::Config(format!(
            "{} already exists. Use --force to overwrite",
            path.display()
        )));
    }

    AppConfig::default().save(path)?;
    info!("Wrote default configuration to {:?}", path);
    info!(
        "Set the API key in ${} before running",
        AppConfig::default().annotator.api_key_env
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_runs_without_arguments() {
        let cli = Cli::try_parse_from(["phototag-annotate"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert_eq!(cli.format, "text");
        assert!(!cli.verbose);
        assert!(!cli.init_config);
    }

    #[test]
    fn test_cli_options() {
        let cli = Cli::try_parse_from([
            "phototag-annotate", "--config", "/tmp/pt.json", "--format", "json", "-v",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/tmp/pt.json"));
        assert_eq!(cli.format, "json");
        assert!(cli.verbose);

        assert!(Cli::try_parse_from(["phototag-annotate", "--format", "yaml"]).is_err());
        assert!(Cli::try_parse_from(["phototag-annotate", "--force"]).is_err());
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        init_config(&path, false).unwrap();
        assert!(AppConfig::load(&path).is_ok());

        assert!(matches!(init_config(&path, false), Err(PhototagError::Config(_))));
        assert!(init_config(&path, true).is_ok());
    }
}
