//! Dataset migration tool
//!
//! Copies a log-structured dataset store into the memory-mapped format,
//! preserving keys and values byte for byte.
//!
//! # Usage
//!
//! ```bash
//! # Copy a dataset into a new mapped store
//! migrate /datasets/train-log /datasets/train-mapped
//!
//! # With verbose progress logging
//! migrate --log-level debug /datasets/train-log /datasets/train-mapped
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Dataset store migration
#[derive(Parser, Debug)]
#[command(name = "migrate")]
#[command(about = "Copy a log-structured dataset store into the mapped format")]
struct Args {
    /// Path of the log-structured store to read
    source: PathBuf,

    /// Path for the new mapped store (must not exist)
    dest: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Prints usage or the parse error; --help and --version land
            // here too and exit successfully.
            return match e.print() {
                Ok(()) if !e.use_stderr() => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    // Initialize logging
    let filter = tracing_subscriber::filter::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Migrating {} -> {}",
        args.source.display(),
        args.dest.display()
    );

    match mapdata::migrate::run(&args.source, &args.dest) {
        Ok(report) => {
            tracing::info!("Done: {report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Migration failed: {e}");
            ExitCode::FAILURE
        }
    }
}
