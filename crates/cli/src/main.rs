//! medianorm
//!
//! Usage:
//!     medianorm standardize 20240707_121110.jpg --source Device0
//!     medianorm upload --media camera
//!     medianorm process --dry-run

mod commands;
mod error;

use clap::{ArgAction, Parser, Subcommand};
use medianorm_pipeline::device::MediaDirectory;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "medianorm", version, about = "Canonical names for device media files")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging; repeat for more detail
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the canonical name of each file name
    Standardize {
        #[arg(required = true)]
        names: Vec<String>,
        /// Use this schema instead of classifying each name
        #[arg(long)]
        schema: Option<String>,
        /// Source identifier (defaults to the configured one)
        #[arg(long)]
        source: Option<String>,
    },
    /// Print the canonical name of every media file in a directory
    Scan {
        directory: PathBuf,
        /// Extension allow-list (defaults to the configured one)
        #[arg(long = "ext")]
        extensions: Vec<String>,
        /// Source identifier (defaults to the configured one)
        #[arg(long)]
        source: Option<String>,
    },
    /// List registered schemas in classification order
    Schemas,
    /// Copy media files into the upload stage
    Upload {
        /// Directory to upload; discovers the connected device when omitted
        directory: Option<PathBuf>,
        /// Device name the source id is computed from
        #[arg(long)]
        device: Option<String>,
        /// Media folder on the device
        #[arg(long, value_parser = parse_media_directory, default_value = "camera")]
        media: MediaDirectory,
    },
    /// Move every upload to its processed or failed location
    Process {
        /// Report what would happen without changing any stage
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the connected device
    Device,
}

fn parse_media_directory(value: &str) -> Result<MediaDirectory, String> {
    value.parse().map_err(|_| {
        let known: Vec<&str> = MediaDirectory::ALL.iter().map(MediaDirectory::as_str).collect();
        format!("expected one of {}", known.join(", "))
    })
}

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(cli.verbose).into()))
        .with_writer(std::io::stderr)
        .init();

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            if err.is_retryable() {
                eprintln!("This may succeed if retried.");
            }
            ExitCode::FAILURE
        },
    }
}
