//! Trimcrop CLI: trim, crop, and compress videos to a target size.
//!
//! Usage:
//!   trimcrop export <INPUT> [OPTIONS]   Trim/crop and compress a clip
//!   trimcrop compress <INPUT>           Compress a whole clip to the target size
//!   trimcrop probe <INPUT>              Show what the encoder will work with
//!   trimcrop check [--write-config]     Check that ffmpeg and ffprobe are usable

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use trimcrop_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "trimcrop",
    about = "Trim, crop, and compress videos to a target size",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trim and crop a clip, then compress it to the target size
    Export {
        /// Source video
        input: PathBuf,

        /// Trim start in seconds
        #[arg(long)]
        start: Option<f64>,

        /// Trim end in seconds
        #[arg(long)]
        end: Option<f64>,

        /// Crop rectangle in percent of the frame: X,Y,WIDTH,HEIGHT
        #[arg(long)]
        crop: Option<String>,

        /// Target size in megabytes
        #[arg(short, long)]
        size: Option<u32>,

        /// Print the conversion request instead of running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Compress a whole clip to the target size
    Compress {
        /// Source video
        input: PathBuf,

        /// Target size in megabytes
        #[arg(short, long)]
        size: Option<u32>,
    },

    /// Show duration, audio bitrate, dimensions, and the bitrate plan
    Probe {
        /// Source video
        input: PathBuf,

        /// Target size in megabytes to plan for
        #[arg(short, long)]
        size: Option<u32>,

        /// Print the probe as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that ffmpeg and ffprobe are usable
    Check {
        /// Write the effective configuration to the user config file
        #[arg(long)]
        write_config: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        None => AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    trimcrop_common::logging::init_logging(&config.logging);
    config.validate()?;

    match cli.command {
        Commands::Export {
            input,
            start,
            end,
            crop,
            size,
            dry_run,
        } => {
            commands::export::run(
                &config,
                commands::export::ExportArgs {
                    input,
                    start,
                    end,
                    crop,
                    size,
                    dry_run,
                },
            )
            .await
        }
        Commands::Compress { input, size } => commands::compress::run(&config, input, size).await,
        Commands::Probe { input, size, json } => {
            commands::probe::run(&config, input, size, json).await
        }
        Commands::Check { write_config } => {
            commands::check::run(&config, cli.config.as_deref(), write_config)
        }
    }
}
