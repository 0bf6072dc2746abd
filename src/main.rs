// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand};
use live_overlay::Config;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "live-overlay")]
#[command(about = "Live camera preview with inference overlays")]
#[command(version = live_overlay::constants::app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    #[command(flatten)]
    capture: CaptureArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Settings that override the config file
#[derive(Args, Debug, Default)]
struct CaptureArgs {
    /// Capture device path, or "test" for the built-in test pattern
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Run without a preview window
    #[arg(long, global = true)]
    headless: bool,

    /// Capture resolution, e.g. 640x480
    #[arg(short, long, global = true, value_parser = parse_resolution)]
    resolution: Option<(u32, u32)>,

    /// Do not mirror the preview
    #[arg(long, global = true)]
    no_mirror: bool,

    /// Config file (default: <config dir>/live-overlay/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live demo with the QR code detector (default)
    Run {
        /// Stop after this many frames
        #[arg(short, long)]
        frames: Option<u64>,
    },

    /// Grab one frame, draw the current overlays on it and save it
    Snapshot {
        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the overlay color palette
    Palette,
}

fn parse_resolution(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width = w.trim().parse().map_err(|_| format!("invalid width '{}'", w))?;
    let height = h.trim().parse().map_err(|_| format!("invalid height '{}'", h))?;
    Ok((width, height))
}

impl CaptureArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(device) = &self.device {
            config.device = device.clone();
        }
        if self.headless {
            config.gui = false;
        }
        if let Some((width, height)) = self.resolution {
            config.width = width;
            config.height = height;
        }
        if self.no_mirror {
            config.mirror_preview = false;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=live_overlay=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.capture.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    cli.capture.apply(&mut config);
    config.validate()?;

    match cli.command {
        Some(Commands::Palette) => cli::print_palette(),
        Some(Commands::Snapshot { output }) => cli::snapshot(&config, &output),
        Some(Commands::Run { frames }) => {
            if frames.is_some() {
                config.max_frames = frames;
            }
            cli::run_live(&config)
        }
        None => cli::run_live(&config),
    }
}
