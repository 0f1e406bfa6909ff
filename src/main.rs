// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dancefloor::cli;
use dancefloor::config::{builtin_presets, load_preset_file};

#[derive(Parser)]
#[command(name = "dancefloor")]
#[command(about = "Depth-camera dance floor visualizer")]
#[command(version = dancefloor::constants::app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Extra presets to load from a JSON file
    #[arg(long, global = true)]
    presets_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the terminal visualizer (default)
    Run {
        /// Show schedule file: JSON array of {"preset", "secs"} entries
        #[arg(long)]
        schedule: Option<PathBuf>,

        /// Seed for the synthetic scene and in-paint jitter
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List available presets
    Presets,

    /// Render frames from the synthetic scene and save a PNG
    Snapshot {
        /// Number of frames to run before capturing
        #[arg(short, long, default_value = "90")]
        frames: u32,

        /// Output file path (default: ~/Pictures/dancefloor/dancefloor_TIMESTAMP.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Preset to render with
        #[arg(short, long)]
        preset: Option<String>,

        /// Seed for the synthetic scene and in-paint jitter
        #[arg(long, default_value = "0")]
        seed: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=dancefloor=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let args = Cli::parse();

    let mut presets = builtin_presets();
    if let Some(path) = &args.presets_file {
        presets.extend(load_preset_file(path)?);
    }

    match args.command {
        None => dancefloor::terminal::run(presets, Vec::new(), None),
        Some(Commands::Run { schedule, seed }) => {
            let events = match schedule {
                Some(path) => cli::load_schedule(&path, &presets)?,
                None => Vec::new(),
            };
            dancefloor::terminal::run(presets, events, seed)
        }
        Some(Commands::Presets) => {
            cli::list_presets(&presets);
            Ok(())
        }
        Some(Commands::Snapshot {
            frames,
            output,
            preset,
            seed,
        }) => {
            let preset = match &preset {
                Some(name) => Some(
                    presets
                        .iter()
                        .find(|p| &p.name == name)
                        .ok_or_else(|| format!("unknown preset '{}'", name))?,
                ),
                None => None,
            };
            let path = cli::snapshot(frames, output, preset, seed)?;
            println!("Snapshot saved: {}", path.display());
            Ok(())
        }
    }
}
