//! midi2hands - split a MIDI performance into left and right hand channels
//!
//! Subcommands:
//! - `midi2hands split <input> [output]` - Tag every note with a hand channel
//! - `midi2hands inspect <input>` - Summarize a MIDI file
//! - `midi2hands config` - Show the effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use handsconf::HandsConfig;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "midi2hands")]
#[command(about = "Split a MIDI performance into left and right hand channels")]
#[command(version)]
struct Cli {
    /// Config file used in place of ./midi2hands.toml
    #[arg(long, global = true, env = "MIDI2HANDS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assign every note to a hand and write the tagged file
    Split {
        /// MIDI file to read
        input: PathBuf,

        /// Where to write the result (default: <input>_hands.mid)
        output: Option<PathBuf>,

        /// JSON logistic model to score notes with
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Keyboard split pitch used when no model is given
        #[arg(short, long, conflicts_with = "model", value_parser = clap::value_parser!(u8).range(0..=127))]
        split_point: Option<u8>,

        /// Process tracks concurrently
        #[arg(long)]
        parallel: bool,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print format, timing, and per-track note statistics
    Inspect {
        /// MIDI file to read
        input: PathBuf,
    },

    /// Print the effective configuration and where it came from
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) = HandsConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    // RUST_LOG is already folded into log_level by the config loader
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::INFO.into())
                .parse_lossy(&config.telemetry.log_level),
        )
        .init();

    match cli.command {
        Commands::Split {
            input,
            output,
            model,
            split_point,
            parallel,
            json,
        } => {
            if let Some(model) = model {
                config.classifier.model = Some(model);
            }
            if let Some(split_point) = split_point {
                config.classifier.model = None;
                config.classifier.split_point = split_point;
            }
            config.engine.parallel |= parallel;

            commands::split(&input, output.as_deref(), &config, json)?;
        }
        Commands::Inspect { input } => {
            commands::inspect(&input)?;
        }
        Commands::Config => {
            commands::show_config(&config, &sources);
        }
    }

    Ok(())
}
