//! Keyline CLI
//!
//! Command-line tools for step animation documents:
//! - Inspect tracks and durations
//! - Convert legacy absolute-pose documents to offset form
//! - Sample poses at a time, or play a whole step frame by frame
//! - Shift every keyframe in time
//! - Preview easing curves
//! - Print the effective configuration

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Keyframe animation tools for assembly-instruction steps
#[derive(Parser, Debug)]
#[command(name = "keyline")]
#[command(about = "Keyframe animation tools for assembly-instruction steps")]
#[command(version)]
struct Args {
    /// Config file (defaults to ./keyline.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize the tracks of a document
    Inspect {
        /// Step animation JSON
        document: PathBuf,
    },

    /// Convert a legacy absolute-pose document to offset form
    Normalize {
        document: PathBuf,
        /// Rest poses JSON (`{"objectId": {position, rotation, scale}}`)
        #[arg(long)]
        rest: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the sampled frame at one time
    Sample {
        document: PathBuf,
        /// Time in seconds
        #[arg(short, long)]
        time: f64,
        /// Rest poses JSON
        #[arg(long)]
        rest: Option<PathBuf>,
    },

    /// Shift every keyframe by a number of seconds
    Shift {
        document: PathBuf,
        /// Seconds to add (negative moves earlier, clamped at 0)
        #[arg(short, long, allow_hyphen_values = true)]
        delta: f64,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Preview an easing curve, or list all easings
    Ease {
        /// Easing id, e.g. `easeInOutCubic`
        kind: Option<String>,
        /// Number of preview samples
        #[arg(short, long)]
        samples: Option<usize>,
    },

    /// Play the step once and print one JSON frame per tick
    Frames {
        document: PathBuf,
        /// Ticks per second (defaults to the configured tick rate)
        #[arg(long)]
        fps: Option<f64>,
        #[arg(long)]
        rest: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = config::load(args.config.as_deref())?;

    match args.command {
        Command::Inspect { document } => commands::inspect(&document),
        Command::Normalize {
            document,
            rest,
            output,
        } => commands::normalize_document(&document, &rest, output.as_deref()),
        Command::Sample {
            document,
            time,
            rest,
        } => commands::sample_document(&document, time, rest.as_deref()),
        Command::Shift {
            document,
            delta,
            output,
        } => commands::shift(&document, delta, output.as_deref(), &config),
        Command::Ease { kind, samples } => commands::ease(kind.as_deref(), samples, &config),
        Command::Frames {
            document,
            fps,
            rest,
        } => commands::frames(&document, fps, rest.as_deref(), &config),
        Command::Config => {
            print!("{}", config::to_toml(&config)?);
            Ok(())
        }
    }
}
