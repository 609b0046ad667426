//! Poise CLI: behavioral analysis of recorded interview videos.
//!
//! Usage:
//!   poise analyze <VIDEO>...   Score emotion, eye contact, and posture
//!   poise probe <VIDEO>        Show frame count, frame rate, and sampling plan
//!   poise check                Check for ffmpeg and ffprobe
//!   poise config               Show or save the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use poise_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "poise",
    about = "Interview video analysis: facial expression, eye contact, and posture",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more videos
    Analyze {
        /// Video files to analyze
        #[arg(required = true)]
        videos: Vec<PathBuf>,

        /// Landmark/emotion annotation track (JSONL). Give one for all videos
        /// or one per video, in order. Defaults to `<video>.annotations.jsonl`.
        #[arg(short, long)]
        annotations: Vec<PathBuf>,

        /// Run landmark scoring on every Nth frame
        #[arg(long)]
        landmark_stride: Option<u64>,

        /// Run emotion classification on every Nth frame
        #[arg(long)]
        emotion_stride: Option<u64>,

        /// Print the JSON response instead of a summary
        #[arg(long)]
        json: bool,

        /// Give up on a video after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Probe a video and show the sampling plan
    Probe {
        /// Video file
        video: PathBuf,
    },

    /// Check for the external decoding tools
    Check,

    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    poise_common::logging::init_logging(&logging);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let outcome = match cli.command {
        Commands::Analyze {
            videos,
            annotations,
            landmark_stride,
            emotion_stride,
            json,
            timeout_secs,
        } => {
            runtime.block_on(commands::analyze::run(
                &config,
                commands::analyze::AnalyzeArgs {
                    videos,
                    annotations,
                    landmark_stride,
                    emotion_stride,
                    json,
                    timeout_secs,
                },
            ))
        }
        Commands::Probe { video } => commands::probe::run(&config, video),
        Commands::Check => commands::check::run(&config),
        Commands::Config { save } => commands::config::run(&config, save),
    };

    // Runs abandoned past their deadline must not hold the process open.
    runtime.shutdown_timeout(commands::analyze::CANCEL_GRACE);
    outcome
}
