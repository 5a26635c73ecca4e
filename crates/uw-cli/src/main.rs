//! Console front end for the Uhrwerk interactive-fiction engine.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "uw",
    about = "Uhrwerk: timed interactive fiction",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a story interactively, or from a script of commands
    Play {
        /// Story content file (.json)
        content: PathBuf,

        /// Read commands from this file instead of stdin
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Load and validate a story, then print a summary
    Check {
        /// Story content file (.json)
        content: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("UW_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> miette::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            content,
            script,
            no_color,
        } => commands::play::run(&content, script.as_deref(), no_color),
        Commands::Check { content } => commands::check::run(&content),
    }
}
