//! Command-line interface for the Caity client.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use caity_client::BuildProfile;

/// Caity - session and navigation controller for the coin game client
#[derive(Parser, Debug)]
#[command(name = "caity")]
#[command(about = "Session and screen navigation for the Caity coin game", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the build profile
    #[arg(long, global = true)]
    pub build: Option<BuildProfile>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the terminal client against the in-memory backend
    Tui {
        /// File to write logs to (keeps the terminal clean)
        #[arg(long, default_value = "caity_tui.log")]
        log_file: PathBuf,
    },

    /// Replay a scripted session and print one JSON snapshot per step
    Replay {
        /// Path to the replay script (TOML)
        script: PathBuf,
    },
}
