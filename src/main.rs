//! Caity - Unified CLI
//!
//! Terminal client and scripted replays for the session controller.

#![warn(missing_docs)]

mod cli;

use std::path::{Path, PathBuf};

use anyhow::Result;
use caity_client::{ClientConfig, ReplayScript, backend::LocalBackend, final_screen, run_script};
use clap::Parser;
use cli::{Cli, Command};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(build) = cli.build {
        config = config.with_build(build);
    }

    match cli.command {
        Command::Tui { log_file } => run_tui(config, log_file).await,
        Command::Replay { script } => run_replay(&script),
    }
}

/// Run the terminal client with logs going to a file
async fn run_tui(config: ClientConfig, log_file: PathBuf) -> Result<()> {
    let file = std::fs::File::create(&log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::sync::Arc::new(file))
        .with_ansi(false)
        .init();

    info!(build = %config.build(), log_file = %log_file.display(), "Starting Caity terminal client");
    let backend = LocalBackend::from_config(&config);
    caity_client::run_tui(config, backend).await
}

/// Replay a script and print its frames as JSON lines
#[instrument(skip_all, fields(script = %script.display()))]
fn run_replay(script: &Path) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let script = ReplayScript::from_file(script)?;
    let report = run_script(&script)?;
    print!("{}", report.to_json_lines()?);
    info!(screen = %final_screen(&report), "Replay complete");
    Ok(())
}
