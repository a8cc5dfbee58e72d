//! parley cli definition and entrypoint.
mod chat;
pub mod ux;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use parley_core::config::get_config;

use crate::cli::chat::ChatOptions;
use crate::log::setup_logging;

/// parley - a local chat log with a simple reply bot.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file to use. Created with defaults if missing.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// History file, overrides `history_file` from the config.
    #[arg(long)]
    history: Option<PathBuf>,

    /// Start with bot replies turned off.
    #[arg(long)]
    no_bot: bool,

    /// Do not show the previous history on start.
    #[arg(long)]
    no_seed: bool,

    /// Show verbose logs.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn chat_options(&self) -> ChatOptions {
        ChatOptions {
            history: self.history.clone(),
            no_bot: self.no_bot,
            no_seed: self.no_seed,
        }
    }
}

/// Runs the main CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        setup_logging().context("Failed to set up logging")?;
    }

    let config = get_config(cli.config.clone()).context("Failed to load configuration")?;
    chat::execute(&config, cli.chat_options()).await
}
