use crate::svc::chat::Chat;
use anyhow::Result;
use parley_core::config::Config;
use std::path::PathBuf;
use tracing::info;

mod commands;
mod repl;

/// Options from the command line that override the config file.
#[derive(Debug, Default)]
pub struct ChatOptions {
    pub history: Option<PathBuf>,
    pub no_bot: bool,
    pub no_seed: bool,
}

/// Starts a chat session and runs the interactive REPL.
pub async fn execute(config: &Config, options: ChatOptions) -> Result<()> {
    let mut chat = Chat::new(config, options.history);
    if options.no_bot {
        chat.set_bot_enabled(false);
    }
    let seed = config.seed_on_start && !options.no_seed;
    let start = chat.start(seed).await;
    info!(seed, seeded_lines = start.seeded_lines, "chat session started");
    repl::run(chat, start).await
}
