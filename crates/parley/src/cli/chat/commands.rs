use crate::cli::ux::{ChatMessageType, format_entry, format_line, style_chat_text};
use crate::svc::chat::Chat;
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use parley_core::session::TransferResult;
use std::path::{Path, PathBuf};

// -------------
// REPL commands
// -------------
#[derive(Parser, Debug)]
#[command(multicall = true)]
pub struct CliCommand {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Subcommand, Debug, Hash, PartialEq, Eq)]
pub enum Command {
    /// Save the displayed chat to a file (.txt suggested)
    #[command(alias = "s")]
    Save {
        /// File to write
        path: PathBuf,
    },
    /// Show a saved chat. It is not added to the history file.
    #[command(alias = "l")]
    Load {
        /// File to read
        path: PathBuf,
    },
    /// Clear the display. The history file is not touched.
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Turn bot replies on or off.
    ///
    /// With no arguments, shows whether replies are enabled.
    #[command(alias = "b")]
    Bot { state: Option<Toggle> },
    /// Show the displayed chat
    #[command(alias = "h")]
    History,
    /// Exit the chat session
    #[command(alias = "q", alias = "quit")]
    Exit,
}

impl Command {
    /// Executes a REPL command.
    ///
    /// `confirm` asks the user a yes/no question. Returns `Ok(false)` if the
    /// REPL should exit.
    pub async fn execute(
        self,
        chat: &mut Chat,
        confirm: &mut dyn FnMut(&str) -> Result<bool>,
    ) -> Result<bool> {
        match self {
            Command::Save { ref path } => self.execute_save(chat, path).await,
            Command::Load { ref path } => self.execute_load(chat, path).await,
            Command::Clear { yes } => self.execute_clear(chat, yes, confirm).await,
            Command::Bot { state } => self.execute_bot(chat, state),
            Command::History => self.execute_history(chat).await,
            Command::Exit => self.execute_exit(chat).await,
        }
    }

    async fn execute_save(&self, chat: &Chat, path: &Path) -> Result<bool> {
        match chat.export(path).await {
            TransferResult::Completed { path, lines } => {
                println!("History saved to: {} ({lines} lines)", path.display());
            }
            TransferResult::Empty { .. } => {}
            TransferResult::Failed { notice } => println!("{}", format_line(&notice)),
        }
        Ok(true)
    }

    async fn execute_load(&self, chat: &Chat, path: &Path) -> Result<bool> {
        let before = chat.transcript_len().await;
        match chat.import(path).await {
            TransferResult::Completed { .. } | TransferResult::Failed { .. } => {
                for entry in chat.entries_from(before).await {
                    println!("{}", format_entry(&entry));
                }
            }
            TransferResult::Empty { path } => {
                println!("Nothing to load from: {}", path.display());
            }
        }
        Ok(true)
    }

    async fn execute_clear(
        &self,
        chat: &Chat,
        yes: bool,
        confirm: &mut dyn FnMut(&str) -> Result<bool>,
    ) -> Result<bool> {
        let confirmed = yes
            || confirm(
                "Are you sure you want to clear the displayed chat (this does NOT delete the history file)? [y/N] ",
            )?;
        if confirmed {
            chat.clear_display().await;
            println!("Display cleared. Chat history file remains unchanged.");
        } else {
            println!("Clear cancelled.");
        }
        Ok(true)
    }

    fn execute_bot(&self, chat: &mut Chat, state: Option<Toggle>) -> Result<bool> {
        if let Some(state) = state {
            chat.set_bot_enabled(state == Toggle::On);
        }
        let status = if chat.bot_enabled() { "on" } else { "off" };
        println!(
            "{}",
            style_chat_text(
                &format!("Bot replies: {status}"),
                ChatMessageType::Footer
            )
        );
        Ok(true)
    }

    async fn execute_history(&self, chat: &Chat) -> Result<bool> {
        let entries = chat.entries_from(0).await;
        if entries.is_empty() {
            println!("Nothing to show.");
        }
        for entry in entries {
            println!("{}", format_entry(&entry));
        }
        Ok(true)
    }

    async fn execute_exit(&self, chat: &Chat) -> Result<bool> {
        chat.close().await;
        println!("Bye!");
        Ok(false)
    }
}
