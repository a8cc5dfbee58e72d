use crate::cli::chat::commands::CliCommand;
use crate::cli::ux::{ChatMessageType, format_entry, format_line, style_chat_text};
use crate::svc::chat::Chat;
use anyhow::Result;
use clap::{CommandFactory, Parser};
use parley_core::session::SessionStartResult;
use rustyline::completion::{Candidate, Completer};
use rustyline::error::ReadlineError;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Editor, Helper, Highlighter, Validator};
use tracing::debug;

// -------------
// REPL completion
// -------------
#[derive(Helper, Validator, Highlighter)]
struct Repl {
    pub command_names: Vec<String>,
}

#[derive(Debug)]
struct CompletionCandidate {
    text: String,
    display_string: String,
}

impl CompletionCandidate {
    pub fn new(text: &str) -> Self {
        let display_string = style_chat_text(text, ChatMessageType::Footer).to_string();
        Self {
            text: text.to_owned(),
            display_string,
        }
    }
}

impl Candidate for CompletionCandidate {
    fn display(&self) -> &str {
        &self.display_string
    }

    fn replacement(&self) -> &str {
        &self.text
    }
}

impl Completer for Repl {
    type Candidate = CompletionCandidate;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> Result<(usize, Vec<Self::Candidate>), ReadlineError> {
        // Only the command name is completed, arguments are file paths.
        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, Vec::new()));
        }

        let candidates = self
            .command_names
            .iter()
            .filter(|name| name.starts_with(line))
            .map(|name| CompletionCandidate::new(name))
            .collect();

        Ok((0, candidates))
    }
}

impl Hinter for Repl {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if line.is_empty() || pos < line.len() || !line.starts_with('/') {
            return None;
        }
        self.command_names
            .iter()
            .find(|&cmd_name| cmd_name.starts_with(line))
            .map(|cmd_name| cmd_name[line.len()..].into())
    }
}

fn command_names() -> Vec<String> {
    CliCommand::command()
        .get_subcommands()
        .flat_map(|c| c.get_name_and_visible_aliases())
        .map(|s| format!("/{s}"))
        .collect()
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn print_start(start: &SessionStartResult) {
    for notice in &start.notices {
        println!("{}", format_line(notice));
    }
}

/// Runs the interactive REPL for the chat session.
pub async fn run(mut chat: Chat, start: SessionStartResult) -> Result<()> {
    println!("Welcome to parley! Type '/help' for commands, '/q' to exit.");
    if start.seeded_lines > 0 {
        // Show what was loaded from the history file.
        for entry in chat.entries_from(0).await {
            println!("{}", format_entry(&entry));
        }
    } else {
        print_start(&start);
    }
    println!(
        "{}",
        style_chat_text(
            &format!("History file: {}", chat.history_path().await.display()),
            ChatMessageType::Footer
        )
    );

    let config = rustyline::Config::builder()
        .history_ignore_dups(true)?
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .build();

    let mut rl: Editor<Repl, DefaultHistory> = Editor::with_config(config)?;
    rl.set_helper(Some(Repl {
        command_names: command_names(),
    }));

    loop {
        let bot_state = if chat.bot_enabled() { "on" } else { "off" };
        let prompt = format!(
            "\n{}\n{}",
            style_chat_text(&format!("[bot: {bot_state}]"), ChatMessageType::Prompt),
            style_chat_text("> ", ChatMessageType::Prompt)
        );
        let readline = rl.readline(&prompt);
        match readline {
            Ok(line) => {
                let trimmed_line = line.trim();
                if trimmed_line.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed_line)?;

                if trimmed_line.starts_with('/') {
                    let args = match shlex::split(trimmed_line) {
                        Some(args) => args,
                        None => {
                            eprintln!(
                                "{}",
                                style_chat_text("Unbalanced quotes.", ChatMessageType::Error)
                            );
                            continue;
                        }
                    };
                    match CliCommand::try_parse_from(args) {
                        Ok(cli_command) => {
                            let mut confirm = |question: &str| -> Result<bool> {
                                match rl.readline(question) {
                                    Ok(answer) => Ok(is_yes(&answer)),
                                    Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                                        Ok(false)
                                    }
                                    Err(e) => Err(e.into()),
                                }
                            };
                            if !cli_command.command.execute(&mut chat, &mut confirm).await? {
                                return Ok(()); // Exit REPL
                            }
                        }
                        Err(e) => {
                            e.print()?;
                        }
                    }
                } else {
                    for line in chat.send(trimmed_line).await? {
                        println!("{}", format_line(&line));
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Type /quit to exit.");
                continue;
            }
            Err(ReadlineError::Eof) => {
                debug!("eof, leaving chat");
                chat.close().await;
                println!("\nBye!");
                return Ok(());
            }
            Err(err) => {
                return Err(err.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names_cover_commands() {
        let names = command_names();
        for expected in ["/save", "/load", "/clear", "/bot", "/history", "/exit"] {
            assert!(names.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn test_repl_completer_for_commands() {
        let repl = Repl {
            command_names: vec!["/help".to_string(), "/clear".to_string()],
        };
        let line = "/c";
        let history = DefaultHistory::new();
        let (start, candidates) = repl
            .complete(line, line.len(), &rustyline::Context::new(&history))
            .unwrap();
        assert_eq!(start, 0);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].replacement(), "/clear");
    }

    #[test]
    fn test_repl_completer_ignores_messages_and_arguments() {
        let repl = Repl {
            command_names: command_names(),
        };
        let history = DefaultHistory::new();
        let ctx = rustyline::Context::new(&history);

        let (_, candidates) = repl.complete("hello", 5, &ctx).unwrap();
        assert!(candidates.is_empty());
        let (_, candidates) = repl.complete("/save /tm", 9, &ctx).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_repl_hinter() {
        let repl = Repl {
            command_names: vec!["/help".to_string(), "/clear".to_string()],
        };
        let history = DefaultHistory::new();
        let ctx = rustyline::Context::new(&history);

        let line = "/h";
        let hint = repl.hint(line, line.len(), &ctx).unwrap();
        assert_eq!(hint, "elp");

        assert!(repl.hint("abc", 3, &ctx).is_none());
        assert!(repl.hint("/help", 3, &ctx).is_none());
        assert!(repl.hint("", 0, &ctx).is_none());
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
    }
}
