use anyhow::{Context, Result};
use parley_core::config::Config;
use parley_core::session::{
    ChatSession, ReplyDelivery, SendResult, SessionStartResult, TransferResult, schedule_reply,
};
use parley_core::transcript::{TranscriptEntry, TranscriptLine};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Chat between the user and the rule-based bot.
pub struct Chat {
    session: Arc<Mutex<ChatSession>>,
    bot_enabled: bool,
}

impl Chat {
    pub fn new(config: &Config, history: Option<PathBuf>) -> Self {
        let mut session_config = config.session_config();
        if let Some(history) = history {
            session_config.history_path = history;
        }
        Self {
            session: Arc::new(Mutex::new(ChatSession::new(session_config))),
            bot_enabled: config.bot_enabled,
        }
    }

    pub async fn start(&self, seed: bool) -> SessionStartResult {
        self.session.lock().await.start(seed)
    }

    pub fn bot_enabled(&self) -> bool {
        self.bot_enabled
    }

    pub fn set_bot_enabled(&mut self, enabled: bool) {
        self.bot_enabled = enabled;
    }

    pub async fn history_path(&self) -> PathBuf {
        self.session.lock().await.store().path().to_path_buf()
    }

    /// Sends a message and waits for the bot reply, if any.
    ///
    /// Returns the lines added to the transcript in display order. Blank
    /// messages add nothing.
    pub async fn send(&self, message: &str) -> Result<Vec<TranscriptLine>> {
        let (mut lines, pending, delay) = {
            let mut session = self.session.lock().await;
            match session.send(message, self.bot_enabled) {
                SendResult::Ignored => return Ok(Vec::new()),
                SendResult::Sent {
                    user_line,
                    notices,
                    pending,
                } => {
                    let mut lines = vec![user_line];
                    lines.extend(notices);
                    (lines, pending, session.reply_delay())
                }
            }
        };

        if let Some(pending) = pending {
            let delivery = schedule_reply(Arc::downgrade(&self.session), pending, delay)
                .await
                .context("Bot reply task failed")?;
            match delivery {
                ReplyDelivery::Delivered { line, notice } => {
                    lines.push(line);
                    lines.extend(notice);
                }
                ReplyDelivery::Skipped => debug!("bot reply skipped"),
            }
        }
        Ok(lines)
    }

    pub async fn clear_display(&self) {
        self.session.lock().await.clear_display();
    }

    pub async fn export(&self, path: &Path) -> TransferResult {
        self.session.lock().await.export_history(path)
    }

    pub async fn import(&self, path: &Path) -> TransferResult {
        self.session.lock().await.import_history(path)
    }

    /// Entries currently displayed, starting at `from`.
    pub async fn entries_from(&self, from: usize) -> Vec<TranscriptEntry> {
        let session = self.session.lock().await;
        session
            .transcript()
            .entries()
            .iter()
            .skip(from)
            .cloned()
            .collect()
    }

    pub async fn transcript_len(&self) -> usize {
        self.session.lock().await.transcript().len()
    }

    pub async fn close(&self) {
        self.session.lock().await.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::transcript::Speaker;
    use tempfile::tempdir;

    fn test_config() -> Config {
        Config {
            reply_delay_ms: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_send_returns_user_and_bot_lines() -> Result<()> {
        let dir = tempdir()?;
        let chat = Chat::new(&test_config(), Some(dir.path().join("h.txt")));
        chat.start(true).await;

        let lines = chat.send("hi there").await?;

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].speaker(), Speaker::User);
        assert_eq!(lines[1].speaker(), Speaker::Bot);
        assert_eq!(chat.transcript_len().await, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_send_blank_and_bot_disabled() -> Result<()> {
        let dir = tempdir()?;
        let mut chat = Chat::new(&test_config(), Some(dir.path().join("h.txt")));
        chat.start(true).await;

        assert!(chat.send("  ").await?.is_empty());

        chat.set_bot_enabled(false);
        let lines = chat.send("hello").await?;
        assert_eq!(lines.len(), 1);
        assert!(!chat.bot_enabled());
        Ok(())
    }

    #[tokio::test]
    async fn test_history_override() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.txt");
        let chat = Chat::new(&test_config(), Some(path.clone()));
        assert_eq!(chat.history_path().await, path);
    }

    #[tokio::test]
    async fn test_entries_from() -> Result<()> {
        let dir = tempdir()?;
        let chat = Chat::new(&test_config(), Some(dir.path().join("h.txt")));
        chat.send("one").await?;
        chat.send("two").await?;

        let tail = chat.entries_from(2).await;
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].as_line().map(|l| l.text()), Some("two"));
        Ok(())
    }
}
