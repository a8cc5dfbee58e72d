//! A chat session owns the displayed transcript, persists new lines and asks
//! the reply engine for bot answers.
//!
//! Storage failures never escape the session. They are turned into system
//! notices shown inline in the transcript.
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    reply::{ReplyEngine, ReplyRules},
    store::TranscriptStore,
    transcript::{Speaker, Transcript, TranscriptLine},
};

/// Everything needed to build a [`ChatSession`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub history_path: PathBuf,
    pub reply_delay: Duration,
    pub rules: ReplyRules,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from("chat_history.txt"),
            reply_delay: Duration::from_millis(250),
            rules: ReplyRules::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Ready,
    /// Terminal. Messages are still recorded but never answered.
    Closed,
}

// Display generation reserved for a closed session.
const CLOSED_GENERATION: u64 = u64::MAX;

/// The display generation a reply was computed for.
///
/// The session bumps its counter on every clear and pins it to
/// [`CLOSED_GENERATION`] on close, so a reply from an older view goes stale.
#[derive(Debug, Clone)]
struct Generation {
    current: Arc<AtomicU64>,
    issued: u64,
}

impl Generation {
    fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.issued
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStartResult {
    /// Raw lines loaded from the persistent log.
    pub seeded_lines: usize,
    pub notices: Vec<TranscriptLine>,
}

/// A bot reply computed at send time, appended later by [`ChatSession::finalize_reply`].
#[derive(Debug, Clone)]
pub struct PendingReply {
    line: TranscriptLine,
    generation: Generation,
}

impl PendingReply {
    pub fn line(&self) -> &TranscriptLine {
        &self.line
    }

    /// True once the display was cleared or the session closed after this
    /// reply was computed.
    pub fn is_stale(&self) -> bool {
        !self.generation.is_current()
    }
}

#[derive(Debug)]
pub enum SendResult {
    /// The message was blank, nothing changed.
    Ignored,
    Sent {
        user_line: TranscriptLine,
        /// Notices raised while persisting the user line.
        notices: Vec<TranscriptLine>,
        pending: Option<PendingReply>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyDelivery {
    Delivered {
        line: TranscriptLine,
        notice: Option<TranscriptLine>,
    },
    /// The display was cleared or the session closed before delivery.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransferResult {
    Completed { path: PathBuf, lines: usize },
    /// The imported file had no content.
    Empty { path: PathBuf },
    Failed { notice: TranscriptLine },
}

pub struct ChatSession {
    store: TranscriptStore,
    engine: ReplyEngine,
    transcript: Transcript,
    phase: SessionPhase,
    reply_delay: Duration,
    generation: Arc<AtomicU64>,
}

impl ChatSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            store: TranscriptStore::new(config.history_path),
            engine: ReplyEngine::new(config.rules),
            transcript: Transcript::new(),
            phase: SessionPhase::Uninitialized,
            reply_delay: config.reply_delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn store(&self) -> &TranscriptStore {
        &self.store
    }

    pub fn reply_delay(&self) -> Duration {
        self.reply_delay
    }

    /// Marks the session ready and optionally shows the persistent log.
    ///
    /// Seeded lines are displayed but never written back to the log. A closed
    /// session stays closed.
    pub fn start(&mut self, seed_from_store: bool) -> SessionStartResult {
        if self.phase != SessionPhase::Closed {
            self.phase = SessionPhase::Ready;
        }
        if !seed_from_store {
            return SessionStartResult::default();
        }

        match self.store.read_all() {
            Ok(Some(content)) if !content.trim().is_empty() => {
                let notices = self.push_notice("Loaded previous chat history.", true);
                let seeded_lines = self.transcript.push_raw(content.trim());
                info!(seeded_lines, path = %self.store.path().display(), "seeded transcript");
                SessionStartResult {
                    seeded_lines,
                    notices,
                }
            }
            Ok(_) => {
                debug!(path = %self.store.path().display(), "no previous history");
                SessionStartResult::default()
            }
            Err(e) => {
                warn!(error = %e, "failed to read history");
                SessionStartResult {
                    seeded_lines: 0,
                    notices: self.push_notice(&format!("Could not load history: {e}"), false),
                }
            }
        }
    }

    /// Records a user message and, when `bot_enabled`, prepares the bot reply.
    ///
    /// The reply is not appended here. The caller delivers it after
    /// [`ChatSession::reply_delay`], see [`schedule_reply`]. After
    /// [`ChatSession::close`] the message is still recorded but `pending` is
    /// always `None`.
    pub fn send(&mut self, message: &str, bot_enabled: bool) -> SendResult {
        let Some(user_line) = TranscriptLine::now(Speaker::User, message) else {
            debug!("ignoring blank message");
            return SendResult::Ignored;
        };

        self.transcript.push_line(user_line.clone());
        let notices = self.persist(&user_line).into_iter().collect();

        let pending = if self.phase == SessionPhase::Closed {
            debug!("session closed, no reply");
            None
        } else if bot_enabled {
            let reply = self.engine.reply(user_line.text());
            let generation = Generation {
                current: Arc::clone(&self.generation),
                issued: self.generation.load(Ordering::Acquire),
            };
            TranscriptLine::at(user_line.timestamp(), Speaker::Bot, &reply)
                .map(|line| PendingReply { line, generation })
        } else {
            None
        };

        SendResult::Sent {
            user_line,
            notices,
            pending,
        }
    }

    /// Appends and persists a pending reply unless it went stale.
    pub fn finalize_reply(&mut self, pending: PendingReply) -> ReplyDelivery {
        if pending.is_stale() {
            debug!("pending reply is stale");
            return ReplyDelivery::Skipped;
        }
        self.transcript.push_line(pending.line.clone());
        let notice = self.persist(&pending.line);
        ReplyDelivery::Delivered {
            line: pending.line,
            notice,
        }
    }

    /// Empties the displayed transcript. The persistent log is untouched.
    pub fn clear_display(&mut self) {
        self.transcript.clear();
        if self.phase != SessionPhase::Closed {
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        debug!("display cleared");
    }

    /// Writes the displayed transcript to `path`.
    pub fn export_history(&mut self, path: &Path) -> TransferResult {
        let content = format!("{}\n", self.transcript.render().trim());
        match self.store.export_to(path, &content) {
            Ok(()) => {
                info!(path = %path.display(), "exported history");
                TransferResult::Completed {
                    path: path.to_path_buf(),
                    lines: self.transcript.len(),
                }
            }
            Err(e) => {
                warn!(error = %e, "export failed");
                self.failed_transfer(&format!("Could not save file: {e}"))
            }
        }
    }

    /// Shows the content of `path` without writing it to the persistent log.
    pub fn import_history(&mut self, path: &Path) -> TransferResult {
        let content = match self.store.import_from(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, "import failed");
                return self.failed_transfer(&format!("Could not load file: {e}"));
            }
        };
        if content.trim().is_empty() {
            return TransferResult::Empty {
                path: path.to_path_buf(),
            };
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.push_notice(&format!("Loaded history from: {name}"), true);
        let lines = self.transcript.push_raw(content.trim());
        info!(lines, path = %path.display(), "imported history");
        TransferResult::Completed {
            path: path.to_path_buf(),
            lines,
        }
    }

    /// Closes the session for good. Replies still waiting for delivery are
    /// skipped and later sends produce none.
    pub fn close(&mut self) {
        self.phase = SessionPhase::Closed;
        self.generation.store(CLOSED_GENERATION, Ordering::Release);
    }

    fn failed_transfer(&mut self, text: &str) -> TransferResult {
        let notice = TranscriptLine::system(text);
        self.transcript.push_line(notice.clone());
        TransferResult::Failed { notice }
    }

    fn push_notice(&mut self, text: &str, persist: bool) -> Vec<TranscriptLine> {
        let line = TranscriptLine::system(text);
        self.transcript.push_line(line.clone());
        let mut pushed = vec![line.clone()];
        if persist {
            pushed.extend(self.persist(&line));
        }
        pushed
    }

    // Save errors are shown but not persisted.
    fn persist(&mut self, line: &TranscriptLine) -> Option<TranscriptLine> {
        match self.store.append(&line.render()) {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "failed to persist transcript line");
                let notice = TranscriptLine::system(&format!("Save error: {e}"));
                self.transcript.push_line(notice.clone());
                Some(notice)
            }
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Delivers `pending` after `delay` if the session is still alive.
///
/// Only a weak reference is held, so dropping the session abandons the reply.
pub fn schedule_reply(
    session: Weak<Mutex<ChatSession>>,
    pending: PendingReply,
    delay: Duration,
) -> JoinHandle<ReplyDelivery> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if pending.is_stale() {
            return ReplyDelivery::Skipped;
        }
        let Some(session) = session.upgrade() else {
            debug!("session closed before reply delivery");
            return ReplyDelivery::Skipped;
        };
        let mut session = session.lock().await;
        session.finalize_reply(pending)
    })
}
