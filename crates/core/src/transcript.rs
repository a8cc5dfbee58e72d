//! In-memory transcript of a chat session.
use chrono::{DateTime, Local};

/// Who produced a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Bot,
    System,
}

/// A single message in the transcript. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptLine {
    timestamp: DateTime<Local>,
    speaker: Speaker,
    text: String,
}

impl TranscriptLine {
    /// Creates a line stamped with the current wall-clock time.
    ///
    /// Returns `None` when `text` is blank after trimming.
    pub fn now(speaker: Speaker, text: &str) -> Option<Self> {
        Self::at(Local::now(), speaker, text)
    }

    pub fn at(timestamp: DateTime<Local>, speaker: Speaker, text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            timestamp,
            speaker,
            text: text.to_string(),
        })
    }

    /// Notice text is produced by the session itself and never blank.
    pub(crate) fn system(text: &str) -> Self {
        Self {
            timestamp: Local::now(),
            speaker: Speaker::System,
            text: text.trim().to_string(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Formats the line the way it is displayed and persisted.
    pub fn render(&self) -> String {
        match self.speaker {
            Speaker::User => format!("You ({}): {}", self.timestamp.format("%H:%M"), self.text),
            Speaker::Bot => format!("Bot ({}): {}", self.timestamp.format("%H:%M"), self.text),
            Speaker::System => format!(
                "[{}] SYSTEM: {}",
                self.timestamp.format("%Y-%m-%d %H:%M:%S"),
                self.text
            ),
        }
    }
}

/// An entry shown in the transcript.
///
/// `Raw` entries come from the persistent log or an imported file. They are
/// displayed verbatim and never persisted again.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEntry {
    Line(TranscriptLine),
    Raw(String),
}

impl TranscriptEntry {
    pub fn render(&self) -> String {
        match self {
            TranscriptEntry::Line(line) => line.render(),
            TranscriptEntry::Raw(raw) => raw.clone(),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, TranscriptEntry::Raw(_))
    }

    pub fn as_line(&self) -> Option<&TranscriptLine> {
        match self {
            TranscriptEntry::Line(line) => Some(line),
            TranscriptEntry::Raw(_) => None,
        }
    }
}

/// Append-only list of entries in chronological order.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, line: TranscriptLine) {
        self.entries.push(TranscriptEntry::Line(line));
    }

    /// Appends every line of `content` as a raw entry.
    pub fn push_raw(&mut self, content: &str) -> usize {
        let before = self.entries.len();
        self.entries.extend(
            content
                .lines()
                .map(|raw| TranscriptEntry::Raw(raw.to_string())),
        );
        self.entries.len() - before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    /// Renders all entries, one per line.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(TranscriptEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
