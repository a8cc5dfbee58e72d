use console::{Style, StyledObject, style};
use parley_core::transcript::{Speaker, TranscriptEntry, TranscriptLine};

/// Represents the type of a chat message, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMessageType {
    /// The prompt for user input.
    Prompt,
    User,
    Bot,
    /// Notices from the session itself.
    System,
    /// Lines loaded verbatim from a file.
    Raw,
    /// Footer information, like status.
    Footer,
    /// An error message.
    Error,
}

impl From<Speaker> for ChatMessageType {
    fn from(speaker: Speaker) -> Self {
        match speaker {
            Speaker::User => ChatMessageType::User,
            Speaker::Bot => ChatMessageType::Bot,
            Speaker::System => ChatMessageType::System,
        }
    }
}

/// Styles a string of text according to the specified `ChatMessageType`.
pub fn style_chat_text(text: &str, style: ChatMessageType) -> StyledObject<&str> {
    let style_obj = match style {
        ChatMessageType::Prompt => Style::new().blue().bold(),
        ChatMessageType::User => Style::new().blue(),
        ChatMessageType::Bot => Style::new().green(),
        ChatMessageType::System => Style::new().yellow(),
        ChatMessageType::Raw => Style::new(),
        ChatMessageType::Footer => Style::new().white().dim(),
        ChatMessageType::Error => Style::new().red().bold(),
    };
    style_obj.apply_to(text)
}

pub fn format_line(line: &TranscriptLine) -> String {
    style_chat_text(&line.render(), line.speaker().into()).to_string()
}

pub fn format_entry(entry: &TranscriptEntry) -> String {
    match entry {
        TranscriptEntry::Line(line) => format_line(line),
        TranscriptEntry::Raw(raw) => style_chat_text(raw, ChatMessageType::Raw).to_string(),
    }
}

/// Prints a formatted error message to stderr.
pub fn present_error(error: anyhow::Error) {
    let error_text = style("ERROR:").red().bold();
    eprintln!("\n{error_text} {error:#}");
}
