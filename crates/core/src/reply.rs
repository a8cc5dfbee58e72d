//! Rule-based bot replies.
//!
//! Rules are evaluated in order against the lower-cased message and the first
//! match wins. When nothing matches, the message is echoed back.
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Messages longer than this are truncated in the echo reply.
pub const ECHO_MAX_CHARS: usize = 80;
const ECHO_KEEP_CHARS: usize = 77;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    /// Matches when the message contains any of the tokens.
    ContainsAny(Vec<String>),
    /// Matches when the message ends with the suffix.
    EndsWith(String),
}

impl Matcher {
    /// Describes why this matcher would accept every message, if it would.
    ///
    /// An empty token or suffix matches anything (`"".contains("")`), which
    /// silently shadows every later rule and the echo fallback.
    pub fn problem(&self) -> Option<&'static str> {
        match self {
            Matcher::ContainsAny(tokens) if tokens.is_empty() => Some("has no tokens"),
            Matcher::ContainsAny(tokens) if tokens.iter().any(|t| t.trim().is_empty()) => {
                Some("has a blank token")
            }
            Matcher::EndsWith(suffix) if suffix.trim().is_empty() => Some("has a blank suffix"),
            _ => None,
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        match self {
            Matcher::ContainsAny(tokens) => tokens
                .iter()
                .any(|token| lowered.contains(token.to_lowercase().as_str())),
            Matcher::EndsWith(suffix) => lowered.ends_with(suffix.to_lowercase().as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReplyRule {
    pub name: String,
    #[serde(rename = "match", with = "serde_yaml::with::singleton_map")]
    pub matcher: Matcher,
    pub reply: String,
}

impl ReplyRule {
    fn contains_any(name: &str, tokens: &[&str], reply: &str) -> Self {
        Self {
            name: name.to_string(),
            matcher: Matcher::ContainsAny(tokens.iter().map(|t| t.to_string()).collect()),
            reply: reply.to_string(),
        }
    }
}

/// Ordered rule table plus the echo fallback.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReplyRules {
    pub rules: Vec<ReplyRule>,
    #[serde(default = "default_echo_prefix")]
    pub echo_prefix: String,
}

fn default_echo_prefix() -> String {
    "You said: ".to_string()
}

impl Default for ReplyRules {
    fn default() -> Self {
        Self {
            rules: vec![
                ReplyRule::contains_any(
                    "greeting",
                    &["hello", "hi", "salom"],
                    "Hello! How can I help you?",
                ),
                ReplyRule::contains_any(
                    "identity",
                    &["ism", "who are you"],
                    "I'm a simple learning bot.",
                ),
                ReplyRule::contains_any("readiness", &["tayyor", "ready"], "Yes, I'm ready."),
                ReplyRule::contains_any("gratitude", &["rahmat", "thanks"], "You're welcome!"),
                ReplyRule {
                    name: "question".to_string(),
                    matcher: Matcher::EndsWith("?".to_string()),
                    reply: "That's a good question. I haven't learned that yet, but I tried."
                        .to_string(),
                },
            ],
            echo_prefix: default_echo_prefix(),
        }
    }
}

/// Stateless reply generator over a [`ReplyRules`] table.
#[derive(Debug, Clone, Default)]
pub struct ReplyEngine {
    rules: ReplyRules,
}

impl ReplyEngine {
    pub fn new(rules: ReplyRules) -> Self {
        Self { rules }
    }

    /// Computes the reply for an already trimmed, non-empty message.
    pub fn reply(&self, message: &str) -> String {
        let lowered = message.to_lowercase();
        match self.rules.rules.iter().find(|rule| rule.matcher.matches(&lowered)) {
            Some(rule) => {
                trace!(rule = %rule.name, "reply rule matched");
                rule.reply.clone()
            }
            None => format!("{}{}", self.rules.echo_prefix, truncate_echo(message)),
        }
    }
}

fn truncate_echo(message: &str) -> String {
    if message.chars().count() <= ECHO_MAX_CHARS {
        return message.to_string();
    }
    let mut truncated: String = message.chars().take(ECHO_KEEP_CHARS).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
