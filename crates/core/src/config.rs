use std::{
    fs::{self, File},
    io::Write,
    path::PathBuf,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::{
    assets::{default_config, default_config_path},
    reply::ReplyRules,
    session::SessionConfig,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("File system error: {0}")]
    IO(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YAMLError(#[from] serde_yaml::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,
    #[serde(default = "default_true")]
    pub bot_enabled: bool,
    #[serde(default = "default_true")]
    pub seed_on_start: bool,
    #[serde(default)]
    pub replies: ReplyRules,
}

fn default_history_file() -> PathBuf {
    PathBuf::from("chat_history.txt")
}

fn default_reply_delay_ms() -> u64 {
    250
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_file: default_history_file(),
            reply_delay_ms: default_reply_delay_ms(),
            bot_enabled: true,
            seed_on_start: true,
            replies: ReplyRules::default(),
        }
    }
}

impl Config {
    fn validate(self) -> Result<Self, ConfigError> {
        if self.history_file.as_os_str().is_empty() {
            return Err(ConfigError::Config("history_file must not be empty".into()));
        }
        if let Some(rule) = self.replies.rules.iter().find(|r| r.reply.trim().is_empty()) {
            return Err(ConfigError::Config(format!(
                "Reply for rule '{}' must not be empty",
                rule.name
            )));
        }
        for rule in &self.replies.rules {
            if let Some(problem) = rule.matcher.problem() {
                return Err(ConfigError::Config(format!(
                    "Match for rule '{}' {problem}",
                    rule.name
                )));
            }
        }
        Ok(self)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            history_path: self.history_file.clone(),
            reply_delay: Duration::from_millis(self.reply_delay_ms),
            rules: self.replies.clone(),
        }
    }
}

#[instrument(skip(config_path))]
pub fn create_or_get_config_file(
    config_path: Option<PathBuf>,
) -> Result<(bool, PathBuf), ConfigError> {
    let actual_path = config_path.unwrap_or_else(default_config_path);

    let parent_dir = actual_path.parent().ok_or_else(|| {
        ConfigError::IO(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Config path has no parent directory",
        ))
    })?;

    if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
        fs::create_dir_all(parent_dir)?;
    }

    if actual_path.exists() {
        Ok((true, actual_path))
    } else {
        File::create(&actual_path)?.write_all(default_config().as_bytes())?;
        Ok((false, actual_path))
    }
}

#[instrument(skip(config_path))]
pub fn get_config(config_path: Option<PathBuf>) -> Result<Config, ConfigError> {
    let (_, config_file) = create_or_get_config_file(config_path)?;
    let content = fs::read_to_string(&config_file)?;
    let config: Config = serde_yaml::from_str(&content)?;
    config.validate()
}
