//! File logging for `--verbose` runs.
use std::{
    fs::{self, OpenOptions},
    io::{self, LineWriter},
    path::Path,
    sync::Mutex,
};

use anyhow::Context;
use parley_core::{log_file_path, rotated_log_path};
use tracing_subscriber::{EnvFilter, fmt::time::OffsetTime};

/// Logs are rotated once they grow past this size.
const MAX_LOG_BYTES: u64 = 100 * 1024;
const DEFAULT_FILTER: &str = "parley=debug,parley_core=debug,rustyline=info";

/// Moves `log_path` aside when it is larger than `max_bytes`, replacing any
/// earlier rotated file. Returns whether a rotation happened.
fn rotate_if_large(log_path: &Path, max_bytes: u64) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(metadata) => metadata.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if size <= max_bytes {
        return Ok(false);
    }
    // rename replaces the target on unix but not on windows
    let rotated = rotated_log_path(log_path);
    if rotated.exists() {
        fs::remove_file(&rotated)?;
    }
    fs::rename(log_path, rotated)?;
    Ok(true)
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Sends tracing output to `parley.log` in the data directory.
///
/// `RUST_LOG` overrides the default filter.
pub fn setup_logging() -> anyhow::Result<()> {
    let log_path = log_file_path().context("Failed to create the log directory")?;
    rotate_if_large(&log_path, MAX_LOG_BYTES)
        .with_context(|| format!("Failed to rotate {}", log_path.display()))?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(Mutex::new(LineWriter::new(log_file)))
        .with_ansi(false)
        .with_timer(OffsetTime::local_rfc_3339()?)
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rotate_missing_log() {
        let dir = tempdir().unwrap();
        assert!(!rotate_if_large(&dir.path().join("parley.log"), 10).unwrap());
    }

    #[test]
    fn test_small_log_is_kept() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("parley.log");
        fs::write(&log, "short").unwrap();

        assert!(!rotate_if_large(&log, 10).unwrap());
        assert_eq!(fs::read_to_string(&log).unwrap(), "short");
    }

    #[test]
    fn test_large_log_replaces_old_backup() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("parley.log");
        let old = dir.path().join("parley.log.old");
        fs::write(&log, "x".repeat(11)).unwrap();
        fs::write(&old, "stale").unwrap();

        assert!(rotate_if_large(&log, 10).unwrap());
        assert!(!log.exists());
        assert_eq!(fs::read_to_string(&old).unwrap(), "x".repeat(11));
    }
}
