//! Durable append-only storage for transcript lines.
use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Could not append to {path}: {source}")]
    Append { path: PathBuf, source: io::Error },
    #[error("Could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("Could not write {path}: {source}")]
    Export { path: PathBuf, source: io::Error },
    #[error("Could not load {path}: {source}")]
    Import { path: PathBuf, source: io::Error },
}

/// File-backed transcript log.
///
/// Every call opens, uses and closes the file, so no handle outlives a call.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    path: PathBuf,
}

impl TranscriptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `line` followed by a newline, creating the file if needed.
    pub fn append(&self, line: &str) -> Result<(), StorageError> {
        let wrap = |source| StorageError::Append {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(wrap)?;
        writeln!(file, "{line}").map_err(wrap)?;
        debug!(path = %self.path.display(), "appended transcript line");
        Ok(())
    }

    /// Reads the whole backing file. `Ok(None)` when it does not exist yet.
    pub fn read_all(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Writes `content` to an arbitrary location, replacing any existing file.
    pub fn export_to(&self, path: &Path, content: &str) -> Result<(), StorageError> {
        fs::write(path, content).map_err(|source| StorageError::Export {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads an arbitrary file. Independent of the backing file.
    pub fn import_from(&self, path: &Path) -> Result<String, StorageError> {
        fs::read_to_string(path).map_err(|source| StorageError::Import {
            path: path.to_path_buf(),
            source,
        })
    }
}
