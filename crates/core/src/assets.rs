//! Where parley keeps its files on disk.
//!
//! The config file lives under the XDG config home and the log under the XDG
//! data home, each in a `parley` subdirectory. The chat history file is not
//! placed here, it is relative to the working directory unless configured.
use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;

const APP_DIR: &str = "parley";
const CONFIG_FILE: &str = "parley.yml";
const LOG_FILE: &str = "parley.log";

static PLATFORM_CONFIG_HOME: Lazy<Option<PathBuf>> = Lazy::new(dirs::config_dir);
static PLATFORM_DATA_HOME: Lazy<Option<PathBuf>> = Lazy::new(dirs::data_local_dir);

// An unset or empty XDG variable falls back to the platform directory, and
// to the working directory when the platform has none.
fn app_dir(xdg_var: &str, platform_home: &Option<PathBuf>) -> PathBuf {
    env::var_os(xdg_var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| platform_home.clone())
        .unwrap_or_default()
        .join(APP_DIR)
}

/// Config file used when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    app_dir("XDG_CONFIG_HOME", &PLATFORM_CONFIG_HOME).join(CONFIG_FILE)
}

/// Log file path. Its directory is created if missing.
pub fn log_file_path() -> io::Result<PathBuf> {
    let dir = app_dir("XDG_DATA_HOME", &PLATFORM_DATA_HOME);
    fs::create_dir_all(&dir)?;
    Ok(dir.join(LOG_FILE))
}

/// Where a log file is moved when it grows too large.
pub fn rotated_log_path(log_path: &Path) -> PathBuf {
    let mut name = log_path.file_name().unwrap_or_default().to_os_string();
    name.push(".old");
    log_path.with_file_name(name)
}

pub(crate) fn default_config() -> &'static str {
    include_str!("../data/config.yml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_var<T>(key: &str, value: Option<&Path>, f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap();
        let previous = env::var_os(key);
        // SAFETY: environment access in these tests is serialized by ENV_LOCK.
        unsafe {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
        let result = f();
        unsafe {
            match previous {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
        result
    }

    #[test]
    fn test_config_path_under_xdg_config_home() {
        let home = tempfile::tempdir().unwrap();
        let path = with_var("XDG_CONFIG_HOME", Some(home.path()), default_config_path);
        assert_eq!(path, home.path().join("parley").join("parley.yml"));
    }

    #[test]
    fn test_config_path_falls_back_to_platform_dir() {
        let path = with_var("XDG_CONFIG_HOME", None, default_config_path);
        let expected = dirs::config_dir()
            .unwrap_or_default()
            .join("parley")
            .join("parley.yml");
        assert_eq!(path, expected);
    }

    #[test]
    fn test_empty_xdg_value_is_ignored() {
        let empty = with_var("XDG_CONFIG_HOME", Some(Path::new("")), default_config_path);
        let unset = with_var("XDG_CONFIG_HOME", None, default_config_path);
        assert_eq!(empty, unset);
    }

    #[test]
    fn test_log_file_path_creates_directory() {
        let home = tempfile::tempdir().unwrap();
        let path = with_var("XDG_DATA_HOME", Some(home.path()), log_file_path).unwrap();
        assert_eq!(path, home.path().join("parley").join("parley.log"));
        assert!(home.path().join("parley").is_dir());
        assert!(!path.exists());
    }

    #[test]
    fn test_rotated_log_path() {
        assert_eq!(
            rotated_log_path(Path::new("/var/log/parley.log")),
            PathBuf::from("/var/log/parley.log.old")
        );
    }

    #[test]
    fn test_default_config_is_embedded() {
        let config = default_config();
        assert!(config.contains("history_file:"));
        assert!(config.contains("replies:"));
    }
}
