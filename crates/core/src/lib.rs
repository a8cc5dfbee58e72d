mod assets;

pub mod config;
pub mod reply;
pub mod session;
pub mod store;
pub mod transcript;

pub use crate::assets::{default_config_path, log_file_path, rotated_log_path};
