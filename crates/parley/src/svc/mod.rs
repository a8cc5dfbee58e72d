//! Services layer for the app. Wraps the parley_core session for the cli.
pub mod chat;
