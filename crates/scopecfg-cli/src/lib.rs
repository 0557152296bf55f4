//! # scopecfg-cli
//!
//! Operator tool for scopecfg files.  The binary in `main.rs` only parses
//! arguments and sets up logging; everything it runs lives here so it can be
//! tested without spawning a process.

pub mod cli;
pub mod commands;
pub mod settings;

pub use cli::{Cli, Command};
pub use commands::{run, Status};
pub use settings::{load_settings, SettingsError, ToolSettings};
