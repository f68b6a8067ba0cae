//! Command-line interface components
//!
//! This module contains CLI-specific code for Photoset Mirror, including
//! argument parsing, command handlers, and progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{Cli, Commands, ConfigAction, ConfigArgs, GlobalArgs, SourceArgs, SyncArgs};
pub use commands::{handle_config, handle_plan, handle_sync};
pub use progress::ProgressDisplay;
