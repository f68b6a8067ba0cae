//! Command-line argument parsing for Photoset Mirror
//!
//! This module defines the CLI structure using clap derive macros. Flags
//! given here take precedence over the config file and the environment.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::FailurePolicy;
use crate::config::AppConfig;

/// Photoset Mirror - keep a local directory in sync with a Flickr photoset
#[derive(Parser, Debug)]
#[command(
    name = "photoset_mirror",
    version,
    about = "Mirror a Flickr photoset into a local directory",
    long_about = "Lists every photo of a Flickr photoset, deletes local files that are no longer in the set,
and downloads the original of every photo not yet present, a bounded number at a time."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (trace level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - only report errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Delete stale files and download missing photos
    Sync(SyncArgs),

    /// Show what a sync would delete and download
    Plan(SourceArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Which photoset to mirror, and where
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Photoset identifier
    #[arg(short, long)]
    pub set: Option<String>,

    /// Destination directory
    #[arg(short, long, value_name = "DIR")]
    pub location: Option<PathBuf>,

    /// Flickr API key
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,
}

/// Arguments for the sync command
#[derive(Args, Debug, Clone, Default)]
pub struct SyncArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Number of downloads in flight at once
    #[arg(short = 'j', long, value_name = "N")]
    pub concurrent_tasks: Option<usize>,

    /// Keep downloading after a failure and report all failures at the end
    #[arg(long)]
    pub continue_on_error: bool,

    /// Show the plan without deleting or downloading anything
    #[arg(long)]
    pub dry_run: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Where to write it (defaults to the per-user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level forced by the command line, if any
    ///
    /// Without a flag the `[logging] level` setting applies.
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::TRACE)
        } else if self.global.verbose {
            Some(tracing::Level::DEBUG)
        } else {
            None
        }
    }
}

impl SourceArgs {
    /// Override configured values with the ones given on the command line
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(set) = &self.set {
            config.flickr.set = set.clone();
        }
        if let Some(location) = &self.location {
            config.sync.location = location.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.flickr.api_key = api_key.clone();
        }
    }
}

impl SyncArgs {
    /// Override configured values with the ones given on the command line
    pub fn apply(&self, config: &mut AppConfig) {
        self.source.apply(config);
        if let Some(concurrent_tasks) = self.concurrent_tasks {
            config.sync.concurrent_tasks = concurrent_tasks;
        }
        if self.continue_on_error {
            config.sync.failure_policy = FailurePolicy::Continue;
        }
    }
}
