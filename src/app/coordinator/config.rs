//! Sync coordinator configuration

use std::path::PathBuf;

use crate::app::runner::{FailurePolicy, RunnerConfig};
use crate::constants::sync;

/// Settings for one sync run
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Destination directory
    pub location: PathBuf,
    /// Download concurrency and failure handling
    pub runner: RunnerConfig,
    /// Upper bound on listing pages
    pub max_pages: u32,
    /// Compute and report the plan without touching the destination
    pub dry_run: bool,
}

impl SyncConfig {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            runner: RunnerConfig::default(),
            max_pages: sync::DEFAULT_MAX_PAGES,
            dry_run: false,
        }
    }

    pub fn with_concurrent_tasks(mut self, concurrent_tasks: usize) -> Self {
        self.runner = RunnerConfig {
            failure_policy: self.runner.failure_policy,
            ..RunnerConfig::with_concurrency(concurrent_tasks)
        };
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.runner.failure_policy = failure_policy;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
