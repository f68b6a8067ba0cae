//! Task runner configuration
//!
//! The runner is configured by an explicit value passed to each run rather
//! than read from global state.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::constants::sync;

/// What the runner does when a task fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop claiming tasks and report the first failure immediately
    #[default]
    FailFast,
    /// Run every task and collect failures in the summary
    Continue,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::FailFast => f.write_str("fail-fast"),
            FailurePolicy::Continue => f.write_str("continue"),
        }
    }
}

/// Configuration for one bounded run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Maximum simultaneous in-flight tasks
    pub concurrent_tasks: NonZeroUsize,
    /// Behaviour on task failure
    pub failure_policy: FailurePolicy,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            concurrent_tasks: NonZeroUsize::new(sync::DEFAULT_CONCURRENT_TASKS)
                .unwrap_or(NonZeroUsize::MIN),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl RunnerConfig {
    /// Config with the given concurrency bound, clamped to at least one
    pub fn with_concurrency(concurrent_tasks: usize) -> Self {
        Self {
            concurrent_tasks: NonZeroUsize::new(concurrent_tasks).unwrap_or(NonZeroUsize::MIN),
            ..Default::default()
        }
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }
}
