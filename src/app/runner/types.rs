//! Task and result types for the bounded runner

use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;

/// A zero-argument unit of asynchronous work
///
/// The closure is called once, by the worker slot that claims it.
pub type Task<E> = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), E>> + Send>;

/// Box an async closure into a [`Task`]
pub fn task<E, F, Fut>(f: F) -> Task<E>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<(), E>> + Send + 'static,
{
    Box::new(move || Box::pin(f()) as BoxFuture<'static, Result<(), E>>)
}

/// Failure of one task, tagged with its submission index
#[derive(Error, Debug)]
pub enum RunError<E> {
    /// The task returned an error
    #[error("task {index} failed: {source}")]
    Task {
        index: usize,
        #[source]
        source: E,
    },

    /// The task panicked
    #[error("task {index} panicked")]
    Panicked { index: usize },
}

impl<E> RunError<E> {
    /// Submission index of the failed task
    pub fn index(&self) -> usize {
        match self {
            RunError::Task { index, .. } | RunError::Panicked { index } => *index,
        }
    }

    /// The task's own error, if it returned one
    pub fn into_source(self) -> Option<E> {
        match self {
            RunError::Task { source, .. } => Some(source),
            RunError::Panicked { .. } => None,
        }
    }
}

/// Outcome of a completed run
#[derive(Debug)]
pub struct RunSummary<E> {
    /// Number of submitted tasks
    pub total: usize,
    /// Tasks that completed successfully
    pub succeeded: usize,
    /// Failed tasks, in completion order (only under the continue policy)
    pub failures: Vec<RunError<E>>,
    /// Wall time of the run
    pub elapsed: Duration,
}

impl<E> RunSummary<E> {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            succeeded: 0,
            failures: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Whether every task succeeded
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.succeeded == self.total
    }

    /// Tasks that finished, successfully or not
    pub fn completed(&self) -> usize {
        self.succeeded + self.failures.len()
    }
}
