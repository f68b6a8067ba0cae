//! Bounded-concurrency task runner
//!
//! Runs an ordered list of independent tasks with at most K in flight. The
//! runner spawns `min(K, tasks)` worker slots; each slot claims the next
//! unstarted task in submission order, runs it to completion, then claims
//! again. No slot idles while unstarted tasks remain, and no more than K
//! tasks are ever running.
//!
//! # Failure handling
//!
//! Under [`FailurePolicy::FailFast`] the first failure halts the schedule
//! (no slot claims another task afterwards) and is returned at once, without
//! waiting for tasks still in flight. Those tasks are not cancelled: their
//! slots finish them in the background and then exit. Tasks completed before
//! the failure stay completed.
//!
//! Under [`FailurePolicy::Continue`] every task runs and failures are
//! collected in the [`RunSummary`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use photoset_mirror::app::runner::{run_all, task, RunnerConfig, Task};
//!
//! # async fn example() {
//! let tasks: Vec<Task<std::io::Error>> = (0..10)
//!     .map(|i| task(move || async move {
//!         println!("task {i}");
//!         Ok(())
//!     }))
//!     .collect();
//!
//! let summary = run_all(tasks, &RunnerConfig::with_concurrency(3)).await.unwrap();
//! assert!(summary.is_success());
//! # }
//! ```

pub mod config;
pub mod types;

#[cfg(test)]
mod tests;

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub use config::{FailurePolicy, RunnerConfig};
pub use types::{task, RunError, RunSummary, Task};

/// Tasks not yet claimed, and whether claiming has stopped
struct Schedule<E> {
    pending: VecDeque<(usize, Task<E>)>,
    halted: bool,
}

/// State shared by all worker slots of one run
struct Shared<E> {
    schedule: Mutex<Schedule<E>>,
    policy: FailurePolicy,
    in_flight: AtomicUsize,
    completed: AtomicUsize,
}

impl<E> Shared<E> {
    /// Claim the next task in submission order, unless the run has halted
    fn claim(&self) -> Option<(usize, Task<E>)> {
        let mut schedule = self.schedule.lock().unwrap_or_else(PoisonError::into_inner);
        if schedule.halted {
            return None;
        }
        schedule.pending.pop_front()
    }

    /// Stop all slots from claiming further tasks
    fn halt(&self) {
        let mut schedule = self.schedule.lock().unwrap_or_else(PoisonError::into_inner);
        schedule.halted = true;
    }
}

type Outcome<E> = (usize, Result<(), RunError<E>>);

/// Run `tasks` with at most `config.concurrent_tasks` in flight
///
/// # Errors
///
/// Under the fail-fast policy, returns the first task failure observed.
/// Under the continue policy this never fails; inspect
/// [`RunSummary::failures`].
pub async fn run_all<E>(
    tasks: Vec<Task<E>>,
    config: &RunnerConfig,
) -> Result<RunSummary<E>, RunError<E>>
where
    E: std::error::Error + Send + 'static,
{
    let start = Instant::now();
    let total = tasks.len();
    let mut summary = RunSummary::new(total);

    if total == 0 {
        debug!("No tasks to run");
        return Ok(summary);
    }

    let slots = config.concurrent_tasks.get().min(total);
    info!(
        "Running {} tasks with {} concurrent slots ({})",
        total, slots, config.failure_policy
    );

    let shared = Arc::new(Shared {
        schedule: Mutex::new(Schedule {
            pending: tasks.into_iter().enumerate().collect(),
            halted: false,
        }),
        policy: config.failure_policy,
        in_flight: AtomicUsize::new(0),
        completed: AtomicUsize::new(0),
    });

    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
    for slot in 0..slots {
        tokio::spawn(run_slot(slot, Arc::clone(&shared), outcome_tx.clone()));
    }
    drop(outcome_tx);

    while let Some((index, outcome)) = outcome_rx.recv().await {
        match outcome {
            Ok(()) => summary.succeeded += 1,
            Err(err) => match config.failure_policy {
                FailurePolicy::FailFast => {
                    error!(
                        "Task {} failed, abandoning run with {} tasks still in flight: {}",
                        index,
                        shared.in_flight.load(Ordering::SeqCst),
                        err
                    );
                    return Err(err);
                }
                FailurePolicy::Continue => {
                    warn!("Task {} failed: {}", index, err);
                    summary.failures.push(err);
                }
            },
        }
    }

    summary.elapsed = start.elapsed();
    info!(
        "Run finished: {}/{} tasks succeeded in {:?}",
        summary.succeeded, total, summary.elapsed
    );
    Ok(summary)
}

/// One worker slot: claim, run, report, repeat
async fn run_slot<E>(slot: usize, shared: Arc<Shared<E>>, outcome_tx: mpsc::UnboundedSender<Outcome<E>>)
where
    E: Send + 'static,
{
    while let Some((index, task)) = shared.claim() {
        shared.in_flight.fetch_add(1, Ordering::SeqCst);
        debug!(slot, index, "Starting task");

        let result = match AssertUnwindSafe(async move { task().await })
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(RunError::Task { index, source }),
            Err(_) => Err(RunError::Panicked { index }),
        };

        shared.in_flight.fetch_sub(1, Ordering::SeqCst);
        shared.completed.fetch_add(1, Ordering::SeqCst);

        if result.is_err() && shared.policy == FailurePolicy::FailFast {
            shared.halt();
        }

        // The receiver is gone once a fail-fast run has returned
        if outcome_tx.send((index, result)).is_err() {
            break;
        }
    }
    debug!(
        slot,
        completed = shared.completed.load(Ordering::SeqCst),
        "Slot exiting"
    );
}
