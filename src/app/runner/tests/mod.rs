//! Unit tests for the bounded task runner
//!
//! Tasks here record when they start and finish so the tests can observe
//! the scheduling guarantees directly: the in-flight bound, FIFO claim
//! order, and what happens around the first failure.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;

use super::*;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("boom {0}")]
struct Boom(usize);

/// Observations shared between a test and its tasks
#[derive(Default)]
struct Tracker {
    running: AtomicUsize,
    max_running: AtomicUsize,
    started: Mutex<Vec<usize>>,
    finished: Mutex<Vec<usize>>,
}

impl Tracker {
    fn started(&self) -> Vec<usize> {
        self.started.lock().unwrap().clone()
    }

    fn finished(&self) -> Vec<usize> {
        self.finished.lock().unwrap().clone()
    }
}

/// Task that sleeps for `millis` then returns `outcome`
fn tracked_task(
    tracker: &Arc<Tracker>,
    index: usize,
    millis: u64,
    outcome: Result<(), Boom>,
) -> Task<Boom> {
    let tracker = Arc::clone(tracker);
    task(move || async move {
        tracker.started.lock().unwrap().push(index);
        let now = tracker.running.fetch_add(1, Ordering::SeqCst) + 1;
        tracker.max_running.fetch_max(now, Ordering::SeqCst);

        sleep(Duration::from_millis(millis)).await;

        tracker.running.fetch_sub(1, Ordering::SeqCst);
        tracker.finished.lock().unwrap().push(index);
        outcome
    })
}

#[tokio::test]
async fn test_empty_task_list_completes_immediately() {
    let summary = run_all::<Boom>(Vec::new(), &RunnerConfig::with_concurrency(4))
        .await
        .unwrap();

    assert_eq!(summary.total, 0);
    assert!(summary.is_success());
}

#[tokio::test]
async fn test_never_exceeds_concurrency_bound() {
    let tracker = Arc::new(Tracker::default());
    // Uneven durations so completion order differs from start order
    let tasks: Vec<Task<Boom>> = (0..10)
        .map(|i| tracked_task(&tracker, i, 5 + (i as u64 * 7) % 20, Ok(())))
        .collect();

    let summary = run_all(tasks, &RunnerConfig::with_concurrency(3))
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 10);
    assert!(summary.is_success());
    assert_eq!(tracker.max_running.load(Ordering::SeqCst), 3);
    assert_eq!(tracker.running.load(Ordering::SeqCst), 0);
    assert_eq!(tracker.started(), (0..10).collect::<Vec<_>>());

    let mut finished = tracker.finished();
    finished.sort_unstable();
    assert_eq!(finished, (0..10).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bound_holds_on_multi_thread_runtime() {
    let tracker = Arc::new(Tracker::default());
    let tasks: Vec<Task<Boom>> = (0..40).map(|i| tracked_task(&tracker, i, 3, Ok(()))).collect();

    let summary = run_all(tasks, &RunnerConfig::with_concurrency(5))
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 40);
    assert!(tracker.max_running.load(Ordering::SeqCst) <= 5);
    assert_eq!(tracker.finished().len(), 40);
}

#[tokio::test]
async fn test_bound_larger_than_task_count_runs_all_at_once() {
    let tracker = Arc::new(Tracker::default());
    let tasks: Vec<Task<Boom>> = (0..4).map(|i| tracked_task(&tracker, i, 20, Ok(()))).collect();

    let summary = run_all(tasks, &RunnerConfig::with_concurrency(16))
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 4);
    assert_eq!(tracker.max_running.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_single_slot_is_sequential() {
    let tracker = Arc::new(Tracker::default());
    let tasks: Vec<Task<Boom>> = (0..5).map(|i| tracked_task(&tracker, i, 2, Ok(()))).collect();

    run_all(tasks, &RunnerConfig::with_concurrency(1))
        .await
        .unwrap();

    assert_eq!(tracker.max_running.load(Ordering::SeqCst), 1);
    assert_eq!(tracker.finished(), vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_fail_fast_stops_claiming_new_tasks() {
    let tracker = Arc::new(Tracker::default());
    // Slots start #0 and #1; when they finish, #2 and #3 start. #2 fails
    // while #3 is still running, so #4 must never start.
    let tasks: Vec<Task<Boom>> = vec![
        tracked_task(&tracker, 0, 30, Ok(())),
        tracked_task(&tracker, 1, 30, Ok(())),
        tracked_task(&tracker, 2, 10, Err(Boom(2))),
        tracked_task(&tracker, 3, 60, Ok(())),
        tracked_task(&tracker, 4, 10, Ok(())),
    ];

    let err = run_all(tasks, &RunnerConfig::with_concurrency(2))
        .await
        .unwrap_err();

    assert_eq!(err.index(), 2);
    assert_eq!(err.into_source(), Some(Boom(2)));
    // The run returns before the in-flight task finishes
    assert!(!tracker.finished().contains(&3));

    // The in-flight task is not interrupted and nothing new is started
    sleep(Duration::from_millis(150)).await;
    assert_eq!(tracker.started(), vec![0, 1, 2, 3]);
    assert!(tracker.finished().contains(&3));
}

#[tokio::test]
async fn test_fail_fast_returns_first_failure() {
    let tracker = Arc::new(Tracker::default());
    let tasks: Vec<Task<Boom>> = vec![
        tracked_task(&tracker, 0, 40, Err(Boom(0))),
        tracked_task(&tracker, 1, 5, Err(Boom(1))),
        tracked_task(&tracker, 2, 5, Ok(())),
    ];

    let err = run_all(tasks, &RunnerConfig::with_concurrency(2))
        .await
        .unwrap_err();

    // #1 fails first even though #0 was submitted first
    assert_eq!(err.index(), 1);
    sleep(Duration::from_millis(80)).await;
    assert!(!tracker.started().contains(&2));
}

#[tokio::test]
async fn test_continue_policy_runs_everything() {
    let tracker = Arc::new(Tracker::default());
    let tasks: Vec<Task<Boom>> = (0..5)
        .map(|i| {
            let outcome = if i == 2 { Err(Boom(i)) } else { Ok(()) };
            tracked_task(&tracker, i, 5, outcome)
        })
        .collect();
    let config = RunnerConfig::with_concurrency(2).with_failure_policy(FailurePolicy::Continue);

    let summary = run_all(tasks, &config).await.unwrap();

    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].index(), 2);
    assert!(!summary.is_success());
    assert_eq!(summary.completed(), 5);
    assert_eq!(tracker.started().len(), 5);
}

async fn explode() -> Result<(), Boom> {
    panic!("task exploded")
}

#[tokio::test]
async fn test_panicking_task_is_reported() {
    let tasks: Vec<Task<Boom>> = vec![
        task(|| async { Ok(()) }),
        task(explode),
    ];
    let config = RunnerConfig::with_concurrency(1).with_failure_policy(FailurePolicy::Continue);

    let summary = run_all(tasks, &config).await.unwrap();

    assert_eq!(summary.succeeded, 1);
    assert!(matches!(summary.failures[0], RunError::Panicked { index: 1 }));
}
