//! Terminal progress display for sync runs
//!
//! Consumes [`SyncEvent`]s from the coordinator and drives a single
//! `indicatif` bar over the download phase. When stderr is not a terminal
//! no bar is drawn and the log lines are the only progress output.

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::app::SyncEvent;
use crate::errors::{AppError, Result};

/// Progress bar fed from a sync event channel
pub struct ProgressDisplay {
    bar: ProgressBar,
    task: JoinHandle<()>,
}

impl ProgressDisplay {
    /// Whether a bar can be drawn
    pub fn is_supported() -> bool {
        atty::is(atty::Stream::Stderr)
    }

    /// Start drawing progress from `events`
    ///
    /// # Errors
    ///
    /// Returns `AppError::Generic` if the bar template is rejected
    pub fn spawn(events: mpsc::Receiver<SyncEvent>) -> Result<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                )
                .map_err(|e| AppError::generic(format!("Progress bar template error: {}", e)))?
                .progress_chars("##-"),
        );
        bar.set_message("Listing photoset");

        let task = tokio::spawn(drive(bar.clone(), events));
        Ok(Self { bar, task })
    }

    /// Stop listening and clear the bar
    ///
    /// Downloads abandoned by a fail-fast run may still hold the sender, so
    /// the listener is stopped rather than drained.
    pub fn finish(self) {
        self.task.abort();
        self.bar.finish_and_clear();
    }
}

async fn drive(bar: ProgressBar, mut events: mpsc::Receiver<SyncEvent>) {
    while let Some(event) = events.recv().await {
        apply(&bar, &event);
    }
}

/// Reflect one event on the bar
fn apply(bar: &ProgressBar, event: &SyncEvent) {
    match event {
        SyncEvent::InventoryBuilt { total } => {
            bar.set_message(format!("{} photos in set", total));
        }
        SyncEvent::Planned { to_fetch, .. } => {
            bar.set_length(*to_fetch as u64);
            bar.set_position(0);
        }
        SyncEvent::Deleting { identifiers } => {
            bar.set_message(format!("deleting {} stale files", identifiers.len()));
        }
        SyncEvent::Deleted { identifier } => {
            bar.set_message(format!("deleted {}", identifier));
        }
        SyncEvent::FetchStarted { identifier } => {
            bar.set_message(identifier.to_string());
        }
        SyncEvent::Fetched { .. } => bar.inc(1),
        SyncEvent::FetchFailed { identifier, error } => {
            bar.inc(1);
            bar.println(format!("Failed to fetch {}: {}", identifier, error));
        }
    }
}
