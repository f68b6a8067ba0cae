//! Sync orchestration
//!
//! The coordinator runs one sync in a fixed sequence:
//!
//! 1. Build the complete remote inventory (any listing failure stops here,
//!    before the destination is touched)
//! 2. Snapshot the identifiers present in the destination
//! 3. Reconcile the two into a [`SyncPlan`]
//! 4. Report and delete stale files
//! 5. Report the fetch count and run the downloads on the bounded runner
//!
//! The snapshot is taken once. Files added or removed by someone else while
//! the run is in progress are not noticed; running again converges.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use photoset_mirror::app::{
//!     ClientConfig, DirectoryStore, FlickrClient, FlickrConfig, SyncConfig, SyncCoordinator,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let flickr = FlickrConfig::new("api-key", "72157600000000000")?;
//! let client = Arc::new(FlickrClient::new(flickr, &ClientConfig::default())?);
//! let store = Arc::new(DirectoryStore::open("./photos").await?);
//!
//! let config = SyncConfig::new("./photos").with_concurrent_tasks(4);
//! let report = SyncCoordinator::new(config, client, store).run().await?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod stats;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::app::client::{fetch_and_store, ResourceSource};
use crate::app::inventory::{build_inventory_bounded, Inventory, PageFetcher};
use crate::app::models::Identifier;
use crate::app::reconcile::{plan, SyncPlan};
use crate::app::runner::{run_all, task, Task};
use crate::app::storage::LocalStore;
use crate::errors::{DownloadError, Result};

pub use config::SyncConfig;
pub use stats::{SyncEvent, SyncReport};

/// Orchestrates one remote set and one destination
pub struct SyncCoordinator<R, S> {
    config: SyncConfig,
    remote: Arc<R>,
    store: Arc<S>,
    events: Option<mpsc::Sender<SyncEvent>>,
}

impl<R, S> SyncCoordinator<R, S>
where
    R: PageFetcher + ResourceSource + 'static,
    S: LocalStore + 'static,
{
    pub fn new(config: SyncConfig, remote: Arc<R>, store: Arc<S>) -> Self {
        Self {
            config,
            remote,
            store,
            events: None,
        }
    }

    /// Send progress events to `events`
    pub fn with_events(mut self, events: mpsc::Sender<SyncEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Build the inventory, snapshot the destination and reconcile
    ///
    /// Does not modify the destination.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Inventory` if the listing is unusable and
    /// `AppError::Storage` if the destination cannot be listed
    pub async fn plan(&self) -> Result<(Inventory, SyncPlan)> {
        let inventory = build_inventory_bounded(self.remote.as_ref(), self.config.max_pages).await?;
        emit(
            &self.events,
            SyncEvent::InventoryBuilt {
                total: inventory.len(),
            },
        )
        .await;

        let local = self.store.snapshot().await?;
        let plan = plan(&inventory, &local);
        info!(
            "Plan: {} present, {} to delete, {} to fetch",
            plan.kept,
            plan.to_delete.len(),
            plan.to_fetch.len()
        );
        emit(
            &self.events,
            SyncEvent::Planned {
                kept: plan.kept,
                to_delete: plan.to_delete.len(),
                to_fetch: plan.to_fetch.len(),
            },
        )
        .await;

        Ok((inventory, plan))
    }

    /// Run a complete sync
    ///
    /// # Errors
    ///
    /// Any listing or deletion failure, and under the fail-fast policy the
    /// first download failure. Under the continue policy download failures
    /// are listed in the report instead.
    pub async fn run(&self) -> Result<SyncReport> {
        let mut report = SyncReport::started();
        let (inventory, plan) = self.plan().await?;

        report.inventory_total = inventory.len();
        report.kept = plan.kept;
        report.to_delete = plan.to_delete.len();
        report.to_fetch = plan.to_fetch.len();

        if self.config.dry_run {
            report.dry_run = true;
            return Ok(report.finish());
        }

        report.deleted = self.delete_stale(&plan).await?;

        info!("Fetching {} photos", plan.to_fetch.len());
        let (fetched, failures, bytes_written) = self.fetch_missing(plan).await?;
        report.fetched = fetched;
        report.failures = failures;
        report.bytes_written = bytes_written;

        let report = report.finish();
        info!("{}", report);
        Ok(report)
    }

    /// Delete every identifier in the plan's delete set
    ///
    /// The full set is logged before the first deletion.
    async fn delete_stale(&self, plan: &SyncPlan) -> Result<usize> {
        if plan.to_delete.is_empty() {
            return Ok(0);
        }

        info!(
            "Deleting {} files no longer in the set",
            plan.to_delete.len()
        );
        for identifier in &plan.to_delete {
            info!("Deleting {}", identifier);
        }
        emit(
            &self.events,
            SyncEvent::Deleting {
                identifiers: plan.to_delete.iter().cloned().collect(),
            },
        )
        .await;

        for identifier in &plan.to_delete {
            self.store.delete(identifier).await?;
            emit(
                &self.events,
                SyncEvent::Deleted {
                    identifier: identifier.clone(),
                },
            )
            .await;
        }
        Ok(plan.to_delete.len())
    }

    /// Download the plan's fetch set on the bounded runner
    ///
    /// Returns (fetched, failures, bytes written).
    async fn fetch_missing(
        &self,
        plan: SyncPlan,
    ) -> Result<(usize, Vec<(Identifier, String)>, u64)> {
        let bytes_written = Arc::new(AtomicU64::new(0));
        let identifiers: Vec<_> = plan
            .to_fetch
            .iter()
            .map(|d| d.identifier().clone())
            .collect();

        let tasks: Vec<Task<DownloadError>> = plan
            .to_fetch
            .into_iter()
            .map(|descriptor| {
                let remote = Arc::clone(&self.remote);
                let store = Arc::clone(&self.store);
                let events = self.events.clone();
                let bytes_written = Arc::clone(&bytes_written);
                task(move || async move {
                    let identifier = descriptor.identifier().clone();
                    emit(
                        &events,
                        SyncEvent::FetchStarted {
                            identifier: identifier.clone(),
                        },
                    )
                    .await;

                    match fetch_and_store(remote.as_ref(), store.as_ref(), &descriptor).await {
                        Ok(bytes) => {
                            bytes_written.fetch_add(bytes, Ordering::Relaxed);
                            emit(&events, SyncEvent::Fetched { identifier, bytes }).await;
                            Ok(())
                        }
                        Err(e) => {
                            emit(
                                &events,
                                SyncEvent::FetchFailed {
                                    identifier,
                                    error: e.to_string(),
                                },
                            )
                            .await;
                            Err(e)
                        }
                    }
                })
            })
            .collect();

        let summary = run_all(tasks, &self.config.runner).await?;

        let failures = summary
            .failures
            .into_iter()
            .map(|failure| {
                let identifier = identifiers[failure.index()].clone();
                let message = failure.to_string();
                warn!("{} was not fetched: {}", identifier, message);
                (identifier, message)
            })
            .collect();

        Ok((
            summary.succeeded,
            failures,
            bytes_written.load(Ordering::Relaxed),
        ))
    }
}

/// Send an event if anyone is listening
async fn emit(events: &Option<mpsc::Sender<SyncEvent>>, event: SyncEvent) {
    if let Some(tx) = events {
        // A closed receiver only means nobody is watching progress
        let _ = tx.send(event).await;
    }
}
