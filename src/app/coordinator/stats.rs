//! Sync progress events and the end-of-run report

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::models::Identifier;

/// Progress notification emitted while a sync runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Remote inventory is complete
    InventoryBuilt { total: usize },
    /// Plan computed
    Planned {
        kept: usize,
        to_delete: usize,
        to_fetch: usize,
    },
    /// Full delete set, announced before the first deletion
    Deleting { identifiers: Vec<Identifier> },
    /// Stale file removed
    Deleted { identifier: Identifier },
    /// A download task started
    FetchStarted { identifier: Identifier },
    /// A download task committed its file
    Fetched { identifier: Identifier, bytes: u64 },
    /// A download task failed
    FetchFailed {
        identifier: Identifier,
        error: String,
    },
}

/// Outcome of one sync run
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Photos in the remote set
    pub inventory_total: usize,
    /// Photos already present locally
    pub kept: usize,
    /// Stale files planned for deletion
    pub to_delete: usize,
    /// Stale files actually deleted
    pub deleted: usize,
    /// Photos planned for download
    pub to_fetch: usize,
    /// Photos downloaded
    pub fetched: usize,
    /// Failed downloads with their error (continue policy only)
    pub failures: Vec<(Identifier, String)>,
    pub bytes_written: u64,
    pub dry_run: bool,
}

impl SyncReport {
    pub(crate) fn started() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            inventory_total: 0,
            kept: 0,
            to_delete: 0,
            deleted: 0,
            to_fetch: 0,
            fetched: 0,
            failures: Vec::new(),
            bytes_written: 0,
            dry_run: false,
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    /// Wall time of the run
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Whether the destination now matches the remote set
    pub fn is_success(&self) -> bool {
        self.dry_run
            || (self.failures.is_empty()
                && self.deleted == self.to_delete
                && self.fetched == self.to_fetch)
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            return write!(
                f,
                "{} photos in set: {} present, {} to delete, {} to fetch (dry run)",
                self.inventory_total, self.kept, self.to_delete, self.to_fetch
            );
        }
        write!(
            f,
            "{} photos in set: {} present, {} deleted, {}/{} fetched ({} bytes) in {:.1}s",
            self.inventory_total,
            self.kept,
            self.deleted,
            self.fetched,
            self.to_fetch,
            self.bytes_written,
            self.elapsed().num_milliseconds() as f64 / 1000.0
        )?;
        if !self.failures.is_empty() {
            write!(f, ", {} failed", self.failures.len())?;
        }
        Ok(())
    }
}
