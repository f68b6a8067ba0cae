//! Unit tests for the sync coordinator
//!
//! The remote side is an in-memory photoset; the destination is a real
//! [`DirectoryStore`] on a temporary directory. HTTP-level tests live in the
//! top-level tests directory.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use tempfile::TempDir;
use url::Url;

use crate::app::models::{Page, PhotoDescriptor};
use crate::app::runner::FailurePolicy;
use crate::app::reconcile::LocalState;
use crate::app::storage::{ChunkStream, DirectoryStore};
use crate::errors::{
    AppError, DownloadError, DownloadResult, InventoryError, PageFetchError, StorageError,
    StorageResult, TransferError,
};

use super::*;

/// In-memory photoset served two photos per page
struct MemoryRemote {
    photos: Vec<PhotoDescriptor>,
    failing: HashSet<String>,
    listing_fails: bool,
    opened: Mutex<Vec<String>>,
}

impl MemoryRemote {
    fn new(names: &[&str]) -> Self {
        let photos = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let url = Url::parse(&format!("https://photos.test/originals/{}", name)).unwrap();
                PhotoDescriptor::new(i.to_string(), *name, url).unwrap()
            })
            .collect();
        Self {
            photos,
            failing: HashSet::new(),
            listing_fails: false,
            opened: Mutex::new(Vec::new()),
        }
    }

    fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    fn with_broken_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MemoryRemote {
    async fn fetch_page(&self, page: u32) -> std::result::Result<Page, PageFetchError> {
        if self.listing_fails && page == 2 {
            return Err(PageFetchError::ServerError { status: 503 });
        }
        let start = (page as usize - 1) * 2;
        let descriptors = self.photos.iter().skip(start).take(2).cloned().collect();
        Ok(Page {
            descriptors,
            total: self.photos.len(),
        })
    }
}

#[async_trait]
impl ResourceSource for MemoryRemote {
    async fn open(&self, locator: &Url) -> std::result::Result<ChunkStream, TransferError> {
        let name = locator.path_segments().unwrap().last().unwrap().to_string();
        self.opened.lock().unwrap().push(name.clone());
        if self.failing.contains(&name) {
            return Err(TransferError::ServerError {
                url: locator.to_string(),
                status: 500,
            });
        }
        let body = format!("contents of {}", name).into_bytes();
        Ok(stream::iter(vec![Ok(body)]).boxed())
    }
}

/// A directory whose deletions fail once `fail_after` have succeeded
struct UndeletableStore {
    inner: DirectoryStore,
    fail_after: usize,
    deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl LocalStore for UndeletableStore {
    async fn snapshot(&self) -> StorageResult<LocalState> {
        self.inner.snapshot().await
    }

    async fn delete(&self, identifier: &Identifier) -> StorageResult<()> {
        {
            let mut deleted = self.deleted.lock().unwrap();
            if deleted.len() >= self.fail_after {
                return Err(StorageError::Delete {
                    path: self.inner.path_of(identifier),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                });
            }
            deleted.push(identifier.to_string());
        }
        self.inner.delete(identifier).await
    }

    async fn store(&self, identifier: &Identifier, body: ChunkStream) -> DownloadResult<u64> {
        self.inner.store(identifier, body).await
    }
}

fn seed(dir: &TempDir, names: &[&str]) {
    for name in names {
        std::fs::write(dir.path().join(name), b"old").unwrap();
    }
}

fn files_in(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().unwrap().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

async fn coordinator(
    dir: &TempDir,
    remote: MemoryRemote,
    config: SyncConfig,
) -> SyncCoordinator<MemoryRemote, DirectoryStore> {
    let store = DirectoryStore::open(dir.path()).await.unwrap();
    SyncCoordinator::new(config, Arc::new(remote), Arc::new(store))
}

#[tokio::test]
async fn test_sync_fetches_missing_and_deletes_stale() {
    let dir = TempDir::new().unwrap();
    seed(&dir, &["b.jpg", "z.jpg"]);
    let sync = coordinator(
        &dir,
        MemoryRemote::new(&["a.jpg", "b.jpg", "c.jpg"]),
        SyncConfig::new(dir.path()),
    )
    .await;

    let report = sync.run().await.unwrap();

    assert_eq!(files_in(&dir), vec!["a.jpg", "b.jpg", "c.jpg"]);
    assert_eq!(
        std::fs::read(dir.path().join("a.jpg")).unwrap(),
        b"contents of a.jpg"
    );
    // Already present, so never re-downloaded
    assert_eq!(std::fs::read(dir.path().join("b.jpg")).unwrap(), b"old");
    assert_eq!(report.inventory_total, 3);
    assert_eq!(report.kept, 1);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.fetched, 2);
    assert_eq!(
        report.bytes_written,
        ("contents of a.jpg".len() + "contents of c.jpg".len()) as u64
    );
    assert!(report.is_success());
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    seed(&dir, &["stale.jpg"]);
    let remote = MemoryRemote::new(&["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"]);
    let sync = coordinator(&dir, remote, SyncConfig::new(dir.path())).await;

    sync.run().await.unwrap();
    let (_, plan) = sync.plan().await.unwrap();
    let second = sync.run().await.unwrap();

    assert!(plan.is_empty());
    assert_eq!(second.kept, 5);
    assert_eq!(second.deleted, 0);
    assert_eq!(second.fetched, 0);
    assert_eq!(sync.remote.opened().len(), 5);
}

#[tokio::test]
async fn test_listing_failure_leaves_destination_untouched() {
    let dir = TempDir::new().unwrap();
    seed(&dir, &["z.jpg"]);
    let remote = MemoryRemote::new(&["a.jpg", "b.jpg", "c.jpg"]).with_broken_listing();
    let sync = coordinator(&dir, remote, SyncConfig::new(dir.path())).await;

    let err = sync.run().await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Inventory(InventoryError::PageFetch { page: 2, .. })
    ));
    assert_eq!(files_in(&dir), vec!["z.jpg"]);
    assert!(sync.remote.opened().is_empty());
}

#[tokio::test]
async fn test_dry_run_only_reports() {
    let dir = TempDir::new().unwrap();
    seed(&dir, &["b.jpg", "z.jpg"]);
    let sync = coordinator(
        &dir,
        MemoryRemote::new(&["a.jpg", "b.jpg", "c.jpg"]),
        SyncConfig::new(dir.path()).with_dry_run(true),
    )
    .await;

    let report = sync.run().await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.to_delete, 1);
    assert_eq!(report.to_fetch, 2);
    assert_eq!(report.deleted, 0);
    assert_eq!(report.fetched, 0);
    assert_eq!(files_in(&dir), vec!["b.jpg", "z.jpg"]);
    assert!(sync.remote.opened().is_empty());
}

#[tokio::test]
async fn test_fail_fast_stops_claiming_after_first_failure() {
    let dir = TempDir::new().unwrap();
    let remote = MemoryRemote::new(&["a.jpg", "b.jpg", "c.jpg"]).failing("b.jpg");
    let sync = coordinator(
        &dir,
        remote,
        SyncConfig::new(dir.path()).with_concurrent_tasks(1),
    )
    .await;

    let err = sync.run().await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Download(DownloadError::Transfer(TransferError::ServerError {
            status: 500,
            ..
        }))
    ));
    assert_eq!(files_in(&dir), vec!["a.jpg"]);
    assert_eq!(sync.remote.opened(), vec!["a.jpg", "b.jpg"]);
}

#[tokio::test]
async fn test_continue_policy_reports_failures() {
    let dir = TempDir::new().unwrap();
    let remote = MemoryRemote::new(&["a.jpg", "b.jpg", "c.jpg"]).failing("b.jpg");
    let sync = coordinator(
        &dir,
        remote,
        SyncConfig::new(dir.path())
            .with_concurrent_tasks(2)
            .with_failure_policy(FailurePolicy::Continue),
    )
    .await;

    let report = sync.run().await.unwrap();

    assert_eq!(files_in(&dir), vec!["a.jpg", "c.jpg"]);
    assert_eq!(report.fetched, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0.as_str(), "b.jpg");
    assert!(!report.is_success());
}

#[tokio::test]
async fn test_events_follow_the_run() {
    let dir = TempDir::new().unwrap();
    seed(&dir, &["z.jpg"]);
    let (tx, mut rx) = mpsc::channel(64);
    let sync = coordinator(
        &dir,
        MemoryRemote::new(&["a.jpg"]),
        SyncConfig::new(dir.path()),
    )
    .await
    .with_events(tx);

    sync.run().await.unwrap();
    drop(sync);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events[0], SyncEvent::InventoryBuilt { total: 1 });
    assert_eq!(
        events[1],
        SyncEvent::Planned {
            kept: 0,
            to_delete: 1,
            to_fetch: 1
        }
    );
    assert_eq!(
        events[2],
        SyncEvent::Deleting {
            identifiers: vec![Identifier::new("z.jpg")]
        }
    );
    assert!(matches!(events[3], SyncEvent::Deleted { ref identifier } if identifier.as_str() == "z.jpg"));
    assert!(matches!(events[4], SyncEvent::FetchStarted { .. }));
    assert!(matches!(events[5], SyncEvent::Fetched { bytes, .. } if bytes == "contents of a.jpg".len() as u64));
    assert_eq!(events.len(), 6);
}

#[tokio::test]
async fn test_failed_delete_stops_before_any_download() {
    let dir = TempDir::new().unwrap();
    seed(&dir, &["x.jpg", "y.jpg", "z.jpg"]);
    let store = UndeletableStore {
        inner: DirectoryStore::open(dir.path()).await.unwrap(),
        fail_after: 1,
        deleted: Mutex::new(Vec::new()),
    };
    let (tx, mut rx) = mpsc::channel(64);
    let sync = SyncCoordinator::new(
        SyncConfig::new(dir.path()),
        Arc::new(MemoryRemote::new(&["a.jpg"])),
        Arc::new(store),
    )
    .with_events(tx);

    let err = sync.run().await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Storage(StorageError::Delete { ref path, .. }) if path.ends_with("y.jpg")
    ));
    assert!(sync.remote.opened().is_empty());
    assert_eq!(files_in(&dir), vec!["y.jpg", "z.jpg"]);

    drop(sync);
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    // The whole delete set is announced before the first deletion
    assert_eq!(
        events[2],
        SyncEvent::Deleting {
            identifiers: vec![
                Identifier::new("x.jpg"),
                Identifier::new("y.jpg"),
                Identifier::new("z.jpg"),
            ]
        }
    );
    assert!(matches!(events[3], SyncEvent::Deleted { ref identifier } if identifier.as_str() == "x.jpg"));
    assert_eq!(events.len(), 4);
    assert!(!events
        .iter()
        .any(|event| matches!(event, SyncEvent::FetchStarted { .. })));
}
