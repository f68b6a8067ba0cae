//! Core sync engine
//!
//! This module contains the parts of a photoset sync: the Flickr client,
//! inventory accumulation, reconciliation, the bounded task runner, the
//! destination store, and the coordinator that sequences them.
//!
//! # Examples
//!
//! ```rust,no_run
//! use photoset_mirror::app::{build_inventory, plan, ClientConfig, FlickrClient, FlickrConfig};
//! use photoset_mirror::app::{DirectoryStore, LocalStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let flickr = FlickrConfig::new("api-key", "72157600000000000")?;
//! let client = FlickrClient::new(flickr, &ClientConfig::default())?;
//!
//! let inventory = build_inventory(&client).await?;
//! let local = DirectoryStore::open("./photos").await?.snapshot().await?;
//!
//! let plan = plan(&inventory, &local);
//! for identifier in &plan.to_delete {
//!     println!("stale: {}", identifier);
//! }
//! for descriptor in &plan.to_fetch {
//!     println!("missing: {}", descriptor.identifier());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod coordinator;
pub mod inventory;
pub mod models;
pub mod reconcile;
pub mod runner;
pub mod storage;

// Re-export main public API
pub use client::{fetch_and_store, ClientConfig, FlickrClient, FlickrConfig, ResourceSource};
pub use coordinator::{SyncConfig, SyncCoordinator, SyncEvent, SyncReport};
pub use inventory::{build_inventory, build_inventory_bounded, Inventory, PageFetcher};
pub use models::{identifier_of, Identifier, Page, PhotoDescriptor};
pub use reconcile::{plan, LocalState, SyncPlan};
pub use runner::{run_all, task, FailurePolicy, RunError, RunSummary, RunnerConfig, Task};
pub use storage::{ChunkStream, DirectoryStore, LocalStore};
