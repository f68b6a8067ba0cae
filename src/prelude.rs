//! Prelude module for Photoset Mirror
//!
//! Re-exports the items needed for a typical embedding with a single
//! `use photoset_mirror::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use photoset_mirror::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let flickr = FlickrConfig::new("api-key", "72157600000000000")?;
//!     let client = Arc::new(FlickrClient::new(flickr, &ClientConfig::default())?);
//!     let store = Arc::new(DirectoryStore::open("./photos").await?);
//!
//!     let report = SyncCoordinator::new(SyncConfig::new("./photos"), client, store)
//!         .run()
//!         .await?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Sync engine
pub use crate::app::{
    // Building blocks
    build_inventory,
    identifier_of,
    plan,
    run_all,
    task,

    ClientConfig,
    DirectoryStore,
    FailurePolicy,
    FlickrClient,
    FlickrConfig,
    Identifier,
    Inventory,
    LocalStore,
    PageFetcher,
    PhotoDescriptor,
    ResourceSource,
    RunnerConfig,
    SyncConfig,
    SyncCoordinator,
    SyncEvent,
    SyncPlan,
    SyncReport,
};

// Configuration file support
pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{DEFAULT_CONCURRENT_TASKS, ENV_API_KEY, USER_AGENT};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;
