//! Photoset Mirror Library
//!
//! Keeps a local directory identical to a remote Flickr photoset: builds
//! the complete remote inventory page by page, reconciles it against the
//! directory, deletes what the set no longer holds and downloads what is
//! missing with bounded concurrency.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
