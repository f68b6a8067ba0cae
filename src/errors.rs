//! Error types for Photoset Mirror
//!
//! Each stage of a sync run has its own error enum so callers can tell a
//! listing failure (which must stop the run before anything is deleted)
//! apart from a per-photo transfer or storage failure.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::app::runner::RunError;

/// A resource locator with no usable trailing path segment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed locator: {locator} has no trailing path segment")]
pub struct MalformedLocator {
    pub locator: String,
}

/// Two remote photos resolving to the same local file name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Identifier {identifier} is listed more than once")]
pub struct DuplicateIdentifier {
    pub identifier: String,
}

/// Failure to retrieve or decode one listing page
#[derive(Error, Debug)]
pub enum PageFetchError {
    /// Transport-level failure
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// Endpoint returned a non-success status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// API answered with `stat != "ok"`
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    /// Response body was not the expected JSON shape
    #[error("Invalid listing response")]
    Decode(#[from] serde_json::Error),

    /// Photo listed without an original-size URL
    #[error("Photo {photo_id} has no original-size URL")]
    MissingSource { photo_id: String },

    /// Photo listed with an unparseable URL
    #[error("Photo {photo_id} has an invalid URL {url}: {error}")]
    InvalidSource {
        photo_id: String,
        url: String,
        error: String,
    },

    /// Photo URL has no usable file name
    #[error(transparent)]
    MalformedLocator(#[from] MalformedLocator),
}

/// Failure to assemble a complete remote inventory
#[derive(Error, Debug)]
pub enum InventoryError {
    /// A page request failed
    #[error("Failed to fetch listing page {page}")]
    PageFetch {
        page: u32,
        #[source]
        source: PageFetchError,
    },

    /// Pages do not add up to the reported total
    #[error("Inventory inconsistency at page {page}: {reason}")]
    Inconsistency { page: u32, reason: String },
}

impl InventoryError {
    pub(crate) fn inconsistency(page: u32, reason: impl Into<String>) -> Self {
        Self::Inconsistency {
            page,
            reason: reason.into(),
        }
    }
}

/// Failure while pulling bytes from a remote locator
#[derive(Error, Debug)]
pub enum TransferError {
    /// Transport-level failure, including a broken body stream
    #[error("HTTP transfer failed for {url}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server returned a non-success status
    #[error("Server returned HTTP {status} for {url}")]
    ServerError { url: String, status: u16 },

    /// No response or body bytes arrived within the idle timeout
    #[error("Transfer of {url} stalled for {idle:?}")]
    Stalled { url: String, idle: Duration },
}

/// Failure to read or modify the destination directory
#[derive(Error, Debug)]
pub enum StorageError {
    /// Destination does not exist or is not a directory
    #[error("Destination is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Directory listing failed
    #[error("Failed to list directory {path}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File could not be created
    #[error("Failed to create {path}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File could not be written
    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Completed download could not be moved to its final name
    #[error("Failed to commit {temp_path} to {final_path}")]
    Commit {
        temp_path: PathBuf,
        final_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stale file could not be removed
    #[error("Failed to delete {path}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of one fetch-and-store task
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read or written
    #[error("Failed to access configuration file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid TOML configuration
    #[error("Invalid configuration format")]
    InvalidToml(#[from] toml::de::Error),

    /// Invalid JSON configuration
    #[error("Invalid JSON configuration")]
    InvalidJson(#[from] serde_json::Error),

    /// Configuration could not be rendered
    #[error("Failed to render configuration")]
    Render(#[from] toml::ser::Error),

    /// Missing required configuration field
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// HTTP client could not be built from the settings
    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    /// No per-user config directory on this platform
    #[error("Could not determine user config directory")]
    NoConfigDir,
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Remote inventory error
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Per-photo download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Destination directory error outside a download
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Whether re-running the whole sync could plausibly succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Inventory(InventoryError::PageFetch { source, .. }) => matches!(
                source,
                PageFetchError::Http(_) | PageFetchError::ServerError { .. }
            ),
            AppError::Download(DownloadError::Transfer(_)) => true,

            AppError::Inventory(InventoryError::Inconsistency { .. })
            | AppError::Download(DownloadError::Storage(_))
            | AppError::Config(_) => false,

            _ => false,
        }
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Inventory(InventoryError::PageFetch { .. }) => "page-fetch",
            AppError::Inventory(InventoryError::Inconsistency { .. }) => "inventory-inconsistency",
            AppError::Download(DownloadError::Transfer(_)) => "transfer",
            AppError::Download(DownloadError::Storage(_)) | AppError::Storage(_) => "storage",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Render `err` followed by each underlying cause on its own line
///
/// Transparent wrappers add no line of their own.
pub fn render_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut cause = err.source();
    while let Some(source) = cause {
        rendered.push_str("\n  caused by: ");
        rendered.push_str(&source.to_string());
        cause = source.source();
    }
    rendered
}

impl From<RunError<DownloadError>> for AppError {
    fn from(err: RunError<DownloadError>) -> Self {
        match err {
            RunError::Task { source, .. } => AppError::Download(source),
            RunError::Panicked { index } => {
                AppError::generic(format!("download task {} panicked", index))
            }
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Inventory result type alias
pub type InventoryResult<T> = std::result::Result<T, InventoryError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Storage result type alias
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Config result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
