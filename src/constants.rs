//! Application constants for Photoset Mirror
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Environment variable overriding the configured Flickr API key
    pub const API_KEY: &str = "FLICKR_API_KEY";
}

/// Flickr REST API constants
pub mod flickr {
    /// REST endpoint for all API methods
    pub const REST_ENDPOINT: &str = "https://api.flickr.com/services/rest/";

    /// Method listing the photos of one photoset
    pub const PHOTOSET_METHOD: &str = "flickr.photosets.getPhotos";

    /// Extra attribute carrying the original-size image URL
    pub const ORIGINAL_URL_EXTRA: &str = "url_o";

    /// Photos requested per listing page
    pub const DEFAULT_PER_PAGE: u32 = 100;

    /// Largest page size the API accepts
    pub const MAX_PER_PAGE: u32 = 500;

    /// Status value of a successful API response
    pub const STAT_OK: &str = "ok";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("photoset-mirror/", env!("CARGO_PKG_VERSION"));

    /// Deadline for one listing request, body included
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Longest wait for the next response or body chunk of a download
    pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections kept per host
    pub const POOL_MAX_PER_HOST: usize = 16;
}

/// Synchronization defaults
pub mod sync {
    /// Default number of downloads in flight at once
    pub const DEFAULT_CONCURRENT_TASKS: usize = 10;

    /// Upper bound on listing pages fetched for one inventory
    pub const DEFAULT_MAX_PAGES: u32 = 10_000;

    /// Channel buffer size for sync progress events
    pub const EVENT_BUFFER_SIZE: usize = 256;
}

/// File operation constants
pub mod files {
    /// Subdirectory of the destination holding uncommitted downloads
    pub const PARTIAL_DIR_NAME: &str = ".photoset-mirror-partial";

    /// Permissions of stored files (Unix only) - owner read/write only
    #[cfg(unix)]
    pub const STORED_FILE_PERMISSIONS: u32 = 0o600;

    /// Config directory name under the user's config dir
    pub const CONFIG_DIR_NAME: &str = "photoset-mirror";

    /// Project-local TOML config file
    pub const LOCAL_CONFIG_FILE: &str = "photoset-mirror.toml";
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";

    /// Crate name used as the tracing target directive
    pub const CRATE_TARGET: &str = "photoset_mirror";
}

// Re-export commonly used constants for convenience
pub use env::API_KEY as ENV_API_KEY;
pub use files::PARTIAL_DIR_NAME;
pub use http::USER_AGENT;
pub use sync::DEFAULT_CONCURRENT_TASKS;
