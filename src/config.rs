//! Configuration management for Photoset Mirror
//!
//! Settings come from, in increasing precedence: built-in defaults, a
//! config file, the `FLICKR_API_KEY` environment variable, and command-line
//! flags (applied by the CLI). Config files are TOML, except that a file
//! with a `.json` extension is read in the flat `config.json` layout
//! (`apiKey`, `set`, `location`, `concurrentTasks`). JSON files are only
//! read when named with `--config`; the automatic search looks for TOML
//! files alone.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::app::{ClientConfig, FailurePolicy, FlickrConfig, SyncConfig};
use crate::constants::{env, files, flickr, logging, sync};
use crate::errors::{ConfigError, ConfigResult};

/// Log levels accepted in `[logging] level`
const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Photoset selection and API access
    pub flickr: FlickrSection,
    /// Destination and download behaviour
    pub sync: SyncSection,
    /// HTTP client settings
    pub client: ClientConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// File this configuration was read from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// `[flickr]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlickrSection {
    /// API key (overridden by `FLICKR_API_KEY`)
    pub api_key: String,
    /// Photoset identifier
    pub set: String,
    /// REST endpoint
    pub endpoint: String,
    /// Photos requested per listing page
    pub per_page: u32,
}

impl Default for FlickrSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            set: String::new(),
            endpoint: flickr::REST_ENDPOINT.to_string(),
            per_page: flickr::DEFAULT_PER_PAGE,
        }
    }
}

/// `[sync]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    /// Destination directory
    pub location: PathBuf,
    /// Downloads in flight at once
    pub concurrent_tasks: usize,
    /// What to do when a download fails
    pub failure_policy: FailurePolicy,
    /// Upper bound on listing pages
    pub max_pages: u32,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            location: PathBuf::new(),
            concurrent_tasks: sync::DEFAULT_CONCURRENT_TASKS,
            failure_policy: FailurePolicy::default(),
            max_pages: sync::DEFAULT_MAX_PAGES,
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Flat JSON layout: `{"apiKey", "set", "location", "concurrentTasks"}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct JsonConfig {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    set: String,
    #[serde(default)]
    location: PathBuf,
    concurrent_tasks: Option<usize>,
}

impl From<JsonConfig> for AppConfig {
    fn from(json: JsonConfig) -> Self {
        let mut config = AppConfig::default();
        config.flickr.api_key = json.api_key;
        config.flickr.set = json.set;
        config.sync.location = json.location;
        if let Some(concurrent_tasks) = json.concurrent_tasks {
            config.sync.concurrent_tasks = concurrent_tasks;
        }
        config
    }
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (explicit, or the first one found)
    /// 3. `FLICKR_API_KEY`
    ///
    /// CLI flags are applied by the caller afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if an explicit file does not exist,
    /// or a parse error if the file is malformed
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(api_key) = std::env::var(env::API_KEY) {
            if !api_key.is_empty() {
                debug!("Using API key from {}", env::API_KEY);
                self.flickr.api_key = api_key;
            }
        }
    }

    /// Check that the configuration is complete and usable
    ///
    /// # Errors
    ///
    /// Returns the first missing or invalid field found
    pub fn validate(&self) -> ConfigResult<()> {
        if self.flickr.api_key.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "flickr.api_key".to_string(),
            });
        }
        if self.flickr.set.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "flickr.set".to_string(),
            });
        }
        if !(1..=flickr::MAX_PER_PAGE).contains(&self.flickr.per_page) {
            return Err(ConfigError::InvalidValue {
                field: "flickr.per_page".to_string(),
                value: self.flickr.per_page.to_string(),
                reason: format!("Must be between 1 and {}", flickr::MAX_PER_PAGE),
            });
        }
        self.endpoint()?;

        if self.sync.location.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "sync.location".to_string(),
            });
        }
        if !self.sync.location.is_dir() {
            return Err(ConfigError::InvalidValue {
                field: "sync.location".to_string(),
                value: self.sync.location.display().to_string(),
                reason: "Must be an existing directory".to_string(),
            });
        }
        if self.sync.concurrent_tasks == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sync.concurrent_tasks".to_string(),
                value: "0".to_string(),
                reason: "At least one download must be allowed".to_string(),
            });
        }
        if self.sync.max_pages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sync.max_pages".to_string(),
                value: "0".to_string(),
                reason: "Must be positive".to_string(),
            });
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: self.logging.level.clone(),
                reason: format!("Expected one of {}", LOG_LEVELS.join(", ")),
            });
        }
        Ok(())
    }

    /// Photoset settings for the client
    pub fn flickr_config(&self) -> ConfigResult<FlickrConfig> {
        Ok(
            FlickrConfig::new(self.flickr.api_key.clone(), self.flickr.set.clone())?
                .with_endpoint(self.endpoint()?)
                .with_per_page(self.flickr.per_page),
        )
    }

    /// Settings for one sync run
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::new(self.sync.location.clone())
            .with_concurrent_tasks(self.sync.concurrent_tasks)
            .with_failure_policy(self.sync.failure_policy)
            .with_max_pages(self.sync.max_pages)
    }

    fn endpoint(&self) -> ConfigResult<Url> {
        Url::parse(&self.flickr.endpoint).map_err(|e| ConfigError::InvalidValue {
            field: "flickr.endpoint".to_string(),
            value: self.flickr.endpoint.clone(),
            reason: e.to_string(),
        })
    }

    /// Render as TOML with the API key masked
    pub fn render(&self) -> ConfigResult<String> {
        let mut shown = self.clone();
        if !shown.flickr.api_key.is_empty() {
            shown.flickr.api_key = "********".to_string();
        }
        Ok(toml::to_string_pretty(&shown)?)
    }

    /// Write a commented default config file
    ///
    /// Writes to `path`, or to the per-user config location when `None`.
    /// An existing file is only replaced when `force` is set.
    pub async fn initialize(path: Option<PathBuf>, force: bool) -> ConfigResult<PathBuf> {
        let config_path = match path {
            Some(path) => path,
            None => Self::default_config_path()?,
        };

        if config_path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                field: "path".to_string(),
                value: config_path.display().to_string(),
                reason: "File already exists (use --force to overwrite)".to_string(),
            });
        }

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| ConfigError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        tokio::fs::write(&config_path, Self::generate_default_config_content())
            .await
            .map_err(|source| ConfigError::Io {
                path: config_path.clone(),
                source,
            })?;

        info!("Wrote default configuration to {}", config_path.display());
        Ok(config_path)
    }

    /// Locations searched when no file is named, in order
    fn search_paths() -> Vec<PathBuf> {
        let mut search_paths = vec![PathBuf::from(files::LOCAL_CONFIG_FILE)];
        if let Ok(user_path) = Self::default_config_path() {
            search_paths.push(user_path);
        }
        search_paths
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|path| {
            let found = path.is_file();
            if found {
                debug!("Found config file: {}", path.display());
            }
            found
        })
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(files::CONFIG_DIR_NAME).join("config.toml"))
    }

    /// Load configuration from a TOML or JSON file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        let mut config: AppConfig = if is_json {
            serde_json::from_str::<JsonConfig>(&content)?.into()
        } else {
            toml::from_str(&content)?
        };
        config.source = Some(path.to_path_buf());

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# Photoset Mirror Configuration
# Mirrors one Flickr photoset into a local directory.

[flickr]
# API key (the FLICKR_API_KEY environment variable takes precedence)
api_key = ""

# Photoset identifier, as shown in the album URL
set = ""

endpoint = "{endpoint}"

# Photos per listing page (1-{max_per_page})
per_page = {per_page}

[sync]
# Destination directory; must already exist
location = ""

# Downloads in flight at once
concurrent_tasks = {concurrent_tasks}

# "fail-fast" stops at the first failed download, "continue" runs them all
failure_policy = "fail-fast"

# Safety bound on listing pages
max_pages = {max_pages}

[client]
# Durations use humantime syntax: "30s", "2m", "1h 30m"
# Deadline for one listing request
request_timeout = "2m"
# Downloads have no overall deadline, only a limit on how long they may stall
idle_timeout = "1m"
connect_timeout = "30s"
tcp_keepalive = "30s"
tcp_nodelay = true
pool_idle_timeout = "90s"
pool_max_per_host = 16

[logging]
level = "{level}"  # error, warn, info, debug, trace
"#,
            endpoint = flickr::REST_ENDPOINT,
            max_per_page = flickr::MAX_PER_PAGE,
            per_page = flickr::DEFAULT_PER_PAGE,
            concurrent_tasks = sync::DEFAULT_CONCURRENT_TASKS,
            max_pages = sync::DEFAULT_MAX_PAGES,
            level = logging::DEFAULT_LOG_LEVEL,
        )
    }
}
