//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the HTTP
//! client shared by listing requests and photo downloads, and the
//! settings that identify which photoset to list.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{flickr, http};
use crate::errors::{ConfigError, ConfigResult};

/// Configuration for HTTP client optimizations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// TCP keep-alive settings
    #[serde(with = "humantime_serde")]
    pub tcp_keepalive: Option<Duration>,
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Option<Duration>,
    /// Maximum number of idle connections per host
    pub pool_max_per_host: usize,
    /// Deadline for one listing request
    ///
    /// Downloads have no overall deadline; a large original on a slow link
    /// may legitimately take longer than any fixed bound.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Longest a download may wait for its response or its next body chunk
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tcp_keepalive: Some(Duration::from_secs(30)),
            tcp_nodelay: true,
            pool_idle_timeout: Some(http::POOL_IDLE_TIMEOUT),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout: http::DEFAULT_TIMEOUT,
            idle_timeout: http::IDLE_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Builds the HTTP client with the specified configuration
    ///
    /// The client carries no overall timeout because it also streams photo
    /// bodies; listing requests set `request_timeout` per request.
    pub fn build_http_client(&self) -> ConfigResult<Client> {
        let mut client_builder = Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(http::USER_AGENT)
            .tcp_nodelay(self.tcp_nodelay)
            .pool_max_idle_per_host(self.pool_max_per_host);

        if let Some(keepalive) = self.tcp_keepalive {
            client_builder = client_builder.tcp_keepalive(keepalive);
        }

        if let Some(idle_timeout) = self.pool_idle_timeout {
            client_builder = client_builder.pool_idle_timeout(idle_timeout);
        }

        client_builder.build().map_err(ConfigError::HttpClient)
    }
}

/// Which photoset to list, and how
#[derive(Debug, Clone)]
pub struct FlickrConfig {
    /// Flickr API key
    pub api_key: String,
    /// Photoset identifier
    pub photoset_id: String,
    /// REST endpoint
    pub endpoint: Url,
    /// Photos per listing page
    pub per_page: u32,
}

impl FlickrConfig {
    /// Settings for the public REST endpoint with the default page size
    pub fn new(api_key: impl Into<String>, photoset_id: impl Into<String>) -> ConfigResult<Self> {
        let endpoint =
            Url::parse(flickr::REST_ENDPOINT).map_err(|e| ConfigError::InvalidValue {
                field: "flickr.endpoint".to_string(),
                value: flickr::REST_ENDPOINT.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            api_key: api_key.into(),
            photoset_id: photoset_id.into(),
            endpoint,
            per_page: flickr::DEFAULT_PER_PAGE,
        })
    }

    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }
}
