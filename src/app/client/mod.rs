//! HTTP client for the Flickr photoset API and photo downloads
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and photoset selection
//! - `listing`: decoding of photoset listing pages
//! - `download`: streaming a photo into the local store

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::app::inventory::PageFetcher;
use crate::app::models::Page;
use crate::app::storage::ChunkStream;
use crate::constants::flickr;
use crate::errors::{ConfigResult, PageFetchError, TransferError};

pub mod config;
pub mod download;
pub mod listing;

pub use config::{ClientConfig, FlickrConfig};
pub use download::{fetch_and_store, with_idle_timeout, ResourceSource};

/// Client for one Flickr photoset
///
/// Lists the set page by page and streams photo bodies. One instance is
/// shared by the listing loop and every download task.
///
/// Listing requests carry a total deadline. Downloads only fail when the
/// server goes quiet for longer than the idle timeout.
#[derive(Debug, Clone)]
pub struct FlickrClient {
    http: Client,
    flickr: FlickrConfig,
    request_timeout: Duration,
    idle_timeout: Duration,
}

impl FlickrClient {
    /// Creates a client for the configured photoset
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::HttpClient` if the HTTP client cannot be built
    pub fn new(flickr: FlickrConfig, client: &ClientConfig) -> ConfigResult<Self> {
        let http = client.build_http_client()?;
        debug!(
            "Created Flickr client for photoset {} at {}",
            flickr.photoset_id, flickr.endpoint
        );
        Ok(Self {
            http,
            flickr,
            request_timeout: client.request_timeout,
            idle_timeout: client.idle_timeout,
        })
    }

    /// Photoset this client lists
    pub fn photoset_id(&self) -> &str {
        &self.flickr.photoset_id
    }

    /// URL of one listing page
    pub fn page_url(&self, page: u32) -> Url {
        let mut url = self.flickr.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("method", flickr::PHOTOSET_METHOD)
            .append_pair("api_key", &self.flickr.api_key)
            .append_pair("photoset_id", &self.flickr.photoset_id)
            .append_pair("extras", flickr::ORIGINAL_URL_EXTRA)
            .append_pair("per_page", &self.flickr.per_page.to_string())
            .append_pair("page", &page.to_string())
            .append_pair("format", "json")
            .append_pair("nojsoncallback", "1");
        url
    }
}

#[async_trait]
impl PageFetcher for FlickrClient {
    async fn fetch_page(&self, page: u32) -> Result<Page, PageFetchError> {
        debug!("Requesting photoset {} page {}", self.flickr.photoset_id, page);

        let response = self
            .http
            .get(self.page_url(page))
            .timeout(self.request_timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PageFetchError::ServerError {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        listing::parse_page(&body)
    }
}

#[async_trait]
impl ResourceSource for FlickrClient {
    async fn open(&self, locator: &Url) -> Result<ChunkStream, TransferError> {
        let url = locator.to_string();
        let idle = self.idle_timeout;
        let response = tokio::time::timeout(idle, self.http.get(locator.clone()).send())
            .await
            .map_err(|_| TransferError::Stalled {
                url: url.clone(),
                idle,
            })?
            .map_err(|source| TransferError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::ServerError {
                url,
                status: status.as_u16(),
            });
        }

        let stream_url = url.clone();
        let body = response
            .bytes_stream()
            .map(move |chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|source| TransferError::Http {
                        url: stream_url.clone(),
                        source,
                    })
            })
            .boxed();
        Ok(with_idle_timeout(body, url, idle))
    }
}
