//! Photo download: open a byte stream on the remote locator and hand it to
//! the local store under the photo's identifier.

use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use tracing::{debug, info, warn};
use url::Url;

use crate::app::models::PhotoDescriptor;
use crate::app::storage::{ChunkStream, LocalStore};
use crate::errors::{render_chain, DownloadResult, TransferError};

/// Source of resource bodies
#[async_trait]
pub trait ResourceSource: Send + Sync {
    /// Start streaming the body at `locator`
    ///
    /// Fails before any byte is yielded if the request cannot be made or
    /// the server refuses it; later transport failures surface as stream
    /// items.
    async fn open(&self, locator: &Url) -> Result<ChunkStream, TransferError>;
}

/// End `body` with `TransferError::Stalled` if no chunk arrives within `idle`
///
/// A body that keeps delivering is never cut off, however long it runs.
pub fn with_idle_timeout(body: ChunkStream, url: String, idle: Duration) -> ChunkStream {
    stream::unfold(Some(body), move |state| {
        let url = url.clone();
        async move {
            let mut body = state?;
            match tokio::time::timeout(idle, body.next()).await {
                Ok(Some(chunk)) => Some((chunk, Some(body))),
                Ok(None) => None,
                Err(_) => Some((Err(TransferError::Stalled { url, idle }), None)),
            }
        }
    })
    .boxed()
}

/// Download one photo into the store
///
/// Returns the number of bytes written. On failure nothing is left under
/// the photo's identifier.
///
/// # Errors
///
/// - `DownloadError::Transfer` on any transport failure
/// - `DownloadError::Storage` if the file cannot be created, written or
///   committed
pub async fn fetch_and_store<R, S>(
    source: &R,
    store: &S,
    descriptor: &PhotoDescriptor,
) -> DownloadResult<u64>
where
    R: ResourceSource + ?Sized,
    S: LocalStore + ?Sized,
{
    let identifier = descriptor.identifier();
    debug!("Fetching {} from {}", identifier, descriptor.source());

    let result: DownloadResult<u64> = async {
        let body = source.open(descriptor.source()).await?;
        store.store(identifier, body).await
    }
    .await;

    match result {
        Ok(written) => {
            info!("Fetched {} ({} bytes)", identifier, written);
            Ok(written)
        }
        Err(e) => {
            warn!("Failed to fetch {}: {}", identifier, render_chain(&e));
            Err(e)
        }
    }
}
