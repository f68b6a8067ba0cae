//! Destination directory access
//!
//! The sync engine reads the destination once (a snapshot of the file names
//! present), deletes stale files, and writes new ones. [`LocalStore`] is the
//! seam; [`DirectoryStore`] is the filesystem implementation.
//!
//! Writes go to `<root>/.photoset-mirror-partial/<identifier>` and are
//! renamed into place only once the whole body has been written and
//! flushed, so a file present under its final name is always complete. A
//! failed write removes the partial file. Identifiers never contain a path
//! separator, so partial paths cannot collide with each other or with a
//! stored file, and the snapshot skips the partial directory like any other
//! subdirectory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::app::models::Identifier;
use crate::app::reconcile::LocalState;
use crate::constants::files;
use crate::errors::{DownloadError, DownloadResult, StorageError, StorageResult, TransferError};

/// Body of a remote resource, chunk by chunk
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>, TransferError>>;

/// Local side of a sync: list, delete, store
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Identifiers currently present
    async fn snapshot(&self) -> StorageResult<LocalState>;

    /// Remove one stored file
    async fn delete(&self, identifier: &Identifier) -> StorageResult<()>;

    /// Write `body` under `identifier`, returning the bytes written
    ///
    /// Nothing is visible under `identifier` unless the whole body was
    /// written.
    async fn store(&self, identifier: &Identifier, body: ChunkStream) -> DownloadResult<u64>;
}

/// A destination directory on the local filesystem
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open an existing directory
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotADirectory` if `root` is missing or is not
    /// a directory
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        match fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => Ok(Self { root }),
            _ => Err(StorageError::NotADirectory { path: root }),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final path of a stored identifier
    pub fn path_of(&self, identifier: &Identifier) -> PathBuf {
        self.root.join(identifier)
    }

    /// Directory holding downloads in progress
    pub fn partial_dir(&self) -> PathBuf {
        self.root.join(files::PARTIAL_DIR_NAME)
    }

    /// Path used while a download is in progress
    fn partial_path_of(&self, identifier: &Identifier) -> PathBuf {
        self.partial_dir().join(identifier)
    }

    async fn create_partial(&self, path: &Path) -> StorageResult<fs::File> {
        let partial_dir = self.partial_dir();
        fs::create_dir_all(&partial_dir)
            .await
            .map_err(|source| StorageError::Create {
                path: partial_dir,
                source,
            })?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(files::STORED_FILE_PERMISSIONS);

        options.open(path).await.map_err(|source| StorageError::Create {
            path: path.to_path_buf(),
            source,
        })
    }

    async fn write_body(
        &self,
        file: &mut fs::File,
        path: &Path,
        mut body: ChunkStream,
    ) -> DownloadResult<u64> {
        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|source| StorageError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|source| StorageError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        file.sync_all().await.map_err(|source| StorageError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(written)
    }

    async fn discard(path: &Path) {
        if let Err(e) = fs::remove_file(path).await {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to remove partial file {}: {}", path.display(), e);
            }
        }
    }
}

#[async_trait]
impl LocalStore for DirectoryStore {
    async fn snapshot(&self) -> StorageResult<LocalState> {
        let list_error = |source| StorageError::List {
            path: self.root.clone(),
            source,
        };

        let mut entries = fs::read_dir(&self.root).await.map_err(list_error)?;
        let mut state = LocalState::new();
        while let Some(entry) = entries.next_entry().await.map_err(list_error)? {
            let file_type = entry.file_type().await.map_err(list_error)?;
            if file_type.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => {
                    state.insert(Identifier::new(name));
                }
                Err(name) => {
                    warn!("Ignoring non UTF-8 file name {:?}", name);
                }
            }
        }

        debug!(
            "Snapshot of {}: {} files",
            self.root.display(),
            state.len()
        );
        Ok(state)
    }

    async fn delete(&self, identifier: &Identifier) -> StorageResult<()> {
        let path = self.path_of(identifier);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} already gone", path.display());
                Ok(())
            }
            Err(source) => Err(StorageError::Delete { path, source }),
        }
    }

    async fn store(&self, identifier: &Identifier, body: ChunkStream) -> DownloadResult<u64> {
        let partial = self.partial_path_of(identifier);
        let target = self.path_of(identifier);

        let mut file = self.create_partial(&partial).await?;
        let written = match self.write_body(&mut file, &partial, body).await {
            Ok(written) => written,
            Err(e) => {
                drop(file);
                Self::discard(&partial).await;
                return Err(e);
            }
        };
        drop(file);

        if let Err(source) = fs::rename(&partial, &target).await {
            Self::discard(&partial).await;
            return Err(DownloadError::Storage(StorageError::Commit {
                temp_path: partial,
                final_path: target,
                source,
            }));
        }

        debug!("Stored {} ({} bytes)", target.display(), written);
        Ok(written)
    }
}
