//! Storage backends for Zarr access.
//!
//! Remote datasets are reached over plain HTTP(S) through `object_store`,
//! wrapped for the synchronous zarrs API. Anything that is not an http(s)
//! URL is treated as a local directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use object_store::http::HttpBuilder;
use tokio::runtime::Handle;
use zarrs::storage::ReadableStorage;
use zarrs_filesystem::FilesystemStore;
use zarrs_object_store::AsyncObjectStore;
use zarrs_storage::storage_adapter::async_to_sync::{
    AsyncToSyncBlockOn, AsyncToSyncStorageAdapter,
};

use crate::error::{GridError, Result};

/// Blocking executor bound to a captured runtime handle.
///
/// Inside a runtime thread the call is moved off the async worker with
/// `block_in_place`; on plain threads (blocking pool, batch loop) the handle
/// drives the future directly.
#[derive(Clone)]
pub struct HandleBlockOn {
    handle: Handle,
}

impl HandleBlockOn {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Capture the handle of the runtime we are running in.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| GridError::open_failed(format!("remote stores need a tokio runtime: {}", e)))
    }
}

impl AsyncToSyncBlockOn for HandleBlockOn {
    fn block_on<F: core::future::Future>(&self, future: F) -> F::Output {
        if Handle::try_current().is_ok() {
            tokio::task::block_in_place(|| self.handle.block_on(future))
        } else {
            self.handle.block_on(future)
        }
    }
}

/// Where a dataset lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// `http://` or `https://` URL of the store root.
    Http(String),
    /// Local directory.
    Local(PathBuf),
}

impl StoreLocation {
    /// Classify a dataset URL. `file://` prefixes are stripped.
    pub fn parse(url: &str) -> Self {
        let url = url.trim();
        if url.starts_with("http://") || url.starts_with("https://") {
            StoreLocation::Http(url.trim_end_matches('/').to_string())
        } else {
            let path = url.strip_prefix("file://").unwrap_or(url);
            StoreLocation::Local(PathBuf::from(path))
        }
    }
}

/// Open a readable store for a dataset URL.
pub fn open_store(url: &str) -> Result<ReadableStorage> {
    match StoreLocation::parse(url) {
        StoreLocation::Http(url) => create_http_storage(&url),
        StoreLocation::Local(path) => create_filesystem_storage(&path),
    }
}

/// Create an HTTP-backed store for a remote Zarr hierarchy.
///
/// Must be called from within a tokio runtime; reads may then be issued from
/// any thread.
pub fn create_http_storage(url: &str) -> Result<ReadableStorage> {
    let http = HttpBuilder::new()
        .with_url(url)
        .build()
        .map_err(|e| GridError::open_failed(format!("Failed to create HTTP client: {}", e)))?;

    let async_store = Arc::new(AsyncObjectStore::new(http));
    let sync_store = AsyncToSyncStorageAdapter::new(async_store, HandleBlockOn::current()?);

    Ok(Arc::new(sync_store))
}

/// Open a local Zarr hierarchy.
pub fn create_filesystem_storage(path: &Path) -> Result<ReadableStorage> {
    if !path.exists() {
        return Err(GridError::open_failed(format!(
            "dataset directory not found: {}",
            path.display()
        )));
    }
    let store = FilesystemStore::new(path)
        .map_err(|e| GridError::open_failed(format!("{}: {}", path.display(), e)))?;
    Ok(Arc::new(store))
}
