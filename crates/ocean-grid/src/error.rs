//! Error types for dataset access.

use thiserror::Error;

/// Errors raised by dataset backends, the chunk cache and the zarr writer.
#[derive(Error, Debug)]
pub enum GridError {
    /// Failed to open the dataset.
    #[error("failed to open dataset: {0}")]
    OpenFailed(String),

    /// Failed to read data from the dataset.
    #[error("failed to read dataset: {0}")]
    ReadFailed(String),

    /// The requested index box is outside the dataset extent.
    #[error("requested region {requested} is outside dataset bounds {grid}")]
    OutOfBounds { requested: String, grid: String },

    /// Invalid metadata in the store.
    #[error("invalid dataset metadata: {0}")]
    InvalidMetadata(String),

    /// Array shape does not match the element count.
    #[error("shape {shape:?} does not hold {len} values")]
    ShapeMismatch { shape: Vec<usize>, len: usize },

    /// Zarr format error.
    #[error("Zarr format error: {0}")]
    ZarrError(String),

    /// Storage/IO error.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// On-disk chunk cache error.
    #[error("cache error: {0}")]
    CacheError(String),
}

impl GridError {
    /// Create an OpenFailed error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create an OutOfBounds error.
    pub fn out_of_bounds(requested: impl Into<String>, grid: impl Into<String>) -> Self {
        Self::OutOfBounds {
            requested: requested.into(),
            grid: grid.into(),
        }
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }

    /// Create a ZarrError.
    pub fn zarr_error(msg: impl Into<String>) -> Self {
        Self::ZarrError(msg.into())
    }

    /// Create a StorageError.
    pub fn storage_error(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }
}

impl From<std::io::Error> for GridError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

/// Result type for dataset operations.
pub type Result<T> = std::result::Result<T, GridError>;
