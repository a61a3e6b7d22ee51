//! Error types for coordinate file reading.

use std::path::PathBuf;

use ocean_common::OceanError;
use thiserror::Error;

/// Result type for coordinate parser operations.
pub type CoordsResult<T> = Result<T, CoordsError>;

/// Error types for coordinate file reading.
#[derive(Error, Debug)]
pub enum CoordsError {
    /// The coordinate file does not exist
    #[error("coordinate file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable
    #[error("Missing required variable: {0}")]
    MissingVariable(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Latitude and longitude grids disagree
    #[error("latitude grid is {lat:?} but longitude grid is {lon:?}")]
    ShapeMismatch {
        lat: (usize, usize),
        lon: (usize, usize),
    },
}

impl From<CoordsError> for OceanError {
    fn from(err: CoordsError) -> Self {
        match err {
            CoordsError::NotFound(path) => OceanError::CoordinateFileMissing(path),
            other => OceanError::CoordinateLoad(other.to_string()),
        }
    }
}
