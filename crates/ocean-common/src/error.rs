//! Error types for the ocean data services.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using OceanError.
pub type OceanResult<T> = Result<T, OceanError>;

/// Boxed cause carried by errors that wrap a lower layer.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Primary error type for region queries, dataset reads and batch runs.
#[derive(Debug, Error)]
pub enum OceanError {
    // === Parameter Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("could not parse '{value}' for '{param}': {message}")]
    InvalidParameter {
        param: String,
        value: String,
        message: String,
    },

    #[error("malformed query string: {0}")]
    MalformedQuery(String),

    #[error("Unknown field: {name}. Available fields: {available:?}")]
    UnknownField {
        name: String,
        available: Vec<&'static str>,
    },

    #[error("No data found in the given lat/lon range.")]
    EmptyRegion,

    // === Configuration Errors ===
    #[error(
        "Coordinate file not found: {0}\nPlease download llc4320_latlon.nc to the data folder."
    )]
    CoordinateFileMissing(PathBuf),

    #[error("Failed to load coordinates: {0}")]
    CoordinateLoad(String),

    // === Data Errors ===
    #[error("Failed to open dataset '{field}': {message}")]
    DatasetOpen { field: String, message: String },

    #[error("Failed to read data at timestep {timestep}: {source}")]
    ReadFailed {
        timestep: u32,
        #[source]
        source: BoxedCause,
    },

    #[error("Timestep {timestep} returned shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        timestep: u32,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Failed to write output: {0}")]
    WriteFailed(String),

    // === Infrastructure Errors ===
    #[error("Interrupted by user")]
    Interrupted,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl OceanError {
    /// Build an InvalidParameter error.
    pub fn invalid_parameter(
        param: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Wrap a lower-level read failure with its timestep.
    pub fn read_failed(timestep: u32, source: impl Into<BoxedCause>) -> Self {
        Self::ReadFailed {
            timestep,
            source: source.into(),
        }
    }

    /// True when the caller supplied something unusable (client fault).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            OceanError::MissingParameter(_)
                | OceanError::InvalidParameter { .. }
                | OceanError::MalformedQuery(_)
                | OceanError::UnknownField { .. }
                | OceanError::EmptyRegion
        )
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }

    /// Message body used by the HTTP layer.
    pub fn client_message(&self) -> String {
        if self.is_client_error() {
            format!("Invalid parameter: {}", self)
        } else {
            self.to_string()
        }
    }
}

impl From<std::io::Error> for OceanError {
    fn from(err: std::io::Error) -> Self {
        OceanError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for OceanError {
    fn from(err: serde_json::Error) -> Self {
        OceanError::Internal(format!("JSON error: {}", err))
    }
}
