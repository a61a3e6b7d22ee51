//! Application state for the ocean API.

use std::path::PathBuf;

use anyhow::{Context, Result};
use ocean_grid::DataService;

use crate::config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// Dataset handles and the coordinate grid, opened lazily.
    pub data_service: DataService,

    /// Static frontend root.
    pub frontend_dir: PathBuf,
}

impl AppState {
    pub fn new(data_service: DataService, frontend_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_service,
            frontend_dir: frontend_dir.into(),
        }
    }

    /// Build the zarr-backed state described by `config`.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let data_service = DataService::from_config(config.data_service_config())
            .context("Failed to initialise data service")?;
        Ok(Self::new(data_service, config.frontend_dir.clone()))
    }
}
