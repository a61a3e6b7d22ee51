//! Server configuration from command line and environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use ocean_grid::{
    DataServiceConfig, DEFAULT_CACHE_DIR, DEFAULT_DATASET_BASE_URL, DEFAULT_DATA_DIR,
    NO_DISK_CACHE_ENV,
};

/// LLC4320 ocean data API server
#[derive(Parser, Debug, Clone)]
#[command(name = "ocean-api")]
#[command(about = "HTTP API serving LLC4320 ocean data regions to the frontend")]
pub struct ServerConfig {
    /// Bind host
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    pub host: String,

    /// Bind port
    #[arg(short, long, default_value_t = 5000, env = "PORT")]
    pub port: u16,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Number of worker threads
    #[arg(long, env = "OCEAN_WORKER_THREADS")]
    pub worker_threads: Option<usize>,

    /// Directory holding llc4320_latlon.nc
    #[arg(long, default_value = DEFAULT_DATA_DIR, env = "LLC4320_DATA_DIR")]
    pub data_dir: PathBuf,

    /// On-disk chunk cache directory
    #[arg(long, default_value = DEFAULT_CACHE_DIR, env = "LLC4320_CACHE_DIR")]
    pub cache_dir: PathBuf,

    /// Static frontend directory served at /
    #[arg(long, default_value = "./frontend", env = "LLC4320_FRONTEND_DIR")]
    pub frontend_dir: PathBuf,

    /// Root URL (or local directory) of the per-field stores
    #[arg(long, default_value = DEFAULT_DATASET_BASE_URL, env = "LLC4320_DATASET_BASE_URL")]
    pub dataset_base_url: String,

    /// Disable the on-disk chunk cache
    #[arg(long, env = NO_DISK_CACHE_ENV)]
    pub no_disk_cache: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }

    pub fn data_service_config(&self) -> DataServiceConfig {
        DataServiceConfig {
            data_dir: self.data_dir.clone(),
            cache_dir: self.cache_dir.clone(),
            dataset_base_url: self.dataset_base_url.clone(),
            disk_cache: !self.no_disk_cache,
        }
    }
}
