//! Configuration for dataset access and zarr output.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use ocean_common::Field;

use crate::downsample::{halved, DownsampleMethod};

/// Public origin serving the LLC4320 fields.
pub const DEFAULT_DATASET_BASE_URL: &str =
    "https://nsdf-climate1-origin.nationalresearchplatform.org:50098/nasa/nsdf/climate1/llc4320";

/// Default data directory (holds `llc4320_latlon.nc` and batch output).
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default on-disk cache directory for fetched chunks.
pub const DEFAULT_CACHE_DIR: &str = "./.visus_cache_can_be_deleted";

/// Store URL for a field under `base_url`.
///
/// `salinity` lives at `<base>/salt/salt_llc4320_x_y_depth.zarr`, and so on.
pub fn field_url(base_url: &str, field: Field) -> String {
    let variable = field.variable();
    format!(
        "{}/{}/{}_llc4320_x_y_depth.zarr",
        base_url.trim_end_matches('/'),
        variable,
        variable
    )
}

/// Set to a truthy value to turn the on-disk chunk cache off.
pub const NO_DISK_CACHE_ENV: &str = "LLC4320_NO_DISK_CACHE";

/// Whether a boolean environment variable is set. Empty, `0`, `f`, `false`,
/// `n`, `no` and `off` are unset, matching clap's flag parsing.
pub fn flag_is_set(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "" | "0" | "f" | "false" | "n" | "no" | "off"
    )
}

/// Configuration for the data access service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataServiceConfig {
    /// Directory holding the coordinate file.
    pub data_dir: PathBuf,

    /// On-disk chunk cache directory. Created at startup.
    pub cache_dir: PathBuf,

    /// Root URL (or local directory) of the per-field stores.
    pub dataset_base_url: String,

    /// Keep fetched chunks in `cache_dir`.
    pub disk_cache: bool,
}

impl Default for DataServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            dataset_base_url: DEFAULT_DATASET_BASE_URL.to_string(),
            disk_cache: true,
        }
    }
}

impl DataServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("LLC4320_DATA_DIR") {
            config.data_dir = PathBuf::from(val);
        }

        if let Some(val) = lookup("LLC4320_CACHE_DIR") {
            config.cache_dir = PathBuf::from(val);
        }

        if let Some(val) = lookup("LLC4320_DATASET_BASE_URL") {
            config.dataset_base_url = val;
        }

        if let Some(val) = lookup(NO_DISK_CACHE_ENV) {
            config.disk_cache = !flag_is_set(&val);
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.dataset_base_url.trim().is_empty() {
            return Err("dataset_base_url must not be empty".to_string());
        }
        Ok(())
    }
}

/// Compression codec for Zarr output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ZarrCompression {
    /// No compression.
    None,
    /// Blosc with LZ4.
    BloscLz4,
    /// Blosc with Zstd (recommended).
    #[default]
    BloscZstd,
}

impl ZarrCompression {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => Self::None,
            "blosc_lz4" | "lz4" => Self::BloscLz4,
            _ => Self::BloscZstd,
        }
    }

    /// Get the codec name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BloscLz4 => "blosc_lz4",
            Self::BloscZstd => "blosc_zstd",
        }
    }
}

impl std::fmt::Display for ZarrCompression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settings for writing Zarr arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZarrWriterConfig {
    /// Chunk edge along y and x. Leading axes are chunked one element at a time.
    pub chunk_size: usize,

    /// Compression codec.
    pub compression: ZarrCompression,

    /// Compression level (1-9).
    pub compression_level: u8,

    /// Enable byte shuffle filter for better compression.
    pub shuffle: bool,
}

impl Default for ZarrWriterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 256,
            compression: ZarrCompression::BloscZstd,
            compression_level: 1,
            shuffle: true,
        }
    }
}

impl ZarrWriterConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be > 0".to_string());
        }

        if self.compression_level == 0 || self.compression_level > 9 {
            return Err("compression_level must be 1-9".to_string());
        }

        Ok(())
    }
}

/// Configuration for multiscale publishing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PyramidConfig {
    /// Stop adding levels once the smaller of y/x would drop below this.
    pub min_dimension: usize,

    /// Hard cap on the number of levels, including level 0.
    pub max_levels: usize,

    /// Downsampling method for every level.
    pub method: DownsampleMethod,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            min_dimension: 64,
            max_levels: 8,
            method: DownsampleMethod::Mean,
        }
    }
}

impl PyramidConfig {
    /// Validate the pyramid configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_dimension == 0 {
            return Err("pyramid min_dimension must be > 0".to_string());
        }

        if self.max_levels == 0 {
            return Err("pyramid max_levels must be > 0".to_string());
        }

        Ok(())
    }

    /// Number of levels generated for a `height x width` grid, including level 0.
    pub fn calculate_num_levels(&self, width: usize, height: usize) -> usize {
        let mut levels = 1;
        let mut w = width;
        let mut h = height;

        while levels < self.max_levels {
            let (next_w, next_h) = (halved(w), halved(h));
            if next_w.min(next_h) < self.min_dimension || (next_w, next_h) == (w, h) {
                break;
            }
            w = next_w;
            h = next_h;
            levels += 1;
        }

        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_field_url() {
        assert_eq!(
            field_url("https://example.org/llc4320/", Field::Salinity),
            "https://example.org/llc4320/salt/salt_llc4320_x_y_depth.zarr"
        );
        assert_eq!(
            field_url("/srv/llc4320", Field::VerticalVelocity),
            "/srv/llc4320/w/w_llc4320_x_y_depth.zarr"
        );
    }

    #[test]
    fn test_default_config() {
        let config = DataServiceConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.cache_dir, PathBuf::from("./.visus_cache_can_be_deleted"));
        assert!(config.dataset_base_url.ends_with("/llc4320"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("LLC4320_CACHE_DIR", "/tmp/llc-cache"),
            (NO_DISK_CACHE_ENV, "1"),
        ]
        .into_iter()
        .collect();
        let config = DataServiceConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/llc-cache"));
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert!(!config.disk_cache);

        let config = DataServiceConfig::from_lookup(|key| {
            (key == NO_DISK_CACHE_ENV).then(|| "false".to_string())
        });
        assert!(config.disk_cache);

        assert!(DataServiceConfig::from_lookup(|_| None).disk_cache);
    }

    #[test]
    fn test_flag_is_set() {
        for value in ["1", "true", "YES", "on"] {
            assert!(flag_is_set(value), "{}", value);
        }
        for value in ["", "0", "False", "no", "off"] {
            assert!(!flag_is_set(value), "{}", value);
        }
    }

    #[test]
    fn test_writer_config_validation() {
        let mut config = ZarrWriterConfig::default();
        assert!(config.validate().is_ok());

        config.chunk_size = 0;
        assert!(config.validate().is_err());

        config = ZarrWriterConfig::default();
        config.compression_level = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zarr_compression_from_str() {
        assert_eq!(ZarrCompression::from_str("none"), ZarrCompression::None);
        assert_eq!(ZarrCompression::from_str("LZ4"), ZarrCompression::BloscLz4);
        assert_eq!(ZarrCompression::from_str("invalid"), ZarrCompression::BloscZstd);
    }

    #[test]
    fn test_calculate_num_levels() {
        let config = PyramidConfig {
            min_dimension: 4,
            max_levels: 8,
            method: DownsampleMethod::Mean,
        };
        // 16 -> 8 -> 4, next would be 2
        assert_eq!(config.calculate_num_levels(16, 16), 3);
        assert_eq!(config.calculate_num_levels(3, 3), 1);

        let capped = PyramidConfig {
            max_levels: 2,
            ..config
        };
        assert_eq!(capped.calculate_num_levels(1024, 1024), 2);
    }
}
