//! Region access for LLC4320 ocean fields.
//!
//! This crate turns lat/lon/depth/time queries into reads against
//! multi-resolution Zarr stores and shapes the results for the API:
//!
//! - **Region translation**: a lat/lon box becomes the enclosing index
//!   rectangle of every matching cell of the curvilinear coordinate grid
//! - **Dataset access**: one handle per field over a multiscale store,
//!   remote (HTTP) or local, with an on-disk chunk cache
//! - **Response shaping**: nested JSON arrays or base64 float32 payloads
//! - **Output**: zarr writers for batch results and multiscale publishing
//!
//! # Architecture
//!
//! ```text
//! API request / batch loop
//!      │
//!      ▼
//! DataService ──► CoordinateGrid::locate(bbox) ──► IndexBox
//!      │                                              │
//!      └─► DatasetSource::read(timestep, IndexBox, depth, quality)
//!               │
//!               ├─► ZarrDataset: pick pyramid level, walk chunks
//!               │         │
//!               │         ├─► DiskChunkCache hit: local file
//!               │         └─► miss: HTTP range fetch via object_store
//!               │
//!               └─► ExtractedArray ──► EncodedArray (array | base64)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ocean_grid::{DataService, DataServiceConfig, SliceQuery};
//! use ocean_common::{LatLonBox, QualityLevel, ResponseFormat};
//!
//! let service = DataService::from_config(DataServiceConfig::from_env())?;
//! let slice = service.get_data_slice(&SliceQuery {
//!     field: "salinity".into(),
//!     timestep: 0,
//!     depth_level: 0,
//!     bbox: LatLonBox::new(-40.0, -10.0, 105.0, 160.0),
//!     quality: QualityLevel::DEFAULT,
//!     format: ResponseFormat::Base64,
//! })?;
//! ```

pub mod cache;
pub mod config;
pub mod coords;
pub mod dataset;
pub mod downsample;
pub mod error;
pub mod reader;
pub mod response;
pub mod service;
pub mod storage;
pub mod types;
pub mod writer;

// Re-export commonly used types at crate root
pub use cache::{CacheStats, DiskChunkCache};
pub use config::{
    field_url, flag_is_set, DataServiceConfig, PyramidConfig, ZarrCompression, ZarrWriterConfig,
    DEFAULT_CACHE_DIR, DEFAULT_DATASET_BASE_URL, DEFAULT_DATA_DIR, NO_DISK_CACHE_ENV,
};
pub use coords::{
    CoordinateGrid, CoordinateLoader, NetcdfCoordinateLoader, StaticCoordinateLoader, SubGrid,
};
pub use dataset::{
    DatasetOpener, DatasetSource, InMemoryDataset, InMemoryOpener, ZarrDataset,
    ZarrDatasetOpener,
};
pub use downsample::DownsampleMethod;
pub use error::{GridError, Result};
pub use reader::{read_region, RegionData};
pub use response::{
    CoordinatesResponse, Dimensions, EncodedArray, MetadataResponse, SliceResponse,
    TimestepResponse,
};
pub use service::{DataService, SliceQuery, TimestepQuery};
pub use storage::open_store;
pub use types::{ExtractedArray, FieldDescriptor, LogicBox, ReadRequest};
pub use writer::{PyramidWriteResult, PyramidWriter, ZarrWriteResult, ZarrWriter};
