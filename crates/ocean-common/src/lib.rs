//! Common types shared across the LLC4320 ocean data services.

pub mod error;
pub mod field;
pub mod query;
pub mod region;

pub use error::{OceanError, OceanResult};
pub use field::{Field, FIELD_NAMES};
pub use query::{QualityLevel, ResponseFormat};
pub use region::{DepthRange, IndexBox, LatLonBox, RegionSelector};
