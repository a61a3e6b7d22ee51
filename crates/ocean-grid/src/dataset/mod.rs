//! Dataset access seam.
//!
//! A [`DatasetSource`] is an opened handle on one field's multi-resolution
//! store. Opening is expensive and done once per field; reads are cheap and
//! take exactly one timestep each.

mod memory;
mod zarr;

pub use memory::{InMemoryDataset, InMemoryOpener};
pub use zarr::{ZarrDataset, ZarrDatasetOpener, ZarrLevel};

use std::sync::Arc;

use ocean_common::{Field, QualityLevel};

use crate::error::Result;
use crate::types::{ExtractedArray, FieldDescriptor, LogicBox, ReadRequest};

/// An opened dataset handle.
///
/// Implementations must be usable from several request threads at once.
pub trait DatasetSource: Send + Sync {
    /// Native `[x, y, z]` extent.
    fn logic_box(&self) -> LogicBox;

    /// Number of timesteps available.
    fn timestep_count(&self) -> usize;

    /// Variable served by this dataset.
    fn field(&self) -> FieldDescriptor;

    /// Read one timestep of an index box given in native coordinates.
    ///
    /// The result is `[depth, y, x]` or `[time, depth, y, x]`; at coarse
    /// quality levels the y/x extents shrink accordingly.
    fn read(&self, request: &ReadRequest) -> Result<ExtractedArray>;

    /// Native cells per level cell along y and x when reading at `quality`.
    fn decimation(&self, _quality: QualityLevel) -> usize {
        1
    }
}

/// Opens dataset handles for fields.
pub trait DatasetOpener: Send + Sync {
    fn open(&self, field: Field) -> Result<Arc<dyn DatasetSource>>;
}
