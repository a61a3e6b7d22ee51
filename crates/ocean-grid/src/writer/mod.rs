//! Zarr output: plain arrays for batch results, multiscale stores for serving.

mod pyramid;
mod zarr_writer;

pub use pyramid::{PyramidWriteResult, PyramidWriter};
pub use zarr_writer::{ZarrWriteResult, ZarrWriter};
