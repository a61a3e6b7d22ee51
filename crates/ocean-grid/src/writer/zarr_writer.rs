//! Zarr V3 array writer.
//!
//! Arrays are chunked one element at a time along every leading axis (time,
//! depth) and `chunk_size` along the trailing y/x axes, so a reader fetching
//! one timestep never pulls its neighbours.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::storage::{ReadableStorageTraits, WritableStorageTraits};

use crate::config::{ZarrCompression, ZarrWriterConfig};
use crate::error::{GridError, Result};

/// Summary of one written array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZarrWriteResult {
    /// Array path inside the store.
    pub path: String,
    pub shape: Vec<u64>,
    pub chunk_shape: Vec<u64>,
    /// `float32` or `float64`.
    pub dtype: String,
    /// Compression codec name.
    pub compression: String,
    /// Uncompressed bytes written.
    pub bytes_written: u64,
}

/// Writer for float Zarr V3 arrays.
#[derive(Debug, Clone, Default)]
pub struct ZarrWriter {
    config: ZarrWriterConfig,
}

impl ZarrWriter {
    pub fn new(config: ZarrWriterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ZarrWriterConfig {
        &self.config
    }

    /// Chunk shape used for an array of `shape`.
    pub fn chunk_shape(&self, shape: &[u64]) -> Vec<u64> {
        let spatial_from = shape.len().saturating_sub(2);
        shape
            .iter()
            .enumerate()
            .map(|(axis, &extent)| {
                if axis < spatial_from {
                    1
                } else {
                    (self.config.chunk_size as u64).min(extent).max(1)
                }
            })
            .collect()
    }

    /// Write a float32 array with NaN fill.
    pub fn write_f32<S>(
        &self,
        storage: Arc<S>,
        path: &str,
        shape: &[u64],
        data: &[f32],
        attrs: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ZarrWriteResult>
    where
        S: ReadableStorageTraits + WritableStorageTraits + 'static,
    {
        check_len(shape, data.len())?;
        let array = self.build_array(
            storage,
            path,
            shape,
            DataType::Float32,
            FillValue::from(f32::NAN),
            std::mem::size_of::<f32>(),
            attrs,
        )?;

        array
            .store_array_subset_elements(&full_subset(shape)?, data)
            .map_err(|e| GridError::storage_error(e.to_string()))?;

        Ok(self.result(path, shape, "float32", std::mem::size_of_val(data)))
    }

    /// Write a float64 array with NaN fill (coordinate grids).
    pub fn write_f64<S>(
        &self,
        storage: Arc<S>,
        path: &str,
        shape: &[u64],
        data: &[f64],
        attrs: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ZarrWriteResult>
    where
        S: ReadableStorageTraits + WritableStorageTraits + 'static,
    {
        check_len(shape, data.len())?;
        let array = self.build_array(
            storage,
            path,
            shape,
            DataType::Float64,
            FillValue::from(f64::NAN),
            std::mem::size_of::<f64>(),
            attrs,
        )?;

        array
            .store_array_subset_elements(&full_subset(shape)?, data)
            .map_err(|e| GridError::storage_error(e.to_string()))?;

        Ok(self.result(path, shape, "float64", std::mem::size_of_val(data)))
    }

    fn result(&self, path: &str, shape: &[u64], dtype: &str, bytes: usize) -> ZarrWriteResult {
        ZarrWriteResult {
            path: path.to_string(),
            shape: shape.to_vec(),
            chunk_shape: self.chunk_shape(shape),
            dtype: dtype.to_string(),
            compression: self.config.compression.as_str().to_string(),
            bytes_written: bytes as u64,
        }
    }

    /// Build the array and store its metadata.
    #[allow(clippy::too_many_arguments)]
    fn build_array<S>(
        &self,
        storage: Arc<S>,
        path: &str,
        shape: &[u64],
        data_type: DataType,
        fill_value: FillValue,
        typesize: usize,
        attrs: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Array<S>>
    where
        S: ReadableStorageTraits + WritableStorageTraits + 'static,
    {
        let chunk_grid: zarrs::array::ChunkGrid = self
            .chunk_shape(shape)
            .try_into()
            .map_err(|e| GridError::ConfigError(format!("{:?}", e)))?;

        let mut binding = ArrayBuilder::new(shape.to_vec(), data_type, chunk_grid, fill_value);
        let mut builder = binding.attributes(attrs);

        if self.config.compression != ZarrCompression::None {
            let codec = self.create_compression_codec(typesize)?;
            builder = builder.bytes_to_bytes_codecs(vec![codec]);
        }

        let array = builder
            .build(storage, path)
            .map_err(|e| GridError::zarr_error(e.to_string()))?;

        array
            .store_metadata()
            .map_err(|e| GridError::storage_error(e.to_string()))?;

        Ok(array)
    }

    fn create_compression_codec(
        &self,
        typesize: usize,
    ) -> Result<Arc<dyn zarrs::array::codec::BytesToBytesCodecTraits>> {
        let level = BloscCompressionLevel::try_from(self.config.compression_level)
            .map_err(|_| GridError::ConfigError("Invalid compression level".to_string()))?;

        let shuffle = if self.config.shuffle {
            BloscShuffleMode::Shuffle
        } else {
            BloscShuffleMode::NoShuffle
        };

        // Blosc needs the element size to shuffle
        let typesize = self.config.shuffle.then_some(typesize);

        let compressor = match self.config.compression {
            ZarrCompression::None => {
                return Err(GridError::ConfigError(
                    "No compression configured".to_string(),
                ))
            }
            ZarrCompression::BloscLz4 => BloscCompressor::LZ4,
            ZarrCompression::BloscZstd => BloscCompressor::Zstd,
        };

        let codec = BloscCodec::new(compressor, level, None, shuffle, typesize)
            .map_err(|e| GridError::ConfigError(e.to_string()))?;

        Ok(Arc::new(codec))
    }
}

fn check_len(shape: &[u64], len: usize) -> Result<()> {
    let expected: u64 = shape.iter().product();
    if expected != len as u64 {
        return Err(GridError::ShapeMismatch {
            shape: shape.iter().map(|v| *v as usize).collect(),
            len,
        });
    }
    Ok(())
}

fn full_subset(shape: &[u64]) -> Result<ArraySubset> {
    ArraySubset::new_with_start_shape(vec![0; shape.len()], shape.to_vec())
        .map_err(|e| GridError::storage_error(e.to_string()))
}
