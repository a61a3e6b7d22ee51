//! Multiscale publishing.
//!
//! Writes a `[time, depth, y, x]` float32 array as the layout
//! [`ZarrDataset`](crate::dataset::ZarrDataset) reads: a root group carrying
//! `field`, `levels` and `units`, plus one array per level at `/0`, `/1`, ...

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};
use zarrs::group::GroupBuilder;
use zarrs::storage::{ReadableStorageTraits, WritableStorageTraits};

use crate::config::{PyramidConfig, ZarrWriterConfig};
use crate::downsample::generate_levels;
use crate::error::{GridError, Result};

use super::zarr_writer::{ZarrWriteResult, ZarrWriter};

/// Outcome of a pyramid write.
#[derive(Debug, Clone)]
pub struct PyramidWriteResult {
    /// One entry per level, finest first.
    pub levels: Vec<ZarrWriteResult>,
}

impl PyramidWriteResult {
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn bytes_written(&self) -> u64 {
        self.levels.iter().map(|l| l.bytes_written).sum()
    }
}

/// Publishes dense fields as multiscale Zarr stores.
#[derive(Debug, Clone, Default)]
pub struct PyramidWriter {
    writer: ZarrWriter,
    config: PyramidConfig,
}

impl PyramidWriter {
    pub fn new(writer_config: ZarrWriterConfig, config: PyramidConfig) -> Self {
        Self {
            writer: ZarrWriter::new(writer_config),
            config,
        }
    }

    /// Write `data` shaped `[time, depth, y, x]` under the store root.
    pub fn write<S>(
        &self,
        storage: Arc<S>,
        field: &str,
        units: Option<&str>,
        shape: [usize; 4],
        data: &[f32],
    ) -> Result<PyramidWriteResult>
    where
        S: ReadableStorageTraits + WritableStorageTraits + 'static,
    {
        self.config.validate().map_err(GridError::ConfigError)?;

        let [nt, nz, ny, nx] = shape;
        let expected = nt * nz * ny * nx;
        if data.len() != expected {
            return Err(GridError::ShapeMismatch {
                shape: shape.to_vec(),
                len: data.len(),
            });
        }

        let num_levels = self.config.calculate_num_levels(nx, ny);

        let mut attrs = serde_json::Map::new();
        attrs.insert("field".to_string(), json!(field));
        attrs.insert("levels".to_string(), json!(num_levels));
        if let Some(units) = units {
            attrs.insert("units".to_string(), json!(units));
        }
        attrs.insert("downsample".to_string(), json!(self.config.method));

        let mut group_builder = GroupBuilder::new();
        group_builder.attributes(attrs);
        let group = group_builder
            .build(storage.clone(), "/")
            .map_err(|e| GridError::zarr_error(e.to_string()))?;
        group
            .store_metadata()
            .map_err(|e| GridError::storage_error(e.to_string()))?;

        let mut results = Vec::with_capacity(num_levels);
        results.push(self.writer.write_f32(
            storage.clone(),
            "/0",
            &[nt as u64, nz as u64, ny as u64, nx as u64],
            data,
            serde_json::Map::new(),
        )?);

        let planes = nt * nz;
        for level in generate_levels(data, planes, nx, ny, num_levels, self.config.method) {
            debug!(
                field,
                level = level.level,
                width = level.width,
                height = level.height,
                "Writing pyramid level"
            );
            let shape = [nt as u64, nz as u64, level.height as u64, level.width as u64];
            results.push(self.writer.write_f32(
                storage.clone(),
                &format!("/{}", level.level),
                &shape,
                &level.data,
                serde_json::Map::new(),
            )?);
        }

        let result = PyramidWriteResult { levels: results };
        info!(
            field,
            levels = result.level_count(),
            bytes = result.bytes_written(),
            "Pyramid written"
        );
        Ok(result)
    }
}
