//! Multiscale Zarr V3 dataset backend.
//!
//! Layout: a root group whose attributes carry `field`, `levels` and
//! optionally `units`, and one float32 array per level at `/0`, `/1`, ...
//! shaped `[time, depth, y, x]`. Level `k` halves x and y `k` times; time and
//! depth are never decimated.

use std::sync::Arc;

use tracing::{debug, info, warn};
use zarrs::array::{Array, DataType};
use zarrs::array_subset::ArraySubset;
use zarrs::group::Group;
use zarrs::storage::{ReadableStorage, ReadableStorageTraits};

use ocean_common::{Field, QualityLevel};

use crate::cache::{hash_path, DiskChunkCache};
use crate::config::field_url;
use crate::error::{GridError, Result};
use crate::storage::open_store;
use crate::types::{ExtractedArray, FieldDescriptor, LogicBox, ReadRequest};

use super::{DatasetOpener, DatasetSource};

/// One resolution level of a multiscale store.
pub struct ZarrLevel {
    array: Array<dyn ReadableStorageTraits>,
    /// `[time, depth, y, x]`
    shape: [u64; 4],
    chunk_shape: [u64; 4],
}

impl ZarrLevel {
    fn open(storage: &ReadableStorage, path: &str) -> Result<Self> {
        let array = Array::open(storage.clone(), path)
            .map_err(|e| GridError::open_failed(format!("{}: {}", path, e)))?;

        if array.data_type() != &DataType::Float32 {
            return Err(GridError::invalid_metadata(format!(
                "{} has data type {:?}, expected float32",
                path,
                array.data_type()
            )));
        }

        let shape: [u64; 4] = array.shape().try_into().map_err(|_| {
            GridError::invalid_metadata(format!(
                "{} must be [time, depth, y, x], found {} dimensions",
                path,
                array.shape().len()
            ))
        })?;

        let origin = vec![0u64; shape.len()];
        let chunk_shape = array
            .chunk_grid()
            .chunk_shape(&origin, array.shape())
            .map_err(|e| GridError::invalid_metadata(e.to_string()))?
            .ok_or_else(|| GridError::invalid_metadata("missing chunk shape"))?;
        let chunk_shape = [
            chunk_shape[0].get(),
            chunk_shape[1].get(),
            chunk_shape[2].get(),
            chunk_shape[3].get(),
        ];

        Ok(Self {
            array,
            shape,
            chunk_shape,
        })
    }

    /// `[time, depth, y, x]`
    pub fn shape(&self) -> [u64; 4] {
        self.shape
    }

    pub fn chunk_shape(&self) -> [u64; 4] {
        self.chunk_shape
    }

    fn retrieve(&self, start: [u64; 4], shape: [u64; 4]) -> Result<Vec<f32>> {
        let subset = ArraySubset::new_with_start_shape(start.to_vec(), shape.to_vec())
            .map_err(|e| GridError::read_failed(e.to_string()))?;
        self.array
            .retrieve_array_subset_elements::<f32>(&subset)
            .map_err(|e| GridError::read_failed(e.to_string()))
    }
}

/// Dataset handle over a multiscale Zarr store.
pub struct ZarrDataset {
    url: String,
    url_hash: u64,
    name: String,
    units: Option<String>,
    levels: Vec<ZarrLevel>,
    cache: Option<Arc<DiskChunkCache>>,
}

impl ZarrDataset {
    /// Open the store at `url` (http(s) URL or local path).
    pub fn open(url: &str, cache: Option<Arc<DiskChunkCache>>) -> Result<Self> {
        let storage = open_store(url)?;
        Self::open_with_storage(storage, url, cache)
    }

    /// Open a store that is already connected. `url` keys the chunk cache.
    pub fn open_with_storage(
        storage: ReadableStorage,
        url: &str,
        cache: Option<Arc<DiskChunkCache>>,
    ) -> Result<Self> {
        let attrs = match Group::open(storage.clone(), "/") {
            Ok(group) => group.attributes().clone(),
            Err(e) => {
                debug!(url, error = %e, "No root group metadata, assuming a single level");
                serde_json::Map::new()
            }
        };

        let level_count = attrs
            .get("levels")
            .and_then(|v| v.as_u64())
            .unwrap_or(1)
            .max(1) as usize;

        let name = attrs
            .get("field")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| url.to_string());

        let units = attrs
            .get("units")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let levels = (0..level_count)
            .map(|k| ZarrLevel::open(&storage, &format!("/{}", k)))
            .collect::<Result<Vec<_>>>()?;

        info!(
            url,
            field = %name,
            levels = levels.len(),
            shape = ?levels[0].shape,
            cached = cache.is_some(),
            "Dataset opened"
        );

        Ok(Self {
            url: url.to_string(),
            url_hash: hash_path(url),
            name,
            units,
            levels,
            cache,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    pub fn levels(&self) -> &[ZarrLevel] {
        &self.levels
    }

    /// Translate a native request into `(level, start, shape)` for that level.
    fn plan(&self, request: &ReadRequest) -> Result<(usize, [u64; 4], [u64; 4])> {
        let [nt, nz, ny, nx] = self.levels[0].shape;
        let valid = u64::from(request.timestep) < nt
            && request.z.start < request.z.end
            && u64::from(request.z.end) <= nz
            && request.y.start < request.y.end
            && request.y.end <= ny
            && request.x.start < request.x.end
            && request.x.end <= nx;
        if !valid {
            return Err(GridError::out_of_bounds(
                format!(
                    "t={} z={:?} y={:?} x={:?}",
                    request.timestep,
                    request.z.as_pair(),
                    request.y,
                    request.x
                ),
                format!("{:?}", self.levels[0].shape),
            ));
        }

        let level = request.quality.pyramid_level(self.levels.len());
        let [_, _, level_ny, level_nx] = self.levels[level].shape;
        let (y0, y1) = scale_range(request.y.start, request.y.end, level, level_ny);
        let (x0, x1) = scale_range(request.x.start, request.x.end, level, level_nx);

        let start = [
            u64::from(request.timestep),
            u64::from(request.z.start),
            y0,
            x0,
        ];
        let shape = [1, request.z.len() as u64, y1 - y0, x1 - x0];
        Ok((level, start, shape))
    }

    /// Assemble a subset chunk by chunk, going through the disk cache.
    fn read_cached(
        &self,
        cache: &DiskChunkCache,
        level_idx: usize,
        start: [u64; 4],
        shape: [u64; 4],
    ) -> Result<Vec<f32>> {
        let level = &self.levels[level_idx];
        let chunk = level.chunk_shape;
        let dims = level.shape;

        let first: [u64; 4] = std::array::from_fn(|d| start[d] / chunk[d]);
        let last: [u64; 4] = std::array::from_fn(|d| (start[d] + shape[d] - 1) / chunk[d]);

        let out_shape = shape.map(|v| v as usize);
        let mut output = vec![f32::NAN; out_shape.iter().product()];

        for c0 in first[0]..=last[0] {
            for c1 in first[1]..=last[1] {
                for c2 in first[2]..=last[2] {
                    for c3 in first[3]..=last[3] {
                        let indices = [c0, c1, c2, c3];
                        let origin: [u64; 4] = std::array::from_fn(|d| indices[d] * chunk[d]);
                        let extent: [u64; 4] =
                            std::array::from_fn(|d| chunk[d].min(dims[d] - origin[d]));

                        let data = match cache.get(self.url_hash, level_idx, &indices) {
                            Some(data) => data,
                            None => {
                                let data = level.retrieve(origin, extent)?;
                                if let Err(e) =
                                    cache.insert(self.url_hash, level_idx, &indices, &data)
                                {
                                    warn!(url = %self.url, error = %e, "Failed to cache chunk");
                                }
                                data
                            }
                        };

                        let expected: u64 = extent.iter().product();
                        if data.len() as u64 != expected {
                            return Err(GridError::read_failed(format!(
                                "chunk {:?} holds {} values, expected {}",
                                indices,
                                data.len(),
                                expected
                            )));
                        }

                        copy_overlap(&data, origin, extent, &mut output, start, shape);
                    }
                }
            }
        }

        Ok(output)
    }
}

impl DatasetSource for ZarrDataset {
    fn logic_box(&self) -> LogicBox {
        let [_, nz, ny, nx] = self.levels[0].shape;
        LogicBox::from_extents(vec![nx, ny, nz])
    }

    fn timestep_count(&self) -> usize {
        self.levels[0].shape[0] as usize
    }

    fn field(&self) -> FieldDescriptor {
        FieldDescriptor::float32(self.name.clone())
    }

    fn read(&self, request: &ReadRequest) -> Result<ExtractedArray> {
        let (level, start, shape) = self.plan(request)?;

        debug!(
            url = %self.url,
            timestep = request.timestep,
            level,
            start = ?start,
            shape = ?shape,
            "Reading subset"
        );

        let data = match &self.cache {
            Some(cache) => self.read_cached(cache, level, start, shape)?,
            None => self.levels[level].retrieve(start, shape)?,
        };

        ExtractedArray::new(shape.iter().map(|v| *v as usize).collect(), data)
    }

    fn decimation(&self, quality: QualityLevel) -> usize {
        1 << quality.pyramid_level(self.levels.len())
    }
}

/// Scale a native half-open range down by `2^level`, keeping at least one cell.
fn scale_range(start: u64, end: u64, level: usize, extent: u64) -> (u64, u64) {
    let factor = 1u64 << level;
    let last = extent.saturating_sub(1);
    let lo = (start / factor).min(last);
    let hi = end.div_ceil(factor).min(extent).max(lo + 1);
    (lo, hi)
}

/// Copy the part of a chunk that overlaps the output window.
fn copy_overlap(
    chunk: &[f32],
    origin: [u64; 4],
    extent: [u64; 4],
    output: &mut [f32],
    start: [u64; 4],
    shape: [u64; 4],
) {
    let lo: [u64; 4] = std::array::from_fn(|d| origin[d].max(start[d]));
    let hi: [u64; 4] =
        std::array::from_fn(|d| (origin[d] + extent[d]).min(start[d] + shape[d]));
    if (0..4).any(|d| lo[d] >= hi[d]) {
        return;
    }

    let width = (hi[3] - lo[3]) as usize;
    for t in lo[0]..hi[0] {
        for z in lo[1]..hi[1] {
            for y in lo[2]..hi[2] {
                let src = ((((t - origin[0]) * extent[1] + (z - origin[1])) * extent[2]
                    + (y - origin[2]))
                    * extent[3]
                    + (lo[3] - origin[3])) as usize;
                let dst = ((((t - start[0]) * shape[1] + (z - start[1])) * shape[2]
                    + (y - start[2]))
                    * shape[3]
                    + (lo[3] - start[3])) as usize;
                output[dst..dst + width].copy_from_slice(&chunk[src..src + width]);
            }
        }
    }
}

/// Opens one multiscale store per field under a common base URL.
pub struct ZarrDatasetOpener {
    base_url: String,
    cache: Option<Arc<DiskChunkCache>>,
}

impl ZarrDatasetOpener {
    pub fn new(base_url: impl Into<String>, cache: Option<Arc<DiskChunkCache>>) -> Self {
        Self {
            base_url: base_url.into(),
            cache,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl DatasetOpener for ZarrDatasetOpener {
    fn open(&self, field: Field) -> Result<Arc<dyn DatasetSource>> {
        let url = field_url(&self.base_url, field);
        info!(field = %field, url = %url, "Loading dataset");
        let dataset = ZarrDataset::open(&url, self.cache.clone())?;
        Ok(Arc::new(dataset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_range() {
        assert_eq!(scale_range(0, 10, 0, 10), (0, 10));
        assert_eq!(scale_range(3, 9, 1, 5), (1, 5));
        assert_eq!(scale_range(3, 9, 2, 3), (0, 3));
        // Narrow range keeps one cell
        assert_eq!(scale_range(5, 6, 3, 2), (0, 1));
        // Start past a truncated extent is clamped onto the last cell
        assert_eq!(scale_range(9, 10, 1, 4), (3, 4));
    }

    #[test]
    fn test_copy_overlap_partial_chunk() {
        // Chunk [1, 1, 2, 3] at origin (0, 0, 2, 3), values 0..6
        let chunk: Vec<f32> = (0..6).map(|v| v as f32).collect();
        let mut output = vec![f32::NAN; 4];
        // Output window [1, 1, 2, 2] starting at (0, 0, 3, 4)
        copy_overlap(
            &chunk,
            [0, 0, 2, 3],
            [1, 1, 2, 3],
            &mut output,
            [0, 0, 3, 4],
            [1, 1, 2, 2],
        );
        // Only row y=3 lies inside the chunk: values at x=4,5 -> 4.0, 5.0
        assert_eq!(output[0], 4.0);
        assert_eq!(output[1], 5.0);
        assert!(output[2].is_nan());
        assert!(output[3].is_nan());
    }
}
