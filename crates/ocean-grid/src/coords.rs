//! Coordinate grid and region translation.
//!
//! The LLC4320 grid is curvilinear, so a lat/lon box cannot be mapped to
//! indices arithmetically. Instead every cell is tested against the box and
//! the enclosing index rectangle of the matching cells is returned. Cells
//! inside that rectangle but outside the box are kept.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use coords_parser::{read_coordinates, CoordinateArrays, COORDINATE_FILE_NAME};
use ocean_common::{IndexBox, LatLonBox, OceanError, OceanResult};

/// Latitude/longitude of every native `(y, x)` cell, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateGrid {
    width: usize,
    height: usize,
    latitude: Vec<f64>,
    longitude: Vec<f64>,
}

/// Nested `[y][x]` coordinate rows for a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubGrid {
    pub latitude: Vec<Vec<f64>>,
    pub longitude: Vec<Vec<f64>>,
}

impl CoordinateGrid {
    /// Build a grid from flat row-major arrays of `height * width` values.
    pub fn new(
        latitude: Vec<f64>,
        longitude: Vec<f64>,
        height: usize,
        width: usize,
    ) -> OceanResult<Self> {
        let arrays = CoordinateArrays::new(latitude, longitude, height, width)?;
        Ok(Self::from(arrays))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `[height, width]`.
    pub fn shape(&self) -> [usize; 2] {
        [self.height, self.width]
    }

    /// Enclosing index rectangle of every cell whose lat and lon fall inside `bbox`.
    ///
    /// Bounds are inclusive on the box and half-open on the returned indices.
    /// Scans the whole grid on every call.
    pub fn locate(&self, bbox: &LatLonBox) -> OceanResult<IndexBox> {
        let mut x_min = usize::MAX;
        let mut x_max = 0;
        let mut y_min = usize::MAX;
        let mut y_max = 0;
        let mut matched = false;

        for y in 0..self.height {
            let row = y * self.width;
            for x in 0..self.width {
                let idx = row + x;
                if bbox.contains(self.latitude[idx], self.longitude[idx]) {
                    matched = true;
                    x_min = x_min.min(x);
                    x_max = x_max.max(x);
                    y_min = y_min.min(y);
                    y_max = y_max.max(y);
                }
            }
        }

        if !matched {
            return Err(OceanError::EmptyRegion);
        }

        let index_box = IndexBox::new(x_min, x_max + 1, y_min, y_max + 1);
        debug!(?bbox, ?index_box, "Located region");
        Ok(index_box)
    }

    /// Latitude and longitude rows covered by `index_box`, clipped to the grid.
    pub fn subgrid(&self, index_box: &IndexBox) -> SubGrid {
        let x_end = index_box.x_max.min(self.width);
        let y_end = index_box.y_max.min(self.height);
        let x_start = index_box.x_min.min(x_end);
        let y_start = index_box.y_min.min(y_end);

        let cut = |values: &[f64]| -> Vec<Vec<f64>> {
            (y_start..y_end)
                .map(|y| values[y * self.width + x_start..y * self.width + x_end].to_vec())
                .collect()
        };

        SubGrid {
            latitude: cut(&self.latitude),
            longitude: cut(&self.longitude),
        }
    }

    /// Coordinates of a region read at a decimated level.
    ///
    /// Level cell `i` starts at native index `i * factor`; each output cell
    /// takes the coordinates of that native cell, clamped into `index_box`.
    /// The result is exactly `shape` (`[rows, cols]`) so it lines up with
    /// the data that was read.
    pub fn subgrid_decimated(
        &self,
        index_box: &IndexBox,
        factor: usize,
        shape: [usize; 2],
    ) -> SubGrid {
        let factor = factor.max(1);
        if factor == 1 && shape == [index_box.height(), index_box.width()] {
            return self.subgrid(index_box);
        }

        let sample = |min: usize, max: usize, count: usize, limit: usize| -> Vec<usize> {
            let last = max.saturating_sub(1).min(limit.saturating_sub(1));
            let first = min / factor;
            (0..count)
                .map(|i| ((first + i) * factor).clamp(min.min(last), last))
                .collect()
        };
        let rows = sample(index_box.y_min, index_box.y_max, shape[0], self.height);
        let cols = sample(index_box.x_min, index_box.x_max, shape[1], self.width);

        let pick = |values: &[f64]| -> Vec<Vec<f64>> {
            rows.iter()
                .map(|&y| cols.iter().map(|&x| values[y * self.width + x]).collect())
                .collect()
        };

        SubGrid {
            latitude: pick(&self.latitude),
            longitude: pick(&self.longitude),
        }
    }

    /// The whole grid as nested rows.
    pub fn full(&self) -> SubGrid {
        self.subgrid(&IndexBox::new(0, self.width, 0, self.height))
    }
}

impl From<CoordinateArrays> for CoordinateGrid {
    fn from(arrays: CoordinateArrays) -> Self {
        Self {
            width: arrays.width,
            height: arrays.height,
            latitude: arrays.latitude,
            longitude: arrays.longitude,
        }
    }
}

/// Source of the coordinate grid.
pub trait CoordinateLoader: Send + Sync {
    fn load(&self) -> OceanResult<CoordinateGrid>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Loads `llc4320_latlon.nc` from a data directory.
#[derive(Debug, Clone)]
pub struct NetcdfCoordinateLoader {
    path: PathBuf,
}

impl NetcdfCoordinateLoader {
    /// Loader for the coordinate file inside `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join(COORDINATE_FILE_NAME),
        }
    }

    /// Loader for an explicit file path.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl CoordinateLoader for NetcdfCoordinateLoader {
    fn load(&self) -> OceanResult<CoordinateGrid> {
        let arrays = read_coordinates(&self.path)?;
        info!(
            path = %self.path.display(),
            height = arrays.height,
            width = arrays.width,
            "Coordinates loaded"
        );
        Ok(CoordinateGrid::from(arrays))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Serves a grid already in memory.
#[derive(Debug, Clone)]
pub struct StaticCoordinateLoader {
    grid: Arc<CoordinateGrid>,
}

impl StaticCoordinateLoader {
    pub fn new(grid: CoordinateGrid) -> Self {
        Self {
            grid: Arc::new(grid),
        }
    }
}

impl CoordinateLoader for StaticCoordinateLoader {
    fn load(&self) -> OceanResult<CoordinateGrid> {
        Ok(self.grid.as_ref().clone())
    }

    fn describe(&self) -> String {
        format!("in-memory {}x{} grid", self.grid.height, self.grid.width)
    }
}
