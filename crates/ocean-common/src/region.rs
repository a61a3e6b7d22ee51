//! Region selection types.

use serde::{Deserialize, Serialize};

use crate::error::{OceanError, OceanResult};
use crate::query::QualityLevel;

/// A latitude/longitude box in degrees. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLonBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl LatLonBox {
    /// Create a new box from its lat and lon ranges.
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Check if a grid point lies in the box (inclusive on every edge).
    ///
    /// NaN coordinates never match.
    #[inline]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }

    /// `[lat_min, lat_max]`, as echoed in responses.
    pub fn lat_range(&self) -> [f64; 2] {
        [self.lat_min, self.lat_max]
    }

    /// `[lon_min, lon_max]`, as echoed in responses.
    pub fn lon_range(&self) -> [f64; 2] {
        [self.lon_min, self.lon_max]
    }
}

/// A half-open index rectangle over the native (y, x) grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexBox {
    pub x_min: usize,
    pub x_max: usize,
    pub y_min: usize,
    pub y_max: usize,
}

impl IndexBox {
    pub fn new(x_min: usize, x_max: usize, y_min: usize, y_max: usize) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.x_max.saturating_sub(self.x_min)
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.y_max.saturating_sub(self.y_min)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// A half-open range of depth level indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthRange {
    pub start: u32,
    pub end: u32,
}

impl DepthRange {
    /// Build a range, rejecting empty or inverted ones.
    pub fn new(start: u32, end: u32) -> OceanResult<Self> {
        if end <= start {
            return Err(OceanError::invalid_parameter(
                "z_max",
                end.to_string(),
                format!("must be greater than z_min ({})", start),
            ));
        }
        Ok(Self { start, end })
    }

    /// The single level `[level, level + 1)`.
    pub fn single(level: u32) -> Self {
        Self {
            start: level,
            end: level.saturating_add(1),
        }
    }

    /// Number of levels covered.
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// `[start, end]`, as echoed in responses.
    pub fn as_pair(&self) -> [u32; 2] {
        [self.start, self.end]
    }
}

impl Default for DepthRange {
    fn default() -> Self {
        Self::single(0)
    }
}

/// Everything needed to cut one region out of a dataset, minus the timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSelector {
    pub bbox: LatLonBox,
    pub depth: DepthRange,
    pub quality: QualityLevel,
}

impl RegionSelector {
    pub fn new(bbox: LatLonBox, depth: DepthRange, quality: QualityLevel) -> Self {
        Self {
            bbox,
            depth,
            quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_inclusive_bounds() {
        let bbox = LatLonBox::new(-40.0, -10.0, 105.0, 160.0);
        assert!(bbox.contains(-40.0, 105.0));
        assert!(bbox.contains(-10.0, 160.0));
        assert!(!bbox.contains(-40.0001, 105.0));
        assert!(!bbox.contains(f64::NAN, 120.0));
    }

    #[test]
    fn test_depth_range() {
        assert_eq!(DepthRange::single(4).as_pair(), [4, 5]);
        assert_eq!(DepthRange::new(0, 10).unwrap().len(), 10);
        assert!(DepthRange::new(3, 3).is_err());
        assert!(DepthRange::new(5, 2).is_err());
    }

    #[test]
    fn test_index_box_dims() {
        let b = IndexBox::new(2, 7, 1, 4);
        assert_eq!(b.width(), 5);
        assert_eq!(b.height(), 3);
        assert!(!b.is_empty());
        assert!(IndexBox::new(3, 3, 0, 1).is_empty());
    }
}
