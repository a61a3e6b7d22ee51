//! Reader for the LLC4320 latitude/longitude coordinate file.
//!
//! The LLC4320 grid is curvilinear: every `(y, x)` cell has its own latitude
//! and longitude. Both grids live in `llc4320_latlon.nc` as 2-D variables and
//! are loaded whole into memory.

pub mod error;
pub mod native;

pub use error::{CoordsError, CoordsResult};
pub use native::{read_coordinates, silence_hdf5_errors, write_coordinates};

/// Name of the coordinate file inside the data directory.
pub const COORDINATE_FILE_NAME: &str = "llc4320_latlon.nc";

/// Row-major `(y, x)` latitude and longitude grids of equal shape.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateArrays {
    pub latitude: Vec<f64>,
    pub longitude: Vec<f64>,
    pub height: usize,
    pub width: usize,
}

impl CoordinateArrays {
    /// Build from flat grids, checking both match `height * width`.
    pub fn new(
        latitude: Vec<f64>,
        longitude: Vec<f64>,
        height: usize,
        width: usize,
    ) -> CoordsResult<Self> {
        let arrays = Self {
            latitude,
            longitude,
            height,
            width,
        };
        arrays.validate()?;
        Ok(arrays)
    }

    /// Number of grid cells.
    pub fn len(&self) -> usize {
        self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(&self) -> CoordsResult<()> {
        let expected = self.len();
        if self.latitude.len() != expected || self.longitude.len() != expected {
            return Err(CoordsError::InvalidFormat(format!(
                "expected {} values for a {}x{} grid, got {} latitudes and {} longitudes",
                expected,
                self.height,
                self.width,
                self.latitude.len(),
                self.longitude.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocean_common::OceanError;
    use std::path::PathBuf;

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = CoordinateArrays::new(vec![0.0; 5], vec![0.0; 6], 2, 3).unwrap_err();
        assert!(matches!(err, CoordsError::InvalidFormat(_)));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let path = PathBuf::from("/nonexistent/dir/llc4320_latlon.nc");
        let err = read_coordinates(&path).unwrap_err();
        assert!(matches!(err, CoordsError::NotFound(ref p) if *p == path));

        let ocean: OceanError = err.into();
        assert!(matches!(ocean, OceanError::CoordinateFileMissing(_)));
        assert!(ocean.to_string().contains("llc4320_latlon.nc"));
    }

    #[test]
    fn test_round_trip_through_netcdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(COORDINATE_FILE_NAME);

        let (height, width) = (3, 4);
        let latitude: Vec<f64> = (0..height * width).map(|i| -40.0 + i as f64).collect();
        let longitude: Vec<f64> = (0..height * width).map(|i| 100.0 + 2.0 * i as f64).collect();
        let coords = CoordinateArrays::new(latitude, longitude, height, width).unwrap();

        write_coordinates(&path, &coords).unwrap();
        let loaded = read_coordinates(&path).unwrap();

        assert_eq!(loaded, coords);
    }

    #[test]
    fn test_file_without_longitude_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.nc");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("y", 2).unwrap();
            file.add_dimension("x", 2).unwrap();
            let mut var = file.add_variable::<f64>("latitude", &["y", "x"]).unwrap();
            var.put_values(&[1.0f64, 2.0, 3.0, 4.0][..], ..).unwrap();
        }

        let err = read_coordinates(&path).unwrap_err();
        assert!(matches!(err, CoordsError::MissingVariable(ref v) if v == "longitude"));
    }
}
