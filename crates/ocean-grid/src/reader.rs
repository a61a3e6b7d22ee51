//! Single-field region reads.

use tracing::debug;

use ocean_common::{IndexBox, OceanError, OceanResult, RegionSelector};

use crate::coords::{CoordinateGrid, SubGrid};
use crate::dataset::DatasetSource;
use crate::types::{ExtractedArray, ReadRequest};

/// One timestep cut out of a dataset, with the coordinates it covers.
#[derive(Debug, Clone)]
pub struct RegionData {
    pub data: ExtractedArray,
    pub coordinates: SubGrid,
    pub index_box: IndexBox,
}

/// Read `region` at `timestep`.
///
/// The lat/lon box is located on `grid` afresh on every call. Backend
/// failures come back as [`OceanError::ReadFailed`] for `timestep`.
pub fn read_region(
    dataset: &dyn DatasetSource,
    grid: &CoordinateGrid,
    region: &RegionSelector,
    timestep: u32,
) -> OceanResult<RegionData> {
    let index_box = grid.locate(&region.bbox)?;

    let request = ReadRequest {
        timestep,
        x: index_box.x_min as u64..index_box.x_max as u64,
        y: index_box.y_min as u64..index_box.y_max as u64,
        z: region.depth,
        quality: region.quality,
    };

    let data = dataset
        .read(&request)
        .map_err(|e| OceanError::read_failed(timestep, e))?;

    // Coarse levels return fewer rows and columns than the native box
    let factor = dataset.decimation(region.quality);
    let plane = match data.shape() {
        [.., rows, cols] => [*rows, *cols],
        _ => [index_box.height(), index_box.width()],
    };
    let coordinates = grid.subgrid_decimated(&index_box, factor, plane);

    debug!(
        timestep,
        factor,
        shape = ?data.shape(),
        index_box = ?index_box,
        "Region read"
    );

    Ok(RegionData {
        data,
        coordinates,
        index_box,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::InMemoryDataset;
    use ocean_common::{DepthRange, LatLonBox, QualityLevel};

    fn grid() -> CoordinateGrid {
        // 3 rows x 4 cols, lat = row * 10, lon = 100 + col * 10
        let (h, w) = (3, 4);
        let lat = (0..h * w).map(|i| (i / w) as f64 * 10.0).collect();
        let lon = (0..h * w).map(|i| 100.0 + (i % w) as f64 * 10.0).collect();
        CoordinateGrid::new(lat, lon, h, w).unwrap()
    }

    #[test]
    fn test_read_region() {
        let ds = InMemoryDataset::from_fn("salt", [2, 2, 3, 4], |t, z, y, x| {
            (t * 1000 + z * 100 + y * 10 + x) as f32
        });
        let region = RegionSelector::new(
            LatLonBox::new(10.0, 20.0, 110.0, 120.0),
            DepthRange::single(1),
            QualityLevel::DEFAULT,
        );

        let result = read_region(&ds, &grid(), &region, 1).unwrap();
        assert_eq!(result.index_box, IndexBox::new(1, 3, 1, 3));
        assert_eq!(result.data.shape(), &[1, 2, 2]);
        assert_eq!(result.data.data(), &[1111.0, 1112.0, 1121.0, 1122.0]);
        assert_eq!(result.coordinates.latitude, vec![vec![10.0, 10.0], vec![20.0, 20.0]]);
        assert_eq!(result.coordinates.longitude[0], vec![110.0, 120.0]);
    }

    #[test]
    fn test_read_failure_carries_timestep() {
        let ds = InMemoryDataset::from_fn("salt", [3, 1, 3, 4], |_, _, _, _| 0.0)
            .with_failure_at(2);
        let region = RegionSelector::new(
            LatLonBox::new(0.0, 20.0, 100.0, 130.0),
            DepthRange::default(),
            QualityLevel::DEFAULT,
        );

        assert!(read_region(&ds, &grid(), &region, 1).is_ok());
        let err = read_region(&ds, &grid(), &region, 2).unwrap_err();
        assert!(matches!(err, OceanError::ReadFailed { timestep: 2, .. }));
        assert_eq!(err.http_status_code(), 500);
    }

    #[test]
    fn test_empty_region_is_not_a_read_error() {
        let ds = InMemoryDataset::from_fn("salt", [1, 1, 3, 4], |_, _, _, _| 0.0);
        let region = RegionSelector::new(
            LatLonBox::new(-50.0, -40.0, 100.0, 130.0),
            DepthRange::default(),
            QualityLevel::DEFAULT,
        );
        let err = read_region(&ds, &grid(), &region, 0).unwrap_err();
        assert!(matches!(err, OceanError::EmptyRegion));
    }
}
