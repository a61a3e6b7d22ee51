//! The timestep loop.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use ocean_common::{
    DepthRange, Field, IndexBox, LatLonBox, OceanError, OceanResult, QualityLevel,
    RegionSelector,
};
use ocean_grid::{read_region, CoordinateGrid, DatasetSource, ExtractedArray, SubGrid};

/// What to extract: one field, one region, timesteps `0..timesteps`.
#[derive(Debug, Clone)]
pub struct BatchSelection {
    pub field: Field,
    pub quality: QualityLevel,
    pub timesteps: u32,
    pub bbox: LatLonBox,
    pub depth: DepthRange,
}

impl BatchSelection {
    pub fn region(&self) -> RegionSelector {
        RegionSelector::new(self.bbox, self.depth, self.quality)
    }
}

/// All timesteps stacked as `[time, depth, y, x]`, plus the `[y, x]` coordinates.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub data: ExtractedArray,
    pub index_box: IndexBox,
    pub latitude: Vec<f64>,
    pub longitude: Vec<f64>,
}

impl BatchResult {
    /// `[y, x]` shape of the data planes and the coordinate arrays.
    ///
    /// Smaller than `index_box` when a coarse quality level was read.
    pub fn grid_shape(&self) -> [usize; 2] {
        match self.data.shape() {
            [.., rows, cols] => [*rows, *cols],
            _ => [0, 0],
        }
    }
}

fn should_report(timestep: u32, total: u32) -> bool {
    timestep < 5 || (timestep + 1) % 100 == 0 || timestep + 1 == total
}

/// Read every timestep of `selection` in order and stack the results.
///
/// Any failed read or a timestep whose shape differs from the first aborts
/// the run; nothing read so far is kept. `interrupted` is checked before
/// each read and once more after the last one.
pub fn load_timesteps(
    dataset: &dyn DatasetSource,
    grid: &CoordinateGrid,
    selection: &BatchSelection,
    interrupted: &AtomicBool,
) -> OceanResult<BatchResult> {
    let region = selection.region();
    let mut parts: Vec<ExtractedArray> = Vec::with_capacity(selection.timesteps as usize);
    let mut first: Option<(Vec<usize>, IndexBox, SubGrid)> = None;

    for timestep in 0..selection.timesteps {
        if interrupted.load(Ordering::SeqCst) {
            warn!(timestep, loaded = parts.len(), "Interrupted, discarding loaded timesteps");
            return Err(OceanError::Interrupted);
        }

        let read = read_region(dataset, grid, &region, timestep)?;
        let volume = read.data.into_volume();

        match &first {
            None => {
                let mut expected = vec![selection.timesteps as usize];
                expected.extend_from_slice(volume.shape());
                let gigabytes = expected.iter().product::<usize>() as f64
                    * std::mem::size_of::<f32>() as f64
                    / 1e9;
                info!(
                    shape = ?expected,
                    size_gb = %format!("{:.3}", gigabytes),
                    "Expected output"
                );
                first = Some((volume.shape().to_vec(), read.index_box, read.coordinates));
            }
            Some((shape, _, _)) if shape.as_slice() != volume.shape() => {
                return Err(OceanError::ShapeMismatch {
                    timestep,
                    expected: shape.clone(),
                    actual: volume.shape().to_vec(),
                });
            }
            Some(_) => {}
        }

        if should_report(timestep, selection.timesteps) {
            info!(
                timestep = timestep + 1,
                total = selection.timesteps,
                "Loaded timestep"
            );
        }
        parts.push(volume);
    }

    if interrupted.load(Ordering::SeqCst) {
        warn!(loaded = parts.len(), "Interrupted after the last read, discarding");
        return Err(OceanError::Interrupted);
    }

    let (_, index_box, coordinates) = first
        .ok_or_else(|| OceanError::Internal("no timesteps requested".to_string()))?;
    let data = ExtractedArray::stack(&parts).map_err(|e| OceanError::Internal(e.to_string()))?;

    Ok(BatchResult {
        data,
        index_box,
        latitude: coordinates.latitude.concat(),
        longitude: coordinates.longitude.concat(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocean_grid::{FieldDescriptor, GridError, InMemoryDataset, LogicBox, ReadRequest};
    use test_utils::{create_regular_coordinates, known_value};

    const WIDTH: usize = 10;
    const HEIGHT: usize = 8;

    fn grid() -> CoordinateGrid {
        let (lat, lon) = create_regular_coordinates(WIDTH, HEIGHT, -45.0, 5.0, 100.0, 5.0);
        CoordinateGrid::new(lat, lon, HEIGHT, WIDTH).unwrap()
    }

    fn selection(timesteps: u32) -> BatchSelection {
        BatchSelection {
            field: Field::Salinity,
            quality: QualityLevel::DEFAULT,
            timesteps,
            bbox: LatLonBox::new(-40.0, -10.0, 105.0, 130.0),
            depth: DepthRange::new(0, 2).unwrap(),
        }
    }

    /// Returns a wider window from `grow_at` onwards.
    struct GrowingDataset {
        inner: InMemoryDataset,
        grow_at: u32,
    }

    impl DatasetSource for GrowingDataset {
        fn logic_box(&self) -> LogicBox {
            self.inner.logic_box()
        }

        fn timestep_count(&self) -> usize {
            self.inner.timestep_count()
        }

        fn field(&self) -> FieldDescriptor {
            self.inner.field()
        }

        fn read(&self, request: &ReadRequest) -> Result<ExtractedArray, GridError> {
            let mut request = request.clone();
            if request.timestep >= self.grow_at {
                request.x.end += 1;
            }
            self.inner.read(&request)
        }
    }

    #[test]
    fn test_stacks_all_timesteps() {
        let dataset = InMemoryDataset::from_fn("salt", [4, 3, HEIGHT, WIDTH], known_value);
        let result = load_timesteps(&dataset, &grid(), &selection(4), &AtomicBool::new(false))
            .unwrap();

        // lat -40..-10 -> rows 1..=7, lon 105..130 -> cols 1..=6
        assert_eq!(result.grid_shape(), [7, 6]);
        assert_eq!(result.data.shape(), &[4, 2, 7, 6]);
        assert_eq!(result.latitude.len(), 42);
        assert_eq!(result.latitude[0], -40.0);
        assert_eq!(result.longitude[5], 130.0);

        // Last timestep, z=1, first cell
        let offset = 3 * 2 * 42 + 42;
        assert_eq!(result.data.data()[offset], known_value(3, 1, 1, 1));
    }

    #[test]
    fn test_failed_timestep_aborts() {
        let dataset = InMemoryDataset::from_fn("salt", [4, 3, HEIGHT, WIDTH], known_value)
            .with_failure_at(2);
        let err = load_timesteps(&dataset, &grid(), &selection(4), &AtomicBool::new(false))
            .unwrap_err();
        assert!(matches!(err, OceanError::ReadFailed { timestep: 2, .. }));
    }

    #[test]
    fn test_shape_change_aborts() {
        let dataset = GrowingDataset {
            inner: InMemoryDataset::from_fn("salt", [4, 3, HEIGHT, WIDTH], known_value),
            grow_at: 1,
        };
        let err = load_timesteps(&dataset, &grid(), &selection(4), &AtomicBool::new(false))
            .unwrap_err();
        match err {
            OceanError::ShapeMismatch {
                timestep,
                expected,
                actual,
            } => {
                assert_eq!(timestep, 1);
                assert_eq!(expected, vec![2, 7, 6]);
                assert_eq!(actual, vec![2, 7, 7]);
            }
            other => panic!("expected shape mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_interrupt_discards_progress() {
        let dataset = InMemoryDataset::from_fn("salt", [4, 3, HEIGHT, WIDTH], known_value);
        let err = load_timesteps(&dataset, &grid(), &selection(4), &AtomicBool::new(true))
            .unwrap_err();
        assert!(matches!(err, OceanError::Interrupted));
    }

    /// Raises the interrupt flag while serving the last timestep.
    struct InterruptingDataset<'a> {
        inner: InMemoryDataset,
        flag: &'a AtomicBool,
        at: u32,
    }

    impl DatasetSource for InterruptingDataset<'_> {
        fn logic_box(&self) -> LogicBox {
            self.inner.logic_box()
        }

        fn timestep_count(&self) -> usize {
            self.inner.timestep_count()
        }

        fn field(&self) -> FieldDescriptor {
            self.inner.field()
        }

        fn read(&self, request: &ReadRequest) -> Result<ExtractedArray, GridError> {
            if request.timestep == self.at {
                self.flag.store(true, Ordering::SeqCst);
            }
            self.inner.read(request)
        }
    }

    #[test]
    fn test_interrupt_during_last_read_discards_progress() {
        let flag = AtomicBool::new(false);
        let dataset = InterruptingDataset {
            inner: InMemoryDataset::from_fn("salt", [4, 3, HEIGHT, WIDTH], known_value),
            flag: &flag,
            at: 3,
        };
        let err = load_timesteps(&dataset, &grid(), &selection(4), &flag).unwrap_err();
        assert!(matches!(err, OceanError::Interrupted));
    }

    #[test]
    fn test_coarse_level_coordinates_match_data() {
        // Reports one level cell per 2x2 native block
        struct HalvingDataset(InMemoryDataset);

        impl DatasetSource for HalvingDataset {
            fn logic_box(&self) -> LogicBox {
                self.0.logic_box()
            }

            fn timestep_count(&self) -> usize {
                self.0.timestep_count()
            }

            fn field(&self) -> FieldDescriptor {
                self.0.field()
            }

            fn read(&self, request: &ReadRequest) -> Result<ExtractedArray, GridError> {
                let mut request = request.clone();
                request.y = request.y.start / 2..request.y.end.div_ceil(2);
                request.x = request.x.start / 2..request.x.end.div_ceil(2);
                self.0.read(&request)
            }

            fn decimation(&self, _quality: QualityLevel) -> usize {
                2
            }
        }

        let dataset = HalvingDataset(InMemoryDataset::from_fn(
            "salt",
            [2, 3, HEIGHT, WIDTH],
            known_value,
        ));
        let result = load_timesteps(&dataset, &grid(), &selection(2), &AtomicBool::new(false))
            .unwrap();

        // Native rows 1..8 and cols 1..7 become level rows 0..4 and cols 0..4
        assert_eq!(result.grid_shape(), [4, 4]);
        assert_eq!(result.data.shape(), &[2, 2, 4, 4]);
        assert_eq!(result.latitude.len(), 16);
        assert_eq!(result.longitude.len(), 16);
        assert_eq!(result.index_box.height(), 7);
    }

    #[test]
    fn test_zero_timesteps() {
        let dataset = InMemoryDataset::from_fn("salt", [1, 1, HEIGHT, WIDTH], known_value);
        assert!(
            load_timesteps(&dataset, &grid(), &selection(0), &AtomicBool::new(false)).is_err()
        );
    }

    #[test]
    fn test_progress_cadence() {
        let reported: Vec<u32> = (0..250).filter(|&t| should_report(t, 250)).collect();
        assert_eq!(reported, vec![0, 1, 2, 3, 4, 99, 199, 249]);
    }
}
