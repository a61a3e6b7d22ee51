//! Data access service.
//!
//! [`DataService`] owns the two long-lived pieces of state: one opened
//! dataset handle per field and the coordinate grid. Both are filled lazily
//! and kept for the life of the process. Every query method is blocking and
//! safe to call from several threads at once.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use ocean_common::{
    DepthRange, Field, LatLonBox, OceanError, OceanResult, QualityLevel, RegionSelector,
    ResponseFormat, FIELD_NAMES,
};

use crate::cache::DiskChunkCache;
use crate::config::DataServiceConfig;
use crate::coords::{CoordinateGrid, CoordinateLoader, NetcdfCoordinateLoader};
use crate::dataset::{DatasetOpener, DatasetSource, ZarrDatasetOpener};
use crate::reader::read_region;
use crate::response::{
    CoordinatesResponse, Dimensions, EncodedArray, MetadataResponse, SliceResponse,
    TimestepResponse,
};

/// Parameters of a 2-D slice query.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceQuery {
    /// Field name as requested (aliases allowed).
    pub field: String,
    pub timestep: u32,
    pub depth_level: u32,
    pub bbox: LatLonBox,
    pub quality: QualityLevel,
    pub format: ResponseFormat,
}

/// Parameters of a 3-D timestep query.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestepQuery {
    /// Field name as requested (aliases allowed).
    pub field: String,
    pub timestep: u32,
    pub bbox: LatLonBox,
    pub depth: DepthRange,
    pub quality: QualityLevel,
    pub format: ResponseFormat,
}

/// Region and timestep queries over the LLC4320 fields.
pub struct DataService {
    config: DataServiceConfig,
    opener: Arc<dyn DatasetOpener>,
    coordinate_loader: Arc<dyn CoordinateLoader>,
    datasets: RwLock<HashMap<Field, Arc<dyn DatasetSource>>>,
    coordinates: RwLock<Option<Arc<CoordinateGrid>>>,
}

impl DataService {
    /// Create a service over explicit backends. The cache directory is created if missing.
    pub fn new(
        config: DataServiceConfig,
        opener: Arc<dyn DatasetOpener>,
        coordinate_loader: Arc<dyn CoordinateLoader>,
    ) -> OceanResult<Self> {
        std::fs::create_dir_all(&config.cache_dir)?;

        info!(
            coordinates = %coordinate_loader.describe(),
            cache_dir = %config.cache_dir.display(),
            "Data service ready"
        );

        Ok(Self {
            config,
            opener,
            coordinate_loader,
            datasets: RwLock::new(HashMap::new()),
            coordinates: RwLock::new(None),
        })
    }

    /// Zarr-backed service reading `llc4320_latlon.nc` from the data directory.
    pub fn from_config(config: DataServiceConfig) -> OceanResult<Self> {
        config.validate().map_err(OceanError::Internal)?;

        let cache = if config.disk_cache {
            let cache = DiskChunkCache::new(&config.cache_dir)
                .map_err(|e| OceanError::Internal(e.to_string()))?;
            Some(Arc::new(cache))
        } else {
            None
        };

        let opener = Arc::new(ZarrDatasetOpener::new(config.dataset_base_url.clone(), cache));
        let loader = Arc::new(NetcdfCoordinateLoader::new(&config.data_dir));
        Self::new(config, opener, loader)
    }

    pub fn config(&self) -> &DataServiceConfig {
        &self.config
    }

    /// Number of dataset handles opened so far.
    pub fn open_dataset_count(&self) -> usize {
        self.datasets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Handle for `field`, opening it on first use.
    ///
    /// Concurrent first requests may both open; the first handle stored wins.
    pub fn dataset(&self, field: Field) -> OceanResult<Arc<dyn DatasetSource>> {
        if let Some(dataset) = self
            .datasets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&field)
        {
            return Ok(dataset.clone());
        }

        let opened = self
            .opener
            .open(field)
            .map_err(|e| OceanError::DatasetOpen {
                field: field.to_string(),
                message: e.to_string(),
            })?;

        let mut datasets = self
            .datasets
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(datasets.entry(field).or_insert(opened).clone())
    }

    /// The coordinate grid, loaded on first use. Failed loads are retried next call.
    pub fn coordinates(&self) -> OceanResult<Arc<CoordinateGrid>> {
        if let Some(grid) = self
            .coordinates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(grid.clone());
        }

        let mut slot = self
            .coordinates
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(grid) = slot.as_ref() {
            return Ok(grid.clone());
        }

        info!(source = %self.coordinate_loader.describe(), "Loading coordinates");
        let grid = Arc::new(self.coordinate_loader.load()?);
        *slot = Some(grid.clone());
        Ok(grid)
    }

    /// Summary of a field's dataset.
    pub fn get_metadata(&self, field_name: &str) -> OceanResult<MetadataResponse> {
        let field = Field::parse(field_name)?;
        let dataset = self.dataset(field)?;
        let logic_box = dataset.logic_box();

        let field_units: BTreeMap<String, String> = Field::unit_table()
            .into_iter()
            .map(|(name, units)| (name.to_string(), units.to_string()))
            .collect();

        Ok(MetadataResponse {
            field: dataset.field().name,
            dimensions: Dimensions {
                x: logic_box.dimension(0),
                y: logic_box.dimension(1),
                z: logic_box.dimension(2),
            },
            total_timesteps: dataset.timestep_count(),
            data_type: "float32".to_string(),
            available_fields: FIELD_NAMES.iter().map(|s| s.to_string()).collect(),
            field_units,
        })
    }

    /// One depth level of one timestep as a `[y, x]` array.
    pub fn get_data_slice(&self, query: &SliceQuery) -> OceanResult<SliceResponse> {
        let field = Field::parse(&query.field)?;
        let grid = self.coordinates()?;
        let dataset = self.dataset(field)?;

        let region = RegionSelector::new(
            query.bbox,
            DepthRange::single(query.depth_level),
            query.quality,
        );
        let result = read_region(dataset.as_ref(), &grid, &region, query.timestep)?;
        let slice = result.data.into_slice();

        debug!(field = %field, timestep = query.timestep, shape = ?slice.shape(), "Slice extracted");

        Ok(SliceResponse {
            field: query.field.clone(),
            timestep: query.timestep,
            depth_level: query.depth_level,
            shape: slice.shape().to_vec(),
            data: EncodedArray::encode(&slice, query.format),
            coordinates: result.coordinates,
            lat_range: query.bbox.lat_range(),
            lon_range: query.bbox.lon_range(),
            quality: query.quality.value(),
        })
    }

    /// A depth range of one timestep as a `[depth, y, x]` array.
    pub fn get_timestep_data(&self, query: &TimestepQuery) -> OceanResult<TimestepResponse> {
        let field = Field::parse(&query.field)?;
        let grid = self.coordinates()?;
        let dataset = self.dataset(field)?;

        let region = RegionSelector::new(query.bbox, query.depth, query.quality);
        let result = read_region(dataset.as_ref(), &grid, &region, query.timestep)?;
        let volume = result.data.into_volume();

        debug!(field = %field, timestep = query.timestep, shape = ?volume.shape(), "Timestep extracted");

        Ok(TimestepResponse {
            field: query.field.clone(),
            timestep: query.timestep,
            shape: volume.shape().to_vec(),
            data: EncodedArray::encode(&volume, query.format),
            coordinates: result.coordinates,
            lat_range: query.bbox.lat_range(),
            lon_range: query.bbox.lon_range(),
            z_range: query.depth.as_pair(),
            quality: query.quality.value(),
        })
    }

    /// The full coordinate grid, or the subgrid covering `bbox`.
    pub fn get_coordinates(&self, bbox: Option<LatLonBox>) -> OceanResult<CoordinatesResponse> {
        let grid = self.coordinates()?;

        match bbox {
            Some(bbox) => {
                let index_box = grid.locate(&bbox)?;
                let mut response = CoordinatesResponse::new(grid.subgrid(&index_box));
                response.lat_range = Some(bbox.lat_range());
                response.lon_range = Some(bbox.lon_range());
                Ok(response)
            }
            None => Ok(CoordinatesResponse::new(grid.full())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::StaticCoordinateLoader;
    use crate::dataset::{InMemoryDataset, InMemoryOpener};

    fn service(opener: InMemoryOpener) -> (tempfile::TempDir, DataService) {
        let dir = tempfile::tempdir().unwrap();
        let config = DataServiceConfig {
            cache_dir: dir.path().join("cache"),
            ..Default::default()
        };
        let (h, w) = (3, 4);
        let lat = (0..h * w).map(|i| (i / w) as f64).collect();
        let lon = (0..h * w).map(|i| (i % w) as f64).collect();
        let grid = CoordinateGrid::new(lat, lon, h, w).unwrap();
        let service = DataService::new(
            config,
            Arc::new(opener),
            Arc::new(StaticCoordinateLoader::new(grid)),
        )
        .unwrap();
        (dir, service)
    }

    #[test]
    fn test_new_creates_cache_dir() {
        let (dir, _service) = service(InMemoryOpener::new());
        assert!(dir.path().join("cache").is_dir());
    }

    #[test]
    fn test_datasets_are_memoized() {
        let ds = InMemoryDataset::from_fn("salt", [1, 1, 3, 4], |_, _, _, _| 1.0);
        let opener = Arc::new(InMemoryOpener::new().with_dataset(Field::Salinity, ds));
        let dir = tempfile::tempdir().unwrap();
        let service = DataService::new(
            DataServiceConfig {
                cache_dir: dir.path().to_path_buf(),
                ..Default::default()
            },
            opener.clone(),
            Arc::new(StaticCoordinateLoader::new(
                CoordinateGrid::new(vec![0.0], vec![0.0], 1, 1).unwrap(),
            )),
        )
        .unwrap();

        service.get_metadata("salinity").unwrap();
        service.get_metadata("SALT").unwrap();
        service.dataset(Field::Salinity).unwrap();
        assert_eq!(opener.open_count(), 1);
        assert_eq!(service.open_dataset_count(), 1);
    }

    #[test]
    fn test_open_failure_is_server_error() {
        let (_dir, service) = service(InMemoryOpener::new());
        let err = service.get_metadata("theta").unwrap_err();
        assert!(matches!(err, OceanError::DatasetOpen { .. }));
        assert_eq!(err.http_status_code(), 500);
    }

    #[test]
    fn test_unknown_field_is_client_error() {
        let (_dir, service) = service(InMemoryOpener::new());
        let err = service.get_metadata("density").unwrap_err();
        assert!(matches!(err, OceanError::UnknownField { .. }));
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_coordinates_full_and_region() {
        let (_dir, service) = service(InMemoryOpener::new());

        let full = service.get_coordinates(None).unwrap();
        assert_eq!(full.shape, [3, 4]);
        assert!(full.lat_range.is_none());

        let region = service
            .get_coordinates(Some(LatLonBox::new(1.0, 2.0, 2.0, 3.0)))
            .unwrap();
        assert_eq!(region.shape, [2, 2]);
        assert_eq!(region.lat_range, Some([1.0, 2.0]));
        assert_eq!(region.latitude, vec![vec![1.0, 1.0], vec![2.0, 2.0]]);
    }
}
