//! Coordinate grid handler.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    Json,
};
use ocean_common::{query, LatLonBox, OceanResult};
use ocean_grid::CoordinatesResponse;
use serde::Deserialize;

use super::{error::ApiError, run_blocking};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CoordinatesParams {
    pub lat_min: Option<String>,
    pub lat_max: Option<String>,
    pub lon_min: Option<String>,
    pub lon_max: Option<String>,
}

impl CoordinatesParams {
    /// The requested region, only when all four bounds are given.
    ///
    /// Malformed values are rejected even when the set is incomplete.
    pub fn region(&self) -> OceanResult<Option<LatLonBox>> {
        let lat_min = parse_bound("lat_min", self.lat_min.as_deref())?;
        let lat_max = parse_bound("lat_max", self.lat_max.as_deref())?;
        let lon_min = parse_bound("lon_min", self.lon_min.as_deref())?;
        let lon_max = parse_bound("lon_max", self.lon_max.as_deref())?;

        Ok(match (lat_min, lat_max, lon_min, lon_max) {
            (Some(lat_min), Some(lat_max), Some(lon_min), Some(lon_max)) => {
                Some(LatLonBox::new(lat_min, lat_max, lon_min, lon_max))
            }
            _ => None,
        })
    }
}

fn parse_bound(name: &str, raw: Option<&str>) -> OceanResult<Option<f64>> {
    raw.map(|value| query::required(name, Some(value))).transpose()
}

/// GET /api/coordinates
pub async fn coordinates_handler(
    Extension(state): Extension<Arc<AppState>>,
    params: Result<Query<CoordinatesParams>, QueryRejection>,
) -> Result<Json<CoordinatesResponse>, ApiError> {
    let Query(params) = params?;
    let region = params.region()?;
    let coordinates = run_blocking(move || state.data_service.get_coordinates(region)).await?;
    Ok(Json(coordinates))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_bounds_fall_back_to_full_grid() {
        let params = CoordinatesParams {
            lat_min: Some("-40".into()),
            lat_max: Some("-10".into()),
            ..Default::default()
        };
        assert_eq!(params.region().unwrap(), None);
    }

    #[test]
    fn test_full_bounds() {
        let params = CoordinatesParams {
            lat_min: Some("-40".into()),
            lat_max: Some("-10".into()),
            lon_min: Some("105".into()),
            lon_max: Some("160".into()),
        };
        let region = params.region().unwrap().unwrap();
        assert_eq!(region.lon_range(), [105.0, 160.0]);
    }

    #[test]
    fn test_malformed_bound() {
        let params = CoordinatesParams {
            lat_min: Some("south".into()),
            ..Default::default()
        };
        assert!(params.region().unwrap_err().is_client_error());
    }
}
