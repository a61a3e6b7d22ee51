//! Region extraction handlers: 2D slices and 3D timestep volumes.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    Json,
};
use ocean_common::{query, DepthRange, OceanResult, QualityLevel, ResponseFormat};
use ocean_grid::{SliceQuery, SliceResponse, TimestepQuery, TimestepResponse};
use serde::Deserialize;
use tracing::debug;

use super::{error::ApiError, required_bbox, run_blocking};
use crate::state::AppState;

const DEFAULT_FIELD: &str = "salinity";

/// Raw query parameters of `/api/data/slice`.
#[derive(Debug, Default, Deserialize)]
pub struct SliceParams {
    pub field: Option<String>,
    pub timestep: Option<String>,
    pub depth_level: Option<String>,
    pub lat_min: Option<String>,
    pub lat_max: Option<String>,
    pub lon_min: Option<String>,
    pub lon_max: Option<String>,
    pub quality: Option<String>,
    pub format: Option<String>,
}

impl SliceParams {
    pub fn to_query(&self) -> OceanResult<SliceQuery> {
        Ok(SliceQuery {
            field: self.field.clone().unwrap_or_else(|| DEFAULT_FIELD.to_string()),
            timestep: query::optional("timestep", self.timestep.as_deref(), 0)?,
            depth_level: query::optional("depth_level", self.depth_level.as_deref(), 0)?,
            bbox: required_bbox(
                self.lat_min.as_deref(),
                self.lat_max.as_deref(),
                self.lon_min.as_deref(),
                self.lon_max.as_deref(),
            )?,
            quality: parse_quality(self.quality.as_deref())?,
            format: parse_format(self.format.as_deref()),
        })
    }
}

/// Raw query parameters of `/api/data/timestep`.
#[derive(Debug, Default, Deserialize)]
pub struct TimestepParams {
    pub field: Option<String>,
    pub timestep: Option<String>,
    pub z_min: Option<String>,
    pub z_max: Option<String>,
    pub lat_min: Option<String>,
    pub lat_max: Option<String>,
    pub lon_min: Option<String>,
    pub lon_max: Option<String>,
    pub quality: Option<String>,
    pub format: Option<String>,
}

impl TimestepParams {
    pub fn to_query(&self) -> OceanResult<TimestepQuery> {
        let z_min = query::optional("z_min", self.z_min.as_deref(), 0)?;
        let z_max = query::optional("z_max", self.z_max.as_deref(), 1)?;

        Ok(TimestepQuery {
            field: self.field.clone().unwrap_or_else(|| DEFAULT_FIELD.to_string()),
            timestep: query::optional("timestep", self.timestep.as_deref(), 0)?,
            bbox: required_bbox(
                self.lat_min.as_deref(),
                self.lat_max.as_deref(),
                self.lon_min.as_deref(),
                self.lon_max.as_deref(),
            )?,
            depth: DepthRange::new(z_min, z_max)?,
            quality: parse_quality(self.quality.as_deref())?,
            format: parse_format(self.format.as_deref()),
        })
    }
}

fn parse_quality(raw: Option<&str>) -> OceanResult<QualityLevel> {
    query::optional("quality", raw, QualityLevel::DEFAULT.value()).map(QualityLevel)
}

fn parse_format(raw: Option<&str>) -> ResponseFormat {
    raw.map(ResponseFormat::parse).unwrap_or_default()
}

/// GET /api/data/slice
pub async fn slice_handler(
    Extension(state): Extension<Arc<AppState>>,
    params: Result<Query<SliceParams>, QueryRejection>,
) -> Result<Json<SliceResponse>, ApiError> {
    let Query(params) = params?;
    let query = params.to_query()?;
    debug!(
        field = %query.field,
        timestep = query.timestep,
        depth_level = query.depth_level,
        quality = %query.quality,
        "Slice request"
    );

    let slice = run_blocking(move || state.data_service.get_data_slice(&query)).await?;
    Ok(Json(slice))
}

/// GET /api/data/timestep
pub async fn timestep_handler(
    Extension(state): Extension<Arc<AppState>>,
    params: Result<Query<TimestepParams>, QueryRejection>,
) -> Result<Json<TimestepResponse>, ApiError> {
    let Query(params) = params?;
    let query = params.to_query()?;
    debug!(
        field = %query.field,
        timestep = query.timestep,
        depth = ?query.depth.as_pair(),
        quality = %query.quality,
        "Timestep request"
    );

    let volume = run_blocking(move || state.data_service.get_timestep_data(&query)).await?;
    Ok(Json(volume))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocean_common::OceanError;

    fn australia() -> SliceParams {
        SliceParams {
            lat_min: Some("-40".into()),
            lat_max: Some("-10".into()),
            lon_min: Some("105".into()),
            lon_max: Some("160".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_slice_defaults() {
        let query = australia().to_query().unwrap();
        assert_eq!(query.field, "salinity");
        assert_eq!(query.timestep, 0);
        assert_eq!(query.depth_level, 0);
        assert_eq!(query.quality, QualityLevel(-12));
        assert_eq!(query.format, ResponseFormat::Array);
        assert_eq!(query.bbox.lat_range(), [-40.0, -10.0]);
    }

    #[test]
    fn test_slice_missing_bound() {
        let mut params = australia();
        params.lon_max = None;
        let err = params.to_query().unwrap_err();
        assert!(matches!(err, OceanError::MissingParameter(ref p) if p == "lon_max"));
        assert!(err.client_message().starts_with("Invalid parameter:"));
    }

    #[test]
    fn test_slice_malformed_values() {
        let mut params = australia();
        params.timestep = Some("abc".into());
        assert!(params.to_query().unwrap_err().is_client_error());

        let mut params = australia();
        params.format = Some("base64".into());
        assert_eq!(params.to_query().unwrap().format, ResponseFormat::Base64);
    }

    #[test]
    fn test_unrecognised_format_falls_back_to_array() {
        for format in ["csv", "BASE64", "Base64", " base64"] {
            let mut params = australia();
            params.format = Some(format.into());
            assert_eq!(params.to_query().unwrap().format, ResponseFormat::Array, "{}", format);
        }
    }

    #[test]
    fn test_timestep_depth_range() {
        let params = TimestepParams {
            lat_min: Some("-40".into()),
            lat_max: Some("-10".into()),
            lon_min: Some("105".into()),
            lon_max: Some("160".into()),
            z_min: Some("2".into()),
            z_max: Some("5".into()),
            ..Default::default()
        };
        assert_eq!(params.to_query().unwrap().depth.as_pair(), [2, 5]);

        let params = TimestepParams {
            z_min: Some("3".into()),
            z_max: Some("3".into()),
            ..params
        };
        assert!(params.to_query().unwrap_err().is_client_error());
    }
}
