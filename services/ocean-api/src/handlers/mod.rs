//! HTTP request handlers.

pub mod coordinates;
pub mod data;
pub mod error;
pub mod health;
pub mod metadata;

use ocean_common::{query, LatLonBox, OceanError, OceanResult};

use self::error::ApiError;

/// Run a blocking data service call off the async workers.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> OceanResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| OceanError::Internal(format!("Worker task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// Parse the four required bounding-box parameters.
pub(crate) fn required_bbox(
    lat_min: Option<&str>,
    lat_max: Option<&str>,
    lon_min: Option<&str>,
    lon_max: Option<&str>,
) -> OceanResult<LatLonBox> {
    Ok(LatLonBox::new(
        query::required("lat_min", lat_min)?,
        query::required("lat_max", lat_max)?,
        query::required("lon_min", lon_min)?,
        query::required("lon_max", lon_max)?,
    ))
}
