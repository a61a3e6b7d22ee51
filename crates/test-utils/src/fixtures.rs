//! Common test fixtures for LLC4320 tests.

/// Lat/lon boxes as `(lat_min, lat_max, lon_min, lon_max)`.
pub mod bbox {
    /// Australian region used by the batch loader and the frontend default view.
    pub const AUSTRALIA: (f64, f64, f64, f64) = (-40.0, -10.0, 105.0, 160.0);

    /// Inverted box (min > max), never matches a cell.
    pub const INVERTED: (f64, f64, f64, f64) = (10.0, 5.0, 20.0, 15.0);
}

/// Dataset dimensions.
pub mod llc4320 {
    /// Hourly snapshots available per field.
    pub const NUM_TIMESTEPS: usize = 10312;

    /// Vertical levels.
    pub const DEPTH_LEVELS: usize = 90;

    /// Names accepted by the `field` parameter.
    pub const FIELD_NAMES: [&str; 6] = [
        "salinity",
        "temperature",
        "vertical_velocity",
        "salt",
        "theta",
        "w",
    ];
}

/// Query strings for API tests.
pub mod queries {
    /// Builds `lat_min=..&lat_max=..&lon_min=..&lon_max=..`.
    pub fn bbox_query(bbox: (f64, f64, f64, f64)) -> String {
        format!(
            "lat_min={}&lat_max={}&lon_min={}&lon_max={}",
            bbox.0, bbox.1, bbox.2, bbox.3
        )
    }

    /// `/api/data/slice` URI for `bbox` plus extra `key=value` pairs.
    pub fn slice_uri(bbox: (f64, f64, f64, f64), extra: &[(&str, &str)]) -> String {
        with_extra(format!("/api/data/slice?{}", bbox_query(bbox)), extra)
    }

    /// `/api/data/timestep` URI for `bbox` plus extra `key=value` pairs.
    pub fn timestep_uri(bbox: (f64, f64, f64, f64), extra: &[(&str, &str)]) -> String {
        with_extra(format!("/api/data/timestep?{}", bbox_query(bbox)), extra)
    }

    fn with_extra(mut uri: String, extra: &[(&str, &str)]) -> String {
        for (key, value) in extra {
            uri.push('&');
            uri.push_str(key);
            uri.push('=');
            uri.push_str(value);
        }
        uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_query() {
        assert_eq!(
            queries::bbox_query(bbox::AUSTRALIA),
            "lat_min=-40&lat_max=-10&lon_min=105&lon_max=160"
        );
    }

    #[test]
    fn test_slice_uri() {
        let uri = queries::slice_uri(bbox::INVERTED, &[("field", "salt"), ("format", "base64")]);
        assert_eq!(
            uri,
            "/api/data/slice?lat_min=10&lat_max=5&lon_min=20&lon_max=15&field=salt&format=base64"
        );
    }
}
