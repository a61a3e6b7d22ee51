//! Query parameter value types and parsing helpers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OceanError, OceanResult};

/// Decoding resolution selector. More negative is coarser and faster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityLevel(pub i32);

impl QualityLevel {
    /// Default used by the API and the batch loader.
    pub const DEFAULT: QualityLevel = QualityLevel(-12);

    pub fn value(&self) -> i32 {
        self.0
    }

    /// Pyramid level to read for a store holding `levels` levels.
    ///
    /// Every two quality steps halve x and y once. Non-negative values read
    /// the native level; anything coarser than the store clamps to its last level.
    pub fn pyramid_level(&self, levels: usize) -> usize {
        if self.0 >= 0 || levels == 0 {
            return 0;
        }
        let wanted = (self.0.unsigned_abs() / 2) as usize;
        wanted.min(levels - 1)
    }
}

impl Default for QualityLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload encoding for extracted arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Nested JSON lists of numbers.
    #[default]
    Array,
    /// Base64 of the raw float32 buffer plus shape.
    Base64,
}

impl ResponseFormat {
    /// Exactly `base64` selects base64; any other value means array.
    pub fn parse(value: &str) -> Self {
        match value {
            "base64" => ResponseFormat::Base64,
            _ => ResponseFormat::Array,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Array => "array",
            ResponseFormat::Base64 => "base64",
        }
    }
}

/// Parse a required query parameter.
pub fn required<T>(name: &str, raw: Option<&str>) -> OceanResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw {
        Some(value) => parse_value(name, value),
        None => Err(OceanError::MissingParameter(name.to_string())),
    }
}

/// Parse an optional query parameter, falling back to `default` when absent.
pub fn optional<T>(name: &str, raw: Option<&str>, default: T) -> OceanResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw {
        Some(value) => parse_value(name, value),
        None => Ok(default),
    }
}

fn parse_value<T>(name: &str, value: &str) -> OceanResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| OceanError::invalid_parameter(name, value, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pyramid_level_mapping() {
        assert_eq!(QualityLevel(0).pyramid_level(8), 0);
        assert_eq!(QualityLevel(3).pyramid_level(8), 0);
        assert_eq!(QualityLevel(-1).pyramid_level(8), 0);
        assert_eq!(QualityLevel(-2).pyramid_level(8), 1);
        assert_eq!(QualityLevel(-12).pyramid_level(8), 6);
        assert_eq!(QualityLevel(-12).pyramid_level(3), 2);
        assert_eq!(QualityLevel(-12).pyramid_level(1), 0);
    }

    #[test]
    fn test_response_format_parse() {
        assert_eq!(ResponseFormat::parse("array"), ResponseFormat::Array);
        assert_eq!(ResponseFormat::parse("base64"), ResponseFormat::Base64);
        // Unknown values and other spellings fall back to array
        assert_eq!(ResponseFormat::parse("png"), ResponseFormat::Array);
        assert_eq!(ResponseFormat::parse("BASE64"), ResponseFormat::Array);
        assert_eq!(ResponseFormat::parse(""), ResponseFormat::Array);
    }

    #[test]
    fn test_required_and_optional() {
        let v: f64 = required("lat_min", Some("-40")).unwrap();
        assert_eq!(v, -40.0);

        let err = required::<f64>("lat_min", None).unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter: lat_min");

        let err = required::<f64>("lat_max", Some("north")).unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("lat_max"));

        let q: i32 = optional("quality", None, -12).unwrap();
        assert_eq!(q, -12);
        assert!(optional::<u32>("timestep", Some("-1"), 0).is_err());
    }
}
