//! JSON response bodies.
//!
//! Array payloads come in two shapes and clients must branch on `format`:
//!
//! ```text
//! {"format": "array",  "data": [[...], ...]}
//! {"format": "base64", "dtype": "float32", "shape": [ny, nx], "data": "AACAPw=="}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ocean_common::ResponseFormat;

use crate::coords::SubGrid;
use crate::error::Result;
use crate::types::ExtractedArray;

/// An extracted array encoded for transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum EncodedArray {
    /// Nested JSON lists; NaN is `null`.
    Array { data: serde_json::Value },
    /// Raw float32 bytes, base64 encoded.
    Base64 {
        dtype: String,
        shape: Vec<usize>,
        data: String,
    },
}

impl EncodedArray {
    pub fn encode(array: &ExtractedArray, format: ResponseFormat) -> Self {
        match format {
            ResponseFormat::Array => EncodedArray::Array {
                data: array.to_nested_json(),
            },
            ResponseFormat::Base64 => EncodedArray::Base64 {
                dtype: "float32".to_string(),
                shape: array.shape().to_vec(),
                data: array.to_base64(),
            },
        }
    }

    /// Decode a base64 payload back into an array. Array payloads return `None`.
    pub fn decode_base64(&self) -> Option<Result<ExtractedArray>> {
        match self {
            EncodedArray::Base64 { shape, data, .. } => {
                Some(ExtractedArray::from_base64(shape.clone(), data))
            }
            EncodedArray::Array { .. } => None,
        }
    }
}

/// Body of `/api/data/slice`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceResponse {
    /// Field name as requested.
    pub field: String,
    pub timestep: u32,
    pub depth_level: u32,
    pub data: EncodedArray,
    pub coordinates: SubGrid,
    /// `[y, x]`
    pub shape: Vec<usize>,
    pub lat_range: [f64; 2],
    pub lon_range: [f64; 2],
    pub quality: i32,
}

/// Body of `/api/data/timestep`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestepResponse {
    /// Field name as requested.
    pub field: String,
    pub timestep: u32,
    pub data: EncodedArray,
    pub coordinates: SubGrid,
    /// `[depth, y, x]`
    pub shape: Vec<usize>,
    pub lat_range: [f64; 2],
    pub lon_range: [f64; 2],
    pub z_range: [u32; 2],
    pub quality: i32,
}

/// Native extent of a dataset. Missing axes are `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub x: Option<u64>,
    pub y: Option<u64>,
    pub z: Option<u64>,
}

/// Body of `/api/metadata`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataResponse {
    pub field: String,
    pub dimensions: Dimensions,
    pub total_timesteps: usize,
    pub data_type: String,
    pub available_fields: Vec<String>,
    pub field_units: BTreeMap<String, String>,
}

/// Body of `/api/coordinates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatesResponse {
    pub latitude: Vec<Vec<f64>>,
    pub longitude: Vec<Vec<f64>>,
    /// `[y, x]`
    pub shape: [usize; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat_range: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon_range: Option<[f64; 2]>,
}

impl CoordinatesResponse {
    pub fn new(grid: SubGrid) -> Self {
        let shape = [
            grid.latitude.len(),
            grid.latitude.first().map_or(0, Vec::len),
        ];
        Self {
            latitude: grid.latitude,
            longitude: grid.longitude,
            shape,
            lat_range: None,
            lon_range: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn array() -> ExtractedArray {
        ExtractedArray::new(vec![2, 2], vec![1.0, f32::NAN, 3.5, -2.0]).unwrap()
    }

    #[test]
    fn test_array_format_json() {
        let encoded = EncodedArray::encode(&array(), ResponseFormat::Array);
        assert_eq!(
            serde_json::to_value(&encoded).unwrap(),
            json!({"format": "array", "data": [[1.0, null], [3.5, -2.0]]})
        );
    }

    #[test]
    fn test_base64_format_json() {
        let one = ExtractedArray::new(vec![1], vec![1.0]).unwrap();
        let encoded = EncodedArray::encode(&one, ResponseFormat::Base64);
        assert_eq!(
            serde_json::to_value(&encoded).unwrap(),
            json!({"format": "base64", "dtype": "float32", "shape": [1], "data": "AACAPw=="})
        );
    }

    #[test]
    fn test_base64_decodes_to_array_values() {
        let original = array();
        let encoded = EncodedArray::encode(&original, ResponseFormat::Base64);
        let decoded = encoded.decode_base64().unwrap().unwrap();
        assert_eq!(decoded.shape(), original.shape());
        assert_eq!(decoded.to_nested_json(), original.to_nested_json());

        assert!(EncodedArray::encode(&original, ResponseFormat::Array)
            .decode_base64()
            .is_none());
    }

    #[test]
    fn test_coordinates_response_shape() {
        let response = CoordinatesResponse::new(SubGrid {
            latitude: vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
            longitude: vec![vec![0.0; 3], vec![0.0; 3]],
        });
        assert_eq!(response.shape, [2, 3]);

        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("lat_range").is_none());
    }
}
