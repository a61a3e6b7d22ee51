//! Core types for dataset reads.

use std::ops::Range;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use ocean_common::{DepthRange, QualityLevel};

use crate::error::{GridError, Result};

/// Native index extent of a dataset, as `[x, y, z]` corners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicBox {
    pub lower: Vec<u64>,
    pub upper: Vec<u64>,
}

impl LogicBox {
    /// Box starting at the origin with the given `[x, y, z]` extents.
    pub fn from_extents(extents: Vec<u64>) -> Self {
        Self {
            lower: vec![0; extents.len()],
            upper: extents,
        }
    }

    /// Upper bound along `axis` (0 = x, 1 = y, 2 = z), if the box has that axis.
    pub fn dimension(&self, axis: usize) -> Option<u64> {
        self.upper.get(axis).copied()
    }
}

/// Name and element type of the variable a dataset serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub dtype: String,
}

impl FieldDescriptor {
    pub fn float32(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dtype: "float32".to_string(),
        }
    }
}

/// One read: a single timestep, a native-resolution index box and a depth range.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadRequest {
    pub timestep: u32,
    pub x: Range<u64>,
    pub y: Range<u64>,
    pub z: DepthRange,
    pub quality: QualityLevel,
}

/// A dense float32 array in row-major order.
///
/// Reads return `[depth, y, x]` or `[time, depth, y, x]` depending on the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedArray {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl ExtractedArray {
    /// Wrap a buffer, checking it holds exactly `shape.product()` values.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(GridError::ShapeMismatch {
                shape,
                len: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Select `index` along the leading axis, dropping that axis.
    pub fn index_axis0(&self, index: usize) -> Option<ExtractedArray> {
        let (&outer, inner) = self.shape.split_first()?;
        if index >= outer {
            return None;
        }
        let stride: usize = inner.iter().product();
        let start = index * stride;
        Some(ExtractedArray {
            shape: inner.to_vec(),
            data: self.data[start..start + stride].to_vec(),
        })
    }

    /// Reduce a read to a 2-D `(y, x)` slice.
    ///
    /// `(time, z, y, x)` keeps `[0, 0]`, `(z, y, x)` keeps `[0]`; anything else
    /// is returned unchanged.
    pub fn into_slice(self) -> ExtractedArray {
        match self.ndim() {
            4 => self
                .index_axis0(0)
                .and_then(|volume| volume.index_axis0(0))
                .unwrap_or(self),
            3 => self.index_axis0(0).unwrap_or(self),
            _ => self,
        }
    }

    /// Drop the time axis of a `(time, z, y, x)` read; other shapes are returned unchanged.
    pub fn into_volume(self) -> ExtractedArray {
        if self.ndim() == 4 {
            self.index_axis0(0).unwrap_or(self)
        } else {
            self
        }
    }

    /// Stack equally shaped arrays along a new leading axis.
    pub fn stack(parts: &[ExtractedArray]) -> Result<ExtractedArray> {
        let first = parts
            .first()
            .ok_or_else(|| GridError::read_failed("nothing to stack"))?;

        let mut data = Vec::with_capacity(first.len() * parts.len());
        for part in parts {
            if part.shape != first.shape {
                return Err(GridError::ShapeMismatch {
                    shape: first.shape.clone(),
                    len: part.len(),
                });
            }
            data.extend_from_slice(&part.data);
        }

        let mut shape = Vec::with_capacity(first.ndim() + 1);
        shape.push(parts.len());
        shape.extend_from_slice(&first.shape);
        Ok(ExtractedArray { shape, data })
    }

    /// Nested JSON lists following the shape. NaN becomes `null`.
    pub fn to_nested_json(&self) -> serde_json::Value {
        if self.shape.is_empty() {
            return self
                .data
                .first()
                .map(|v| f32_to_json(*v))
                .unwrap_or(serde_json::Value::Null);
        }
        nest(&self.shape, &self.data)
    }

    /// Standard base64 (with padding) of the native-endian float32 buffer.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(bytemuck::cast_slice::<f32, u8>(&self.data))
    }

    /// Inverse of [`ExtractedArray::to_base64`].
    pub fn from_base64(shape: Vec<usize>, encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| GridError::read_failed(format!("invalid base64 payload: {}", e)))?;
        if bytes.len() % std::mem::size_of::<f32>() != 0 {
            return Err(GridError::read_failed(format!(
                "payload of {} bytes is not a float32 buffer",
                bytes.len()
            )));
        }
        let data: Vec<f32> = bytemuck::pod_collect_to_vec(&bytes);
        Self::new(shape, data)
    }
}

fn f32_to_json(v: f32) -> serde_json::Value {
    serde_json::Number::from_f64(v as f64)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn nest(shape: &[usize], data: &[f32]) -> serde_json::Value {
    match shape {
        [] => serde_json::Value::Null,
        [_] => serde_json::Value::Array(data.iter().map(|v| f32_to_json(*v)).collect()),
        [outer, inner @ ..] => {
            let stride: usize = inner.iter().product();
            let rows = (0..*outer)
                .map(|i| nest(inner, &data[i * stride..(i + 1) * stride]))
                .collect();
            serde_json::Value::Array(rows)
        }
    }
}
