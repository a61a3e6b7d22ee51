//! Downsampling functions for generating pyramid levels.
//!
//! Grids are halved along y and x, rounding up so edge rows and columns are
//! kept. Land cells are NaN and never contribute to a mean or max.

use serde::{Deserialize, Serialize};

/// Method used to downsample grid data.
///
/// Mean suits the continuous ocean fields; Max keeps extremes (e.g. upwelling
/// peaks in vertical velocity); Nearest preserves exact values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DownsampleMethod {
    /// Average of the valid values in each 2x2 block
    #[default]
    Mean,
    /// Maximum of the valid values in each 2x2 block
    Max,
    /// Top-left value of each block
    Nearest,
}

/// Size of a dimension after one halving.
#[inline]
pub fn halved(n: usize) -> usize {
    n.div_ceil(2)
}

/// Downsample one row-major `(height, width)` plane by a factor of 2.
///
/// Returns `(data, new_width, new_height)`. Blocks on the right or bottom edge
/// of an odd-sized plane only see the cells that exist.
pub fn downsample_2x(
    data: &[f32],
    width: usize,
    height: usize,
    method: DownsampleMethod,
) -> (Vec<f32>, usize, usize) {
    let new_width = halved(width);
    let new_height = halved(height);
    let mut output = Vec::with_capacity(new_width * new_height);

    let at = |x: usize, y: usize| -> f32 {
        if x < width && y < height {
            data.get(y * width + x).copied().unwrap_or(f32::NAN)
        } else {
            f32::NAN
        }
    };

    for out_y in 0..new_height {
        for out_x in 0..new_width {
            let (x, y) = (out_x * 2, out_y * 2);
            let block = [at(x, y), at(x + 1, y), at(x, y + 1), at(x + 1, y + 1)];
            output.push(match method {
                DownsampleMethod::Mean => mean_of_block(&block),
                DownsampleMethod::Max => max_of_block(&block),
                DownsampleMethod::Nearest => block[0],
            });
        }
    }

    (output, new_width, new_height)
}

/// Downsample a stack of equally sized planes (e.g. every `(time, depth)` pair).
pub fn downsample_planes(
    data: &[f32],
    planes: usize,
    width: usize,
    height: usize,
    method: DownsampleMethod,
) -> (Vec<f32>, usize, usize) {
    let plane_len = width * height;
    let (new_width, new_height) = (halved(width), halved(height));
    let mut output = Vec::with_capacity(planes * new_width * new_height);

    for p in 0..planes {
        let start = (p * plane_len).min(data.len());
        let end = (start + plane_len).min(data.len());
        let (plane, _, _) = downsample_2x(&data[start..end], width, height, method);
        output.extend(plane);
    }

    (output, new_width, new_height)
}

#[inline]
fn mean_of_block(values: &[f32; 4]) -> f32 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0f32, 0u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f32::NAN
    } else {
        sum / count as f32
    }
}

#[inline]
fn max_of_block(values: &[f32; 4]) -> f32 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc: Option<f32>, v| Some(acc.map_or(v, |m| m.max(v))))
        .unwrap_or(f32::NAN)
}

/// One generated pyramid level.
#[derive(Debug, Clone)]
pub struct PyramidLevelData {
    /// Downsampled planes, row-major
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    /// Level index (0 = native)
    pub level: u32,
}

/// Generate levels `1..num_levels` for a stack of planes.
///
/// Level 0 is the input itself and is not copied.
pub fn generate_levels(
    data: &[f32],
    planes: usize,
    width: usize,
    height: usize,
    num_levels: usize,
    method: DownsampleMethod,
) -> Vec<PyramidLevelData> {
    let mut levels: Vec<PyramidLevelData> = Vec::with_capacity(num_levels.saturating_sub(1));

    for level in 1..num_levels {
        let (source, w, h) = match levels.last() {
            Some(prev) => (prev.data.as_slice(), prev.width, prev.height),
            None => (data, width, height),
        };
        let (next, next_w, next_h) = downsample_planes(source, planes, w, h, method);
        levels.push(PyramidLevelData {
            data: next,
            width: next_w,
            height: next_h,
            level: level as u32,
        });
    }

    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downsample_2x_mean() {
        // 4x4 grid with values 1-16
        let data: Vec<f32> = (1..=16).map(|x| x as f32).collect();
        let (result, w, h) = downsample_2x(&data, 4, 4, DownsampleMethod::Mean);

        assert_eq!((w, h), (2, 2));
        // Top-left 2x2 block: 1,2,5,6 -> mean = 3.5
        assert!((result[0] - 3.5).abs() < 0.001);
        // Top-right 2x2 block: 3,4,7,8 -> mean = 5.5
        assert!((result[1] - 5.5).abs() < 0.001);
    }

    #[test]
    fn test_downsample_2x_max_and_nearest() {
        let data: Vec<f32> = (1..=16).map(|x| x as f32).collect();
        let (max, _, _) = downsample_2x(&data, 4, 4, DownsampleMethod::Max);
        assert_eq!(max, vec![6.0, 8.0, 14.0, 16.0]);

        let (nearest, _, _) = downsample_2x(&data, 4, 4, DownsampleMethod::Nearest);
        assert_eq!(nearest, vec![1.0, 3.0, 9.0, 11.0]);
    }

    #[test]
    fn test_land_cells_are_ignored() {
        let data = vec![1.0, f32::NAN, 3.0, 4.0];
        let (result, _, _) = downsample_2x(&data, 2, 2, DownsampleMethod::Mean);
        // Mean of 1, 3, 4 = 8/3
        assert!((result[0] - 8.0 / 3.0).abs() < 1e-5);

        let all_land = vec![f32::NAN; 4];
        let (result, _, _) = downsample_2x(&all_land, 2, 2, DownsampleMethod::Max);
        assert!(result[0].is_nan());
    }

    #[test]
    fn test_odd_sizes_keep_edges() {
        // 3 wide, 1 high
        let data = vec![1.0, 2.0, 10.0];
        let (result, w, h) = downsample_2x(&data, 3, 1, DownsampleMethod::Mean);
        assert_eq!((w, h), (2, 1));
        assert_eq!(result, vec![1.5, 10.0]);
    }

    #[test]
    fn test_planes_are_independent() {
        // Two 2x2 planes
        let data = vec![1.0, 1.0, 1.0, 1.0, 5.0, 5.0, 5.0, 5.0];
        let (result, w, h) = downsample_planes(&data, 2, 2, 2, DownsampleMethod::Mean);
        assert_eq!((w, h), (1, 1));
        assert_eq!(result, vec![1.0, 5.0]);
    }

    #[test]
    fn test_generate_levels() {
        let data: Vec<f32> = (0..256).map(|x| x as f32).collect();
        let levels = generate_levels(&data, 1, 16, 16, 3, DownsampleMethod::Mean);

        assert_eq!(levels.len(), 2);
        assert_eq!((levels[0].width, levels[0].height, levels[0].level), (8, 8, 1));
        assert_eq!((levels[1].width, levels[1].height, levels[1].level), (4, 4, 2));
        assert_eq!(levels[1].data.len(), 16);

        assert!(generate_levels(&data, 1, 16, 16, 1, DownsampleMethod::Mean).is_empty());
    }
}
