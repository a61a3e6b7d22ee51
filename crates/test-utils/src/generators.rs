//! Test data generators for synthetic ocean grids.
//!
//! These generators create predictable, verifiable patterns that can be used
//! across the test suite. Coordinate arrays are `f64`, field values `f32`,
//! both row-major `(y, x)`.

/// Encodes a `(t, z, y, x)` position as a single value: `t*1e6 + z*1e4 + y*100 + x`.
///
/// Exact in f32 for the small shapes used in tests, so reads can be checked
/// cell by cell.
pub fn known_value(t: usize, z: usize, y: usize, x: usize) -> f32 {
    (t * 1_000_000 + z * 10_000 + y * 100 + x) as f32
}

/// Creates a dense `[time, depth, y, x]` volume of [`known_value`]s.
pub fn create_known_volume(shape: [usize; 4]) -> Vec<f32> {
    let [nt, nz, ny, nx] = shape;
    let mut data = Vec::with_capacity(nt * nz * ny * nx);
    for t in 0..nt {
        for z in 0..nz {
            for y in 0..ny {
                for x in 0..nx {
                    data.push(known_value(t, z, y, x));
                }
            }
        }
    }
    data
}

/// Creates a regular lat/lon coordinate grid.
///
/// Row `y` sits at `lat0 + y * dlat`, column `x` at `lon0 + x * dlon`.
///
/// # Returns
///
/// `(latitude, longitude)`, each `height * width` values.
pub fn create_regular_coordinates(
    width: usize,
    height: usize,
    lat0: f64,
    dlat: f64,
    lon0: f64,
    dlon: f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut lat = Vec::with_capacity(width * height);
    let mut lon = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            lat.push(lat0 + y as f64 * dlat);
            lon.push(lon0 + x as f64 * dlon);
        }
    }
    (lat, lon)
}

/// Creates a sheared curvilinear grid, like an LLC face near its edge.
///
/// Latitude grows by one degree per row plus `skew` degrees per column, so a
/// lat/lon box selects a parallelogram of cells rather than a rectangle.
pub fn create_curvilinear_coordinates(
    width: usize,
    height: usize,
    lat0: f64,
    lon0: f64,
    skew: f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut lat = Vec::with_capacity(width * height);
    let mut lon = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            lat.push(lat0 + y as f64 + x as f64 * skew);
            lon.push(lon0 + x as f64);
        }
    }
    (lat, lon)
}

/// Creates a salinity-like surface in g/kg.
///
/// Values sit between 33 and 37, fresher towards the top-left.
pub fn create_salinity_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            data.push(33.0 + x_factor * 2.0 + y_factor * 2.0);
        }
    }
    data
}

/// Marks land cells as NaN.
///
/// # Arguments
///
/// * `data` - Row-major grid to modify
/// * `width` - Number of columns
/// * `land` - List of (col, row) positions that are land
pub fn apply_land_mask(data: &mut [f32], width: usize, land: &[(usize, usize)]) {
    for &(col, row) in land {
        if col < width {
            if let Some(cell) = data.get_mut(row * width + col) {
                *cell = f32::NAN;
            }
        }
    }
}
