//! Native NetCDF reading using the netcdf library.
//!
//! The coordinate file carries two 2-D variables, `latitude` and `longitude`,
//! sharing the same `(y, x)` dimensions. Values are decoded the way CF readers
//! do: `scale_factor`/`add_offset` are applied and `_FillValue` becomes NaN.

use std::path::Path;
use std::sync::Once;

use tracing::{debug, info};

use crate::error::{CoordsError, CoordsResult};
use crate::CoordinateArrays;

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This disables that output by calling
/// H5Eset_auto2 with null handlers. Safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Read the latitude and longitude grids from a coordinate file.
pub fn read_coordinates(path: &Path) -> CoordsResult<CoordinateArrays> {
    if !path.exists() {
        return Err(CoordsError::NotFound(path.to_path_buf()));
    }

    silence_hdf5_errors();

    info!(path = %path.display(), "Loading coordinates");
    let nc_file = netcdf::open(path)
        .map_err(|e| CoordsError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;

    let (latitude, lat_shape) = read_grid_variable(&nc_file, "latitude")?;
    let (longitude, lon_shape) = read_grid_variable(&nc_file, "longitude")?;

    if lat_shape != lon_shape {
        return Err(CoordsError::ShapeMismatch {
            lat: lat_shape,
            lon: lon_shape,
        });
    }

    let (height, width) = lat_shape;
    info!(height, width, "Coordinate arrays loaded");

    Ok(CoordinateArrays {
        latitude,
        longitude,
        height,
        width,
    })
}

/// Write latitude/longitude grids to a new NetCDF file.
///
/// Used to produce small coordinate files for local runs and tests.
pub fn write_coordinates(path: &Path, coords: &CoordinateArrays) -> CoordsResult<()> {
    coords.validate()?;
    silence_hdf5_errors();

    let mut file = netcdf::create(path)
        .map_err(|e| CoordsError::InvalidFormat(format!("Failed to create NetCDF: {}", e)))?;

    file.add_dimension("y", coords.height)
        .map_err(|e| CoordsError::InvalidFormat(e.to_string()))?;
    file.add_dimension("x", coords.width)
        .map_err(|e| CoordsError::InvalidFormat(e.to_string()))?;

    for (name, values) in [
        ("latitude", &coords.latitude),
        ("longitude", &coords.longitude),
    ] {
        let mut var = file
            .add_variable::<f64>(name, &["y", "x"])
            .map_err(|e| CoordsError::InvalidFormat(e.to_string()))?;
        var.put_values(values.as_slice(), ..)
            .map_err(|e| CoordsError::InvalidFormat(format!("Failed to write {}: {}", name, e)))?;
    }

    debug!(path = %path.display(), "Wrote coordinate file");
    Ok(())
}

// =============================================================================
// Internal helpers
// =============================================================================

fn read_grid_variable(
    nc_file: &netcdf::File,
    name: &str,
) -> CoordsResult<(Vec<f64>, (usize, usize))> {
    let var = nc_file
        .variable(name)
        .ok_or_else(|| CoordsError::MissingVariable(name.to_string()))?;

    let dims = var.dimensions();
    if dims.len() != 2 {
        return Err(CoordsError::InvalidFormat(format!(
            "{} must be 2-D, found {} dimensions",
            name,
            dims.len()
        )));
    }
    let shape = (dims[0].len(), dims[1].len());

    let raw: Vec<f64> = var
        .get_values(..)
        .map_err(|e| CoordsError::InvalidFormat(format!("Failed to read {}: {}", name, e)))?;

    let scale_factor = get_f64_attr(&var, "scale_factor").unwrap_or(1.0);
    let add_offset = get_f64_attr(&var, "add_offset").unwrap_or(0.0);
    let fill_value = get_f64_attr(&var, "_FillValue");

    let values = raw
        .into_iter()
        .map(|val| match fill_value {
            Some(fill) if val == fill => f64::NAN,
            _ => val * scale_factor + add_offset,
        })
        .collect();

    Ok((values, shape))
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}
