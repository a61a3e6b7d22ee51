//! Zarr output for a finished batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use walkdir::WalkDir;
use zarrs_filesystem::FilesystemStore;

use ocean_common::{OceanError, OceanResult};
use ocean_grid::{ZarrWriter, ZarrWriterConfig};

use crate::loader::{BatchResult, BatchSelection};

/// One written array and its size on disk.
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub path: PathBuf,
    pub bytes: u64,
}

impl OutputFile {
    pub fn megabytes(&self) -> f64 {
        self.bytes as f64 / 1e6
    }
}

/// `<field>_data.zarr`, `<field>_lat.zarr`, `<field>_lon.zarr` under `dir`.
pub fn output_paths(dir: &Path, selection: &BatchSelection) -> [PathBuf; 3] {
    let field = selection.field.as_str();
    [
        dir.join(format!("{}_data.zarr", field)),
        dir.join(format!("{}_lat.zarr", field)),
        dir.join(format!("{}_lon.zarr", field)),
    ]
}

/// Delete whatever `write_outputs` left under `dir` for `selection`.
pub fn remove_outputs(dir: &Path, selection: &BatchSelection) -> OceanResult<()> {
    for path in output_paths(dir, selection) {
        if path.is_dir() {
            std::fs::remove_dir_all(&path)?;
        } else if path.exists() {
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}

fn attributes(selection: &BatchSelection, role: &str) -> Map<String, Value> {
    let mut attrs = Map::new();
    attrs.insert("field".into(), json!(selection.field.as_str()));
    attrs.insert("variable".into(), json!(selection.field.variable()));
    attrs.insert("role".into(), json!(role));
    attrs.insert("quality".into(), json!(selection.quality.value()));
    attrs.insert("lat_range".into(), json!(selection.bbox.lat_range()));
    attrs.insert("lon_range".into(), json!(selection.bbox.lon_range()));
    attrs.insert("depth_range".into(), json!(selection.depth.as_pair()));
    attrs.insert("timesteps".into(), json!(selection.timesteps));
    attrs.insert("created_at".into(), json!(Utc::now().to_rfc3339()));
    attrs
}

/// Remove any previous output at `path` and open a fresh store there.
fn fresh_store(path: &Path) -> OceanResult<Arc<FilesystemStore>> {
    if path.is_dir() {
        debug!(path = %path.display(), "Removing previous output");
        std::fs::remove_dir_all(path)?;
    } else if path.exists() {
        std::fs::remove_file(path)?;
    }
    std::fs::create_dir_all(path)?;

    let store = FilesystemStore::new(path)
        .map_err(|e| OceanError::WriteFailed(format!("{}: {}", path.display(), e)))?;
    Ok(Arc::new(store))
}

fn size_on_disk(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.metadata().ok())
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
        .sum()
}

/// Write the stacked data and its coordinates to `dir`, replacing earlier output.
pub fn write_outputs(
    dir: &Path,
    selection: &BatchSelection,
    result: &BatchResult,
    config: ZarrWriterConfig,
) -> OceanResult<Vec<OutputFile>> {
    std::fs::create_dir_all(dir)?;

    let writer = ZarrWriter::new(config);
    let [data_path, lat_path, lon_path] = output_paths(dir, selection);

    let data_shape: Vec<u64> = result.data.shape().iter().map(|&n| n as u64).collect();
    let [ny, nx] = result.grid_shape();
    let grid_shape = [ny as u64, nx as u64];

    let failed = |e: ocean_grid::GridError| OceanError::WriteFailed(e.to_string());

    writer
        .write_f32(
            fresh_store(&data_path)?,
            "/",
            &data_shape,
            result.data.data(),
            attributes(selection, "data"),
        )
        .map_err(failed)?;
    writer
        .write_f64(
            fresh_store(&lat_path)?,
            "/",
            &grid_shape,
            &result.latitude,
            attributes(selection, "latitude"),
        )
        .map_err(failed)?;
    writer
        .write_f64(
            fresh_store(&lon_path)?,
            "/",
            &grid_shape,
            &result.longitude,
            attributes(selection, "longitude"),
        )
        .map_err(failed)?;

    let files: Vec<OutputFile> = [data_path, lat_path, lon_path]
        .into_iter()
        .map(|path| OutputFile {
            bytes: size_on_disk(&path),
            path,
        })
        .collect();

    for file in &files {
        info!(
            path = %file.path.display(),
            size_mb = %format!("{:.2}", file.megabytes()),
            "Saved"
        );
    }

    Ok(files)
}
