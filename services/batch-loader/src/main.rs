//! LLC4320 batch loader.
//!
//! Reads a fixed region of one field for every timestep, stacks the results
//! into a `[time, depth, y, x]` array and saves it with its coordinates as
//! zarr arrays under `./data`. The selection lives in the constants below;
//! only the chunk cache directory and the dataset origin come from the
//! environment (`LLC4320_CACHE_DIR`, `LLC4320_DATASET_BASE_URL`).

mod loader;
mod output;

use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use ocean_common::{DepthRange, Field, LatLonBox, OceanError, QualityLevel};
use ocean_grid::{DataService, DataServiceConfig, ZarrWriterConfig};

use loader::{load_timesteps, BatchSelection};

const FIELD: Field = Field::Salinity;
const QUALITY: i32 = -12;
const NUMBER_OF_TIMESTEPS: u32 = 10312;
const LAT_RANGE: [f64; 2] = [-40.0, -10.0];
const LON_RANGE: [f64; 2] = [105.0, 160.0];
const Z_RANGE: [u32; 2] = [0, 1];
const OUTPUT_DIR: &str = "./data";

fn selection() -> Result<BatchSelection> {
    Ok(BatchSelection {
        field: FIELD,
        quality: QualityLevel(QUALITY),
        timesteps: NUMBER_OF_TIMESTEPS,
        bbox: LatLonBox::new(LAT_RANGE[0], LAT_RANGE[1], LON_RANGE[0], LON_RANGE[1]),
        depth: DepthRange::new(Z_RANGE[0], Z_RANGE[1])?,
    })
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    let outcome = runtime.block_on(run_interruptible(
        run,
        ctrl_c(),
        Arc::new(AtomicBool::new(false)),
    ));

    // A read stuck in the blocking pool must not hold the process open
    runtime.shutdown_background();
    outcome
}

/// Resolves on the first Ctrl-C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}

/// Run `job` on a blocking thread and stop waiting for it once `interrupt` resolves.
///
/// On interrupt `interrupted` is raised so the job can stop at its next check,
/// and the run fails with [`OceanError::Interrupted`].
async fn run_interruptible<F, S>(job: F, interrupt: S, interrupted: Arc<AtomicBool>) -> Result<()>
where
    F: FnOnce(&AtomicBool) -> Result<()> + Send + 'static,
    S: Future<Output = ()>,
{
    let flag = interrupted.clone();
    let task = tokio::task::spawn_blocking(move || job(&flag));

    tokio::select! {
        joined = task => joined.context("Batch task panicked").and_then(|result| result),
        () = interrupt => {
            interrupted.store(true, Ordering::SeqCst);
            error!("Interrupted by user, nothing saved");
            Err(OceanError::Interrupted.into())
        }
    }
}

fn run(interrupted: &AtomicBool) -> Result<()> {
    let selection = selection()?;
    let config = DataServiceConfig::from_env();

    info!(
        field = %selection.field,
        quality = %selection.quality,
        timesteps = selection.timesteps,
        lat_range = ?selection.bbox.lat_range(),
        lon_range = ?selection.bbox.lon_range(),
        depth = ?selection.depth.as_pair(),
        cache_dir = %config.cache_dir.display(),
        "Starting batch load"
    );

    let service = DataService::from_config(config)?;
    let grid = service.coordinates()?;
    let dataset = service.dataset(selection.field)?;
    info!(
        timesteps_available = dataset.timestep_count(),
        grid = ?grid.shape(),
        "Dataset opened"
    );

    let result = load_timesteps(dataset.as_ref(), &grid, &selection, interrupted)?;
    info!(shape = ?result.data.shape(), "All timesteps loaded");

    let output_dir = Path::new(OUTPUT_DIR);
    let files = output::write_outputs(output_dir, &selection, &result, ZarrWriterConfig::default())?;
    if interrupted.load(Ordering::SeqCst) {
        output::remove_outputs(output_dir, &selection)?;
        return Err(OceanError::Interrupted.into());
    }
    let total: u64 = files.iter().map(|f| f.bytes).sum();
    info!(
        files = files.len(),
        total_mb = %format!("{:.2}", total as f64 / 1e6),
        "Batch load complete"
    );

    Ok(())
}
