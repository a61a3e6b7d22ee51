//! In-memory dataset backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ocean_common::Field;

use crate::error::{GridError, Result};
use crate::types::{ExtractedArray, FieldDescriptor, LogicBox, ReadRequest};

use super::{DatasetOpener, DatasetSource};

/// A dense `[time, depth, y, x]` float32 array held in memory.
///
/// Reads always return native resolution regardless of the requested quality,
/// shaped `[depth, y, x]`.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    name: String,
    /// `[time, depth, y, x]`
    shape: [usize; 4],
    data: Vec<f32>,
    fail_at: Option<u32>,
}

impl InMemoryDataset {
    pub fn new(name: impl Into<String>, shape: [usize; 4], data: Vec<f32>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(GridError::ShapeMismatch {
                shape: shape.to_vec(),
                len: data.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            shape,
            data,
            fail_at: None,
        })
    }

    /// Fill every `(t, z, y, x)` cell from `f`.
    pub fn from_fn<F>(name: impl Into<String>, shape: [usize; 4], f: F) -> Self
    where
        F: Fn(usize, usize, usize, usize) -> f32,
    {
        let [nt, nz, ny, nx] = shape;
        let mut data = Vec::with_capacity(nt * nz * ny * nx);
        for t in 0..nt {
            for z in 0..nz {
                for y in 0..ny {
                    for x in 0..nx {
                        data.push(f(t, z, y, x));
                    }
                }
            }
        }
        Self {
            name: name.into(),
            shape,
            data,
            fail_at: None,
        }
    }

    /// Make every read of `timestep` fail.
    pub fn with_failure_at(mut self, timestep: u32) -> Self {
        self.fail_at = Some(timestep);
        self
    }

    /// `[time, depth, y, x]`
    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    fn check_bounds(&self, request: &ReadRequest) -> Result<()> {
        let [nt, nz, ny, nx] = self.shape;
        let in_bounds = (request.timestep as usize) < nt
            && request.z.start < request.z.end
            && request.z.end as usize <= nz
            && request.y.start < request.y.end
            && request.y.end as usize <= ny
            && request.x.start < request.x.end
            && request.x.end as usize <= nx;
        if in_bounds {
            Ok(())
        } else {
            Err(GridError::out_of_bounds(
                format!(
                    "t={} z={:?} y={:?} x={:?}",
                    request.timestep,
                    request.z.as_pair(),
                    request.y,
                    request.x
                ),
                format!("{:?}", self.shape),
            ))
        }
    }
}

impl DatasetSource for InMemoryDataset {
    fn logic_box(&self) -> LogicBox {
        let [_, nz, ny, nx] = self.shape;
        LogicBox::from_extents(vec![nx as u64, ny as u64, nz as u64])
    }

    fn timestep_count(&self) -> usize {
        self.shape[0]
    }

    fn field(&self) -> FieldDescriptor {
        FieldDescriptor::float32(self.name.clone())
    }

    fn read(&self, request: &ReadRequest) -> Result<ExtractedArray> {
        if self.fail_at == Some(request.timestep) {
            return Err(GridError::read_failed(format!(
                "simulated failure at timestep {}",
                request.timestep
            )));
        }
        self.check_bounds(request)?;

        let [_, nz, ny, nx] = self.shape;
        let t = request.timestep as usize;
        let (x0, x1) = (request.x.start as usize, request.x.end as usize);
        let (y0, y1) = (request.y.start as usize, request.y.end as usize);
        let (z0, z1) = (request.z.start as usize, request.z.end as usize);

        let mut out = Vec::with_capacity((z1 - z0) * (y1 - y0) * (x1 - x0));
        for z in z0..z1 {
            for y in y0..y1 {
                let row = ((t * nz + z) * ny + y) * nx;
                out.extend_from_slice(&self.data[row + x0..row + x1]);
            }
        }

        ExtractedArray::new(vec![z1 - z0, y1 - y0, x1 - x0], out)
    }
}

/// Opener over a fixed set of in-memory datasets. Counts every open.
#[derive(Debug, Default)]
pub struct InMemoryOpener {
    datasets: HashMap<Field, Arc<InMemoryDataset>>,
    opens: AtomicUsize,
}

impl InMemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the dataset served for `field`.
    pub fn with_dataset(mut self, field: Field, dataset: InMemoryDataset) -> Self {
        self.datasets.insert(field, Arc::new(dataset));
        self
    }

    /// Total number of successful and failed opens.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl DatasetOpener for InMemoryOpener {
    fn open(&self, field: Field) -> Result<Arc<dyn DatasetSource>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        match self.datasets.get(&field) {
            Some(dataset) => Ok(dataset.clone() as Arc<dyn DatasetSource>),
            None => Err(GridError::open_failed(format!(
                "no in-memory dataset registered for {}",
                field
            ))),
        }
    }
}
