//! On-disk cache for fetched chunks.
//!
//! Each chunk is stored as its raw native-endian float32 buffer under
//! `<root>/<dataset hash>/<level>/<chunk indices>.bin`. Entries are written
//! once and never evicted.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::error::{GridError, Result};

/// Hit/miss counters for the chunk cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Chunk cache rooted at a directory.
#[derive(Debug)]
pub struct DiskChunkCache {
    root: PathBuf,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl DiskChunkCache {
    /// Open the cache, creating `root` if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            GridError::CacheError(format!("cannot create {}: {}", root.display(), e))
        })?;
        Ok(Self {
            root,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding one chunk.
    pub fn chunk_path(&self, dataset: u64, level: usize, indices: &[u64]) -> PathBuf {
        let name = indices
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(".");
        self.root
            .join(format!("{:016x}", dataset))
            .join(level.to_string())
            .join(format!("{}.bin", name))
    }

    /// Cached chunk values, if present and readable.
    pub fn get(&self, dataset: u64, level: usize, indices: &[u64]) -> Option<Vec<f32>> {
        let path = self.chunk_path(dataset, level, indices);
        match std::fs::read(&path) {
            Ok(bytes) if bytes.len() % std::mem::size_of::<f32>() == 0 => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(bytemuck::pod_collect_to_vec(&bytes))
            }
            Ok(_) => {
                debug!(path = %path.display(), "Ignoring truncated cache entry");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(_) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a chunk. The file is written under a temporary name and renamed
    /// into place so concurrent readers never see partial data.
    pub fn insert(&self, dataset: u64, level: usize, indices: &[u64], data: &[f32]) -> Result<()> {
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let path = self.chunk_path(dataset, level, indices);
        let parent = path
            .parent()
            .ok_or_else(|| GridError::CacheError(format!("bad cache path {}", path.display())))?;
        std::fs::create_dir_all(parent)
            .map_err(|e| GridError::CacheError(format!("{}: {}", parent.display(), e)))?;

        let tmp = parent.join(format!(
            ".tmp-{}-{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::write(&tmp, bytemuck::cast_slice::<f32, u8>(data))
            .map_err(|e| GridError::CacheError(format!("{}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| GridError::CacheError(format!("{}: {}", path.display(), e)))?;

        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}

/// Stable 64-bit FNV-1a hash of a dataset URL, used as its cache directory name.
pub fn hash_path(path: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    path.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ byte as u64).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskChunkCache::new(dir.path().join("cache")).unwrap();

        assert!(cache.get(1, 0, &[0, 0, 1, 2]).is_none());
        cache.insert(1, 0, &[0, 0, 1, 2], &[1.0, f32::NAN, 3.5]).unwrap();

        let data = cache.get(1, 0, &[0, 0, 1, 2]).unwrap();
        assert_eq!(data[0], 1.0);
        assert!(data[1].is_nan());
        assert_eq!(data[2], 3.5);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_levels_and_datasets_are_separate() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskChunkCache::new(dir.path()).unwrap();
        cache.insert(1, 0, &[0], &[1.0]).unwrap();

        assert!(cache.get(1, 1, &[0]).is_none());
        assert!(cache.get(2, 0, &[0]).is_none());
        assert_ne!(cache.chunk_path(1, 0, &[0]), cache.chunk_path(1, 1, &[0]));
    }

    #[test]
    fn test_hash_path() {
        let a = hash_path("https://example.org/salt/salt_llc4320_x_y_depth.zarr");
        let b = hash_path("https://example.org/salt/salt_llc4320_x_y_depth.zarr");
        let c = hash_path("https://example.org/theta/theta_llc4320_x_y_depth.zarr");
        assert_eq!(a, b);
        assert_ne!(a, c);
        // FNV-1a reference value for the empty input
        assert_eq!(hash_path(""), 0xcbf2_9ce4_8422_2325);
    }
}
