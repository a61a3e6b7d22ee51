//! Cache implementations for dataset access.

mod disk_cache;

pub use disk_cache::{hash_path, CacheStats, DiskChunkCache};
