//! Locating the real LLC4320 files when they are available.
//!
//! The coordinate file is large and never checked in; tests that want it
//! look in `TEST_DATA_DIR` first, then in the workspace `data/` directory the
//! batch loader and API use.

use std::path::PathBuf;

/// Workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent()
        .and_then(|p| p.parent())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// `data/` at the workspace root.
pub fn data_dir() -> PathBuf {
    workspace_root().join("data")
}

/// The shipped static frontend.
pub fn frontend_dir() -> PathBuf {
    workspace_root().join("frontend")
}

/// Find `name` under `TEST_DATA_DIR` or the workspace data directory.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(dir) = std::env::var("TEST_DATA_DIR") {
        candidates.push(PathBuf::from(dir).join(name));
    }
    candidates.push(data_dir().join(name));

    candidates.into_iter().find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_is_valid() {
        let root = workspace_root();
        assert!(
            root.join("Cargo.toml").exists(),
            "Workspace root should contain Cargo.toml: {:?}",
            root
        );
    }

    #[test]
    fn test_frontend_dir_has_index() {
        assert!(frontend_dir().join("index.html").exists());
    }

    #[test]
    fn test_missing_file() {
        assert_eq!(find_test_file("no_such_file_anywhere.nc"), None);
    }
}
