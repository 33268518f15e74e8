use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::error::{Result, StoreError};
use crate::store::Store;

pub const PROFILE_DB: &str = "profile.db";

/// Default base directory for all bb storage.
pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".bullybros")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// `base_dir` overrides the default (used by `BB_DATA_DIR` and tests).
pub fn profile_db_path(base_dir: Option<&Path>) -> PathBuf {
    base_dir
        .map(PathBuf::from)
        .unwrap_or_else(default_base_dir)
        .join(PROFILE_DB)
}

impl Store {
    /// Open the profile database under `base_dir`, creating the directory as needed.
    pub fn open_profile(base_dir: Option<&Path>) -> Result<Self> {
        let path = profile_db_path(base_dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::InvalidData(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        tracing::debug!("opening profile store at {}", path.display());
        Store::open(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_profile_db_path_override() {
        let path = profile_db_path(Some(Path::new("/tmp/bb")));
        assert_eq!(path, PathBuf::from("/tmp/bb/profile.db"));
    }

    #[test]
    fn test_default_base_dir_name() {
        assert!(default_base_dir().ends_with(".bullybros"));
    }

    #[test]
    fn test_open_profile_creates_dirs() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("nested").join("data");

        let store = Store::open_profile(Some(&base)).unwrap();
        store.kv_set("k", "v").unwrap();
        assert!(base.join(PROFILE_DB).exists());
    }
}
