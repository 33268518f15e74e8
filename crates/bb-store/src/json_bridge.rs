use std::fs;
use std::path::Path;

use bb_core::{PROFILE_KEY, UserProfile};

use crate::error::{Result, StoreError};
use crate::store::Store;

impl Store {
    /// Import a profile JSON file, replacing the stored record.
    /// Accepts the legacy `addictions` / `premium` / `stopBullying` names.
    pub fn import_profile_file(&self, path: &Path) -> Result<()> {
        let json = fs::read_to_string(path).map_err(|e| {
            StoreError::InvalidData(format!("failed to read {}: {e}", path.display()))
        })?;
        self.import_profile_str(&json)
    }

    /// Import a profile JSON string. Validated before anything is written.
    pub fn import_profile_str(&self, json: &str) -> Result<()> {
        let profile = UserProfile::from_json(json)
            .map_err(|e| StoreError::InvalidData(format!("invalid JSON: {e}")))?;
        let normalized = profile
            .to_json()
            .map_err(|e| StoreError::InvalidData(format!("JSON export failed: {e}")))?;
        self.kv_set(PROFILE_KEY, &normalized)
    }

    /// Export the stored profile to a JSON file.
    pub fn export_profile_file(&self, path: &Path) -> Result<()> {
        let json = self.export_profile_string()?;
        fs::write(path, json).map_err(|e| {
            StoreError::InvalidData(format!("failed to write {}: {e}", path.display()))
        })
    }

    /// Export the stored profile as a JSON string. Defaults when nothing is stored.
    pub fn export_profile_string(&self) -> Result<String> {
        let profile = match self.kv_get(PROFILE_KEY)? {
            Some(json) => UserProfile::from_json(&json)
                .map_err(|e| StoreError::InvalidData(format!("stored profile unreadable: {e}")))?,
            None => UserProfile::default(),
        };
        profile
            .to_json()
            .map_err(|e| StoreError::InvalidData(format!("JSON export failed: {e}")))
    }
}
