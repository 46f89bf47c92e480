//! Preference storage adapters.

use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::preferences::{PreferenceData, PreferenceStore};

/// JSON file store. Every save rewrites the whole file through a temp file
/// in the same directory, so readers never see a half-written file.
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> DomainResult<PreferenceData> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no preference file yet, using defaults");
            return Ok(PreferenceData::default());
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            DomainError::storage(format!("failed to read {}: {e}", self.path.display()))
        })?;
        match serde_json::from_str(&raw) {
            Ok(data) => Ok(data),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt preference file, using defaults");
                Ok(PreferenceData::default())
            }
        }
    }

    fn save(&self, data: &PreferenceData) -> DomainResult<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .map_err(|e| DomainError::storage(format!("failed to create {}: {e}", dir.display())))?;

        let json = serde_json::to_vec_pretty(data)
            .map_err(|e| DomainError::storage(format!("failed to encode preferences: {e}")))?;
        let mut tmp = NamedTempFile::new_in(dir)
            .map_err(|e| DomainError::storage(format!("failed to create temp file: {e}")))?;
        tmp.write_all(&json)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| DomainError::storage(format!("failed to write preferences: {e}")))?;
        tmp.persist(&self.path).map_err(|e| {
            DomainError::storage(format!("failed to replace {}: {}", self.path.display(), e.error))
        })?;
        debug!(path = %self.path.display(), "preferences saved");
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    data: Mutex<PreferenceData>,
    saves: Mutex<usize>,
}

impl MemoryPreferenceStore {
    pub fn with_data(data: PreferenceData) -> Self {
        Self {
            data: Mutex::new(data),
            saves: Mutex::new(0),
        }
    }

    pub fn saved(&self) -> PreferenceData {
        self.data.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> DomainResult<PreferenceData> {
        Ok(self.data.lock().clone())
    }

    fn save(&self, data: &PreferenceData) -> DomainResult<()> {
        *self.data.lock() = data.clone();
        *self.saves.lock() += 1;
        Ok(())
    }
}
