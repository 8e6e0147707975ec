//! Persistent storage for the last run record.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, StatpackError};

use super::RunRecord;

/// Directory under the project data folder holding statpack state.
pub const STATE_DIR: &str = ".statpack";

/// File name of the last run record.
pub const LAST_RUN_FILE: &str = "last_run.yml";

/// Reads and writes the last run record of a project.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Store rooted at a project data folder.
    pub fn for_project(project_data_folder: &Path) -> Self {
        Self {
            path: project_data_folder.join(STATE_DIR).join(LAST_RUN_FILE),
        }
    }

    /// Path of the record file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last run record, if any.
    pub fn load(&self) -> Result<Option<RunRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let record = serde_yaml::from_str(&content).map_err(|e| StatpackError::ConfigParseError {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        Ok(Some(record))
    }

    /// Save a run record, replacing the previous one.
    ///
    /// Written to a temp file and renamed so a crash never leaves a partial
    /// record behind.
    pub fn save(&self, record: &RunRecord) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = serde_yaml::to_string(record)
            .map_err(|e| anyhow::anyhow!("Failed to serialize run record: {}", e))?;

        let temp_path = self.path.with_extension("yml.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }
}
