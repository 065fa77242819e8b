//! Staging configuration
//!
//! The stage location is passed explicitly to [`crate::Workspace::create`].
//! It can be built in code or loaded from a TOML document:
//!
//! ```toml
//! stage_name = "eml_stage"
//! temp_root = "/var/tmp"
//! ```

use crate::error::{Result, StageError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory name used under the temp root when none is configured
pub const DEFAULT_STAGE_NAME: &str = "eml_stage";

/// Where the stage workspace lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Name of the stage directory under the temp root
    pub stage_name: String,

    /// Temp root override; the system temp directory when unset
    pub temp_root: Option<PathBuf>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            stage_name: DEFAULT_STAGE_NAME.to_string(),
            temp_root: None,
        }
    }
}

impl StageConfig {
    /// Stage under `temp_root` instead of the system temp directory.
    #[must_use]
    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(temp_root.into());
        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| StageError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| StageError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// The temp root the workspace is created under
    #[must_use]
    pub fn temp_root(&self) -> PathBuf {
        self.temp_root.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Fixed location of the stage directory
    #[must_use]
    pub fn workspace_path(&self) -> PathBuf {
        self.temp_root().join(&self.stage_name)
    }
}
