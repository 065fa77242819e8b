//! The stage workspace directory
//!
//! A single fixed directory holds generated `.eml` files until a downstream
//! consumer picks them up. Creating the workspace resets it: whatever is at
//! the fixed path is removed first. Two workers must not create the same
//! workspace concurrently; give each its own `stage_name` instead.

use crate::config::StageConfig;
use crate::error::{Result, StageError};
use crate::materializer::eml_file_name;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// A freshly reset stage directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// Always carries a trailing separator
    dir: PathBuf,
}

impl Workspace {
    /// Reset the stage directory: remove anything at the configured path and
    /// create an empty directory, readable by the owner only.
    ///
    /// Fails only when the temp root itself cannot be statted.
    pub fn create(config: &StageConfig) -> Result<Self> {
        let root = config.temp_root();
        let dir = config.workspace_path();

        discard(&dir);

        match create_private_dir(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                info!(
                    "Stage dir {} was not removed from a previous run",
                    dir.display()
                );
            }
            Err(e) => {
                fs::metadata(&root).map_err(|source| {
                    error!("Temp root {} is not accessible: {source}", root.display());
                    StageError::io(&root, source)
                })?;
                error!("Failed to create stage dir {}: {e}", dir.display());
            }
        }

        Ok(Self { dir: dir.join("") })
    }

    /// Directory path, with a trailing separator
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Where the file for message `id` goes
    #[must_use]
    pub fn file_path(&self, id: i64) -> PathBuf {
        self.dir.join(eml_file_name(id))
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir.display())
    }
}

/// Remove a file or directory tree. A missing path is not an error; other
/// failures are logged and otherwise ignored.
pub fn discard(path: &Path) {
    let removed = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    };

    if let Err(e) = removed {
        error!("Failed to delete {}: {e}", path.display());
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir(dir)
}
