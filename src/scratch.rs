//! The per-launch extraction target.

use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;

use crate::error::Result;

/// Subdirectory of the scratch directory holding the packaged application.
pub const APP_ROOT_DIR: &str = "app_root";

/// Subdirectory of the scratch directory holding the packaged dependencies.
pub const DEPS_DIR: &str = "deps";

/// A uniquely named, process-exclusive directory under the system temp
/// root. Created once per launch and never reused: the name carries a fresh
/// v4 UUID, so concurrent launches cannot collide. Owned (and deleted) by
/// the cleanup manager, not by this type.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn create() -> Result<Self> {
        let path = std::env::temp_dir().join(format!("runlet-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&path)?;
        info!(path = %path.display(), "Created scratch directory");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Working directory for the invoked workload.
    pub fn app_root(&self) -> PathBuf {
        self.path.join(APP_ROOT_DIR)
    }

    /// Root of the extracted dependency tree.
    pub fn deps_dir(&self) -> PathBuf {
        self.path.join(DEPS_DIR)
    }
}
