//! Ephemeral run workspace
//!
//! All credentials and config artifacts generated during a run are nested
//! under one temporary directory, created at harness start and removed on
//! every exit path. The normal path removes it explicitly through
//! [`Workspace::close`]; panic and interrupt paths fall back to the
//! `TempDir` drop.

use ferrobench_common::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Exclusively-owned ephemeral directory for one harness run
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
}

impl Workspace {
    /// Create the workspace directory under the system temp root.
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("ferrobench-").tempdir()?;
        debug!("Workspace created at {}", dir.path().display());
        Ok(Self { dir: Some(dir) })
    }

    /// Root path of the workspace.
    ///
    /// # Panics
    /// Panics if called after [`Workspace::close`]; the orchestrator closes
    /// the workspace only after its last use.
    pub fn path(&self) -> &Path {
        self.dir
            .as_ref()
            .map(TempDir::path)
            .unwrap_or_else(|| unreachable!("workspace used after close"))
    }

    /// Absolute path for a file directly under the workspace root.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }

    /// Remove the workspace recursively.
    ///
    /// Consumes the workspace, so removal can only run once. Failures are
    /// returned for logging; callers must not escalate them.
    pub fn close(mut self) -> std::io::Result<()> {
        match self.dir.take() {
            Some(dir) => dir.close(),
            None => Ok(()),
        }
    }
}
