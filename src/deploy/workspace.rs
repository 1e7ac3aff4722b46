//! Deploy workspace ownership and the scoped working-directory guard.

use crate::{interrupt, log};
use anyhow::{Context, Result};
use chrono::Local;
use std::{
    env, io,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

/// Temporary directory the manual fallback builds the Pages commit in.
///
/// While alive it is registered with the interrupt handler. [`close`] removes
/// it and reports failures; dropping it unclosed removes it and only logs.
///
/// [`close`]: Workspace::close
pub struct Workspace {
    dir: Option<TempDir>,
}

impl Workspace {
    /// Create a uniquely named workspace under the system temp directory.
    pub fn create() -> Result<Self> {
        let prefix = format!("gh-pages-{}-", Local::now().format("%Y%m%d-%H%M%S"));
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir()
            .context("Failed to create deploy workspace")?;

        interrupt::register(dir.path());
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        self.dir.as_ref().map_or(Path::new(""), TempDir::path)
    }

    /// Remove the workspace.
    pub fn close(mut self) -> Result<()> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };
        let path = dir.path().to_path_buf();
        remove(dir).with_context(|| format!("Failed to remove workspace {}", path.display()))
    }
}

/// Unregister and delete; a directory already removed by the interrupt
/// handler counts as removed.
fn remove(dir: TempDir) -> io::Result<()> {
    interrupt::unregister(dir.path());
    match dir.close() {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let path = dir.path().to_path_buf();
        if let Err(err) = remove(dir) {
            log!("deploy"; "failed to remove workspace {}: {err}", path.display());
        }
    }
}

/// Enters a directory and restores the previous working directory on
/// [`leave`](DirGuard::leave) or drop.
pub struct DirGuard {
    original: Option<PathBuf>,
}

impl DirGuard {
    pub fn enter(dir: &Path) -> Result<Self> {
        let original = env::current_dir().context("Failed to read current directory")?;
        env::set_current_dir(dir)
            .with_context(|| format!("Failed to enter {}", dir.display()))?;
        Ok(Self {
            original: Some(original),
        })
    }

    /// Return to the original directory.
    pub fn leave(mut self) -> Result<()> {
        match self.original.take() {
            Some(original) => env::set_current_dir(&original)
                .with_context(|| format!("Failed to restore {}", original.display())),
            None => Ok(()),
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        if let Some(original) = self.original.take()
            && let Err(err) = env::set_current_dir(&original)
        {
            log!("deploy"; "failed to restore {}: {err}", original.display());
        }
    }
}
