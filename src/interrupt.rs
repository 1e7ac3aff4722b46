//! Ctrl+C and panic handling.
//!
//! An interrupt aborts immediately with exit status 130 after removing any
//! deploy workspace still registered here. A panic removes them too before
//! the process aborts, since release builds do not unwind.

use crate::{error::EXIT_INTERRUPTED, log};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::{
    fs, panic,
    path::{Path, PathBuf},
    time::Duration,
};

/// Workspaces to remove if the process is interrupted or panics.
static WORKSPACES: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

/// How long cleanup waits for the registry before giving up.
const LOCK_TIMEOUT: Duration = Duration::from_millis(500);

/// Install the Ctrl+C handler and the panic hook.
pub fn install() -> Result<()> {
    install_panic_hook();
    ctrlc::set_handler(|| {
        log!("interrupt"; "cancelled by user");
        cleanup();
        std::process::exit(i32::from(EXIT_INTERRUPTED));
    })
    .context("Failed to set Ctrl+C handler")
}

/// Remove registered workspaces, then run the previous hook.
fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        cleanup();
        previous(info);
    }));
}

pub fn register(path: &Path) {
    WORKSPACES.lock().push(path.to_path_buf());
}

pub fn unregister(path: &Path) {
    WORKSPACES.lock().retain(|p| p != path);
}

/// Remove every registered workspace, logging failures.
fn cleanup() {
    let Some(mut workspaces) = WORKSPACES.try_lock_for(LOCK_TIMEOUT) else {
        return;
    };
    for path in workspaces.drain(..) {
        if let Err(err) = fs::remove_dir_all(&path) {
            log!("interrupt"; "failed to remove {}: {err}", path.display());
        }
    }
}

#[cfg(test)]
pub fn is_registered(path: &Path) -> bool {
    WORKSPACES.lock().iter().any(|p| p == path)
}
