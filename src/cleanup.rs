//! Removal of half-written files when an install is interrupted.

use log::debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use crate::runtime::Runtime;

/// Exit status used after Ctrl-C, as shells do.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Tracks files that must not survive an interruption
#[derive(Debug, Default)]
pub struct CleanupContext {
    paths: Vec<PathBuf>,
}

impl CleanupContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn remove(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Deletes every registered file, ignoring errors.
    pub fn cleanup<R: Runtime>(&self, runtime: &R) {
        for path in &self.paths {
            if !runtime.exists(path) {
                continue;
            }
            debug!("Cleaning up: {:?}", path);
            if let Err(e) = runtime.remove_file(path) {
                debug!("Could not remove {:?}: {:#}", path, e);
            }
        }
    }
}

pub type SharedCleanupContext = Arc<Mutex<CleanupContext>>;

pub fn new_shared() -> SharedCleanupContext {
    Arc::new(Mutex::new(CleanupContext::new()))
}

/// Keeps `path` registered for cleanup while the guard is alive.
pub struct CleanupGuard {
    ctx: SharedCleanupContext,
    path: PathBuf,
}

impl CleanupGuard {
    pub fn new(ctx: SharedCleanupContext, path: PathBuf) -> Self {
        if let Ok(mut guard) = ctx.lock() {
            guard.add(path.clone());
        }
        Self { ctx, path }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.ctx.lock() {
            guard.remove(&self.path);
        }
    }
}

/// On Ctrl-C, deletes registered files and exits with status 130.
///
/// Abort the returned handle once the guarded work is finished.
pub fn cleanup_on_interrupt<R: Runtime + 'static>(
    runtime: R,
    ctx: SharedCleanupContext,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, cleaning up...");
            if let Ok(ctx) = ctx.lock() {
                ctx.cleanup(&runtime);
            }
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    })
}
