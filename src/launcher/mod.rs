//! Runs the installed binary as a child process with inherited stdio and
//! environment, relaying stop signals and propagating its exit.

mod supervise;

pub use supervise::{ExitOutcome, StopRequest, supervise, terminate};

use log::debug;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::download::EXECUTABLE_MODE;
use crate::error::LaunchError;
use crate::platform::{AssetName, PlatformKey};
use crate::runtime::Runtime;

/// How long an interrupted child gets before it is sent SIGTERM.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(2);

pub struct Launcher<R: Runtime> {
    runtime: R,
    platform: PlatformKey,
    grace: Duration,
}

impl<R: Runtime> Launcher<R> {
    pub fn new(runtime: R, platform: PlatformKey) -> Self {
        Self {
            runtime,
            platform,
            grace: DEFAULT_GRACE,
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Finds `asset` in `install_dir` and makes sure it is executable.
    ///
    /// Re-asserting the permission bit is best effort: a read-only
    /// filesystem must not block a binary that is already executable.
    #[tracing::instrument(skip(self))]
    pub fn locate(&self, install_dir: &Path, asset: &AssetName) -> Result<PathBuf, LaunchError> {
        let path = install_dir.join(asset);
        if !self.runtime.exists(&path) {
            return Err(LaunchError::BinaryNotFound { path });
        }

        if !self.platform.is_windows()
            && let Err(e) = self.runtime.set_permissions(&path, EXECUTABLE_MODE)
        {
            debug!("Ignoring permission error on {:?}: {:#}", path, e);
        }

        Ok(path)
    }

    /// Spawns exactly one child sharing our stdin, stdout, stderr and environment.
    #[tracing::instrument(skip(self))]
    pub fn spawn(&self, binary: &Path, args: &[OsString]) -> Result<Child, LaunchError> {
        Command::new(binary)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| LaunchError::SpawnFailure {
                path: binary.to_path_buf(),
                source,
            })
    }

    /// Spawns the binary and relays SIGINT/SIGTERM to it until it exits.
    pub async fn launch(&self, binary: &Path, args: &[OsString]) -> Result<ExitOutcome, LaunchError> {
        // Listen before spawning so no signal slips past between the two
        let signals = OsSignals::listen().map_err(LaunchError::Wait)?;
        let child = self.spawn(binary, args)?;

        let (tx, rx) = mpsc::channel(8);
        let relay = tokio::spawn(signals.relay(tx));

        let outcome = supervise(child, rx, self.grace)
            .await
            .map_err(LaunchError::Wait);
        relay.abort();
        outcome
    }
}

#[cfg(unix)]
struct OsSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl OsSignals {
    fn listen() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn relay(mut self, tx: mpsc::Sender<StopRequest>) {
        loop {
            let request = tokio::select! {
                Some(()) = self.interrupt.recv() => StopRequest::Interrupt,
                Some(()) = self.terminate.recv() => StopRequest::Terminate,
                else => return,
            };
            debug!("Relaying {:?} to child", request);
            if tx.send(request).await.is_err() {
                return;
            }
        }
    }
}

#[cfg(not(unix))]
struct OsSignals;

#[cfg(not(unix))]
impl OsSignals {
    fn listen() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn relay(self, tx: mpsc::Sender<StopRequest>) {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::warn!("Cannot listen for Ctrl-C: {}", e);
                return;
            }
            if tx.send(StopRequest::Interrupt).await.is_err() {
                return;
            }
        }
    }
}

/// Remediation text for a missing binary.
pub fn reinstall_hint(path: &Path) -> String {
    format!(
        "Path: {}\n\nTry reinstalling:\n  relaybin --dir {} install",
        path.display(),
        path.parent().unwrap_or(path).display()
    )
}
