use anyhow::Result;
use log::debug;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::{
    config::resolve_install_dir,
    error::LaunchError,
    launcher::{ExitOutcome, Launcher},
    platform::{AssetTable, PlatformKey},
    runtime::Runtime,
};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub install_dir: Option<PathBuf>,
    pub binary_name: String,
    /// Forwarded verbatim.
    pub args: Vec<OsString>,
}

/// Runs the installed binary and reports how it finished.
///
/// The caller is expected to end the process with
/// [`terminate`](crate::launcher::terminate).
#[tracing::instrument(skip(runtime, options))]
pub async fn run<R: Runtime>(runtime: R, options: RunOptions) -> Result<ExitOutcome> {
    let platform = PlatformKey::detect();
    let asset = AssetTable::new(options.binary_name.as_str())
        .resolve(&platform)
        .map_err(LaunchError::from)?;
    let install_dir = resolve_install_dir(&runtime, options.install_dir)?;

    let launcher = Launcher::new(runtime, platform);
    let binary = launcher.locate(&install_dir, &asset)?;

    debug!(
        "Launching {:?} with {} argument(s)",
        binary,
        options.args.len()
    );
    Ok(launcher.launch(&binary, &options.args).await?)
}
