use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use super::report;
use crate::{
    cleanup::{self, cleanup_on_interrupt},
    config::{DownloadTarget, FetchConfig, ReleaseSource, resolve_install_dir},
    download::{ConsoleProgress, Fetcher},
    http::{EnvProxyResolver, HttpClient},
    package::read_release_version,
    platform::{AssetTable, PlatformKey},
    runtime::Runtime,
};

#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub install_dir: Option<PathBuf>,
    /// Takes precedence over the manifest when set.
    pub release_version: Option<String>,
    pub manifest: PathBuf,
    pub binary_name: String,
    pub source: ReleaseSource,
    pub fetch: FetchConfig,
}

/// Downloads the binary for this platform and prints the outcome.
///
/// Returns the installed path. On failure the remediation steps have
/// already been printed to stderr.
#[tracing::instrument(skip(runtime, options))]
pub async fn install<R: Runtime + Clone + 'static>(
    runtime: R,
    options: InstallOptions,
) -> Result<PathBuf> {
    let platform = PlatformKey::detect();
    let asset = AssetTable::new(options.binary_name.as_str()).resolve(&platform)?;

    let version = match options.release_version {
        Some(version) => version,
        None => read_release_version(&runtime, &options.manifest)?,
    };
    let version = version.strip_prefix('v').unwrap_or(&version).to_string();
    let install_dir = resolve_install_dir(&runtime, options.install_dir)?;
    let target = DownloadTarget::new(&options.source, &version, &asset, &install_dir);

    let proxies = EnvProxyResolver::from_runtime(&runtime);
    if proxies.is_configured() {
        info!("Proxy settings found in the environment; falling back to direct connections if they fail");
    }
    let http = HttpClient::new(Arc::new(proxies)).context("Failed to initialise HTTP client")?;

    println!("Downloading binary for {}...", platform);
    println!("Version: v{}", version);
    println!("URL: {}", target.url);

    let is_windows = platform.is_windows();
    let cleanup_ctx = cleanup::new_shared();
    let interrupt = cleanup_on_interrupt(runtime.clone(), Arc::clone(&cleanup_ctx));
    let fetcher = Fetcher::new(runtime, http, options.fetch, platform)
        .with_observer(Arc::new(ConsoleProgress))
        .with_cleanup(cleanup_ctx);

    let result = fetcher.fetch(&target).await;
    interrupt.abort();

    match result {
        Ok(()) => {
            println!("\n{}", report::success_text(&target.destination));
            Ok(target.destination)
        }
        Err(e) => {
            eprintln!(
                "\n{}",
                report::failure_text(&e, &target.url, &target.destination, &version, is_windows)
            );
            Err(e.into())
        }
    }
}
