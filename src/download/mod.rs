//! Release asset fetcher: redirect following, per-attempt timeout, streamed
//! write to disk, whole-operation retry and cleanup of partial files.

mod attempt;
mod progress;

pub use progress::{ConsoleProgress, ProgressObserver, SilentProgress};

use log::{debug, info, warn};
use reqwest::{StatusCode, Url, header::LOCATION};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cleanup::{CleanupGuard, SharedCleanupContext};
use crate::config::{DownloadTarget, FetchConfig, ReleaseSource};
use crate::error::InstallError;
use crate::http::HttpClient;
use crate::platform::{AssetName, PlatformKey};
use crate::runtime::Runtime;
use attempt::DownloadAttempt;

pub const EXECUTABLE_MODE: u32 = 0o755;

pub struct Fetcher<R: Runtime> {
    runtime: R,
    http: HttpClient,
    config: FetchConfig,
    platform: PlatformKey,
    observer: Arc<dyn ProgressObserver>,
    cleanup: Option<SharedCleanupContext>,
}

impl<R: Runtime> Fetcher<R> {
    pub fn new(runtime: R, http: HttpClient, config: FetchConfig, platform: PlatformKey) -> Self {
        Self {
            runtime,
            http,
            config,
            platform,
            observer: Arc::new(SilentProgress),
            cleanup: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Registers the destination in `ctx` for as long as a body is being
    /// written to it, so an interrupt can remove the partial file.
    pub fn with_cleanup(mut self, ctx: SharedCleanupContext) -> Self {
        self.cleanup = Some(ctx);
        self
    }

    /// Downloads `asset` of release `version` into `destination_dir`.
    ///
    /// Returns the path of the installed binary.
    #[tracing::instrument(skip(self, source))]
    pub async fn install(
        &self,
        source: &ReleaseSource,
        version: &str,
        asset: &AssetName,
        destination_dir: &Path,
    ) -> Result<PathBuf, InstallError> {
        let target = DownloadTarget::new(source, version, asset, destination_dir);
        self.fetch(&target).await?;
        Ok(target.destination)
    }

    /// Runs the retry loop for an explicit URL and destination.
    ///
    /// On failure no file is left at `target.destination` (best effort).
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, target: &DownloadTarget) -> Result<(), InstallError> {
        let url =
            Url::parse(&target.url).map_err(|_| InstallError::InvalidUrl(target.url.clone()))?;

        if let Some(dir) = target.destination.parent() {
            debug!("Creating destination directory: {:?}", dir);
            self.runtime
                .create_dir_all(dir)
                .map_err(|e| InstallError::filesystem(dir, format!("{:#}", e)))?;
        }

        let max_attempts = self.config.max_retries.max(1);
        let mut number = 1;
        loop {
            self.observer.on_attempt(number, max_attempts);
            let mut attempt = DownloadAttempt::new(number, self.config.max_redirects);

            let result = match tokio::time::timeout(
                self.config.timeout,
                self.run_attempt(&url, &target.destination, &mut attempt),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(InstallError::Timeout(self.config.timeout.as_millis() as u64)),
            };

            let err = match result {
                Ok(()) => {
                    info!(
                        "Downloaded {} bytes to {:?} (attempt {}/{})",
                        attempt.bytes_downloaded(),
                        target.destination,
                        number,
                        max_attempts
                    );
                    return Ok(());
                }
                Err(e) => e,
            };

            self.discard_partial(&target.destination);

            if !err.is_retryable() {
                debug!("Download failed with a non-retryable error: {}", err);
                return Err(err);
            }
            if number >= max_attempts {
                warn!(
                    "Download attempt {}/{} failed ({}), giving up",
                    number, max_attempts, err
                );
                return Err(err);
            }

            warn!(
                "Download attempt {}/{} failed ({}), retrying in {}ms...",
                number,
                max_attempts,
                err,
                self.config.retry_delay.as_millis()
            );
            tokio::time::sleep(self.config.retry_delay).await;
            number += 1;
        }
    }

    async fn run_attempt(
        &self,
        start: &Url,
        destination: &Path,
        attempt: &mut DownloadAttempt,
    ) -> Result<(), InstallError> {
        let mut url = start.clone();

        let mut response = loop {
            let response = self.http.get(&url).await.map_err(InstallError::Network)?;
            let status = response.status();

            if is_redirect(status) {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .ok_or(InstallError::UnexpectedStatus(status.as_u16()))?;

                if !attempt.take_redirect() {
                    return Err(InstallError::TooManyRedirects(self.config.max_redirects));
                }
                url = url
                    .join(location)
                    .map_err(|_| InstallError::InvalidUrl(location.to_string()))?;
                debug!(
                    "Attempt {}: {} redirect to {}",
                    attempt.number,
                    status.as_u16(),
                    url
                );
                continue;
            }

            if status != StatusCode::OK {
                return Err(InstallError::UnexpectedStatus(status.as_u16()));
            }
            break response;
        };

        attempt.start_body(response.content_length());
        let fs_error = |message: String| InstallError::filesystem(destination, message);

        let mut writer = self
            .runtime
            .create_file(destination)
            .map_err(|e| fs_error(format!("{:#}", e)))?;
        // Only from here on is the file ours to delete
        let _registered = self
            .cleanup
            .as_ref()
            .map(|ctx| CleanupGuard::new(Arc::clone(ctx), destination.to_path_buf()));

        while let Some(chunk) = response.chunk().await.map_err(InstallError::Network)? {
            writer.write_all(&chunk).map_err(|e| fs_error(e.to_string()))?;
            if let Some(percent) = attempt.record(chunk.len()) {
                self.observer.on_progress(percent);
            }
        }
        writer.flush().map_err(|e| fs_error(e.to_string()))?;
        drop(writer);

        if let Some(percent) = attempt.complete() {
            self.observer.on_progress(percent);
        }

        if !self.platform.is_windows() {
            self.runtime
                .set_permissions(destination, EXECUTABLE_MODE)
                .map_err(|e| fs_error(format!("{:#}", e)))?;
        }

        Ok(())
    }

    /// Best-effort removal; errors are logged and swallowed.
    fn discard_partial(&self, destination: &Path) {
        if !self.runtime.exists(destination) {
            return;
        }
        debug!("Removing partial download {:?}", destination);
        if let Err(e) = self.runtime.remove_file(destination) {
            debug!("Could not remove {:?}: {:#}", destination, e);
        }
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}
