//! Error types surfaced by the fetcher and the launcher.

use std::path::PathBuf;
use thiserror::Error;

/// The running platform has no published asset.
#[derive(Debug, Clone, Error)]
#[error("unsupported platform {platform} (supported: {})", supported.join(", "))]
pub struct UnsupportedPlatform {
    pub platform: String,
    pub supported: Vec<String>,
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatform),

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("download failed: HTTP {0}")]
    UnexpectedStatus(u16),

    #[error("too many redirects (limit {0})")]
    TooManyRedirects(u32),

    #[error("invalid download URL {0:?}")]
    InvalidUrl(String),

    #[error("download timed out after {0} ms")]
    Timeout(u64),

    #[error("filesystem error at {}: {message}", path.display())]
    Filesystem { path: PathBuf, message: String },
}

impl InstallError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        InstallError::Filesystem {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Whether another attempt could plausibly succeed.
    ///
    /// Connection failures, timeouts, server errors, 408 and 429 are
    /// transient. Every other status (404 for a release that was never
    /// published), redirect loops and local disk errors fail fast.
    pub fn is_retryable(&self) -> bool {
        match self {
            InstallError::Network(_) | InstallError::Timeout(_) => true,
            InstallError::UnexpectedStatus(code) => {
                *code >= 500 || *code == 408 || *code == 429
            }
            InstallError::UnsupportedPlatform(_)
            | InstallError::InvalidUrl(_)
            | InstallError::TooManyRedirects(_)
            | InstallError::Filesystem { .. } => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatform),

    #[error("binary not found: {}", path.display())]
    BinaryNotFound { path: PathBuf },

    #[error("failed to start {}: {source}", path.display())]
    SpawnFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lost track of child process: {0}")]
    Wait(#[source] std::io::Error),
}
