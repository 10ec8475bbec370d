//! Fetcher configuration and download target construction.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::platform::AssetName;
use crate::runtime::Runtime;

pub const DEFAULT_RELEASE_HOST: &str = "https://github.com";
pub const DEFAULT_OWNER: &str = "liushoukai";
pub const DEFAULT_REPO: &str = "rust-mcp-client";
pub const DEFAULT_BINARY_NAME: &str = "rust-mcp-client";

/// Retry, timeout and redirect limits for one `install` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub max_retries: usize,
    /// Wall-clock budget for a single attempt, redirects and body included.
    pub timeout: Duration,
    pub retry_delay: Duration,
    pub max_redirects: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout: Duration::from_millis(180_000),
            retry_delay: Duration::from_millis(2_000),
            max_redirects: 10,
        }
    }
}

/// Where release assets are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSource {
    pub host: String,
    pub owner: String,
    pub repo: String,
}

impl Default for ReleaseSource {
    fn default() -> Self {
        Self {
            host: DEFAULT_RELEASE_HOST.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            repo: DEFAULT_REPO.to_string(),
        }
    }
}

impl ReleaseSource {
    /// `<host>/<owner>/<repo>/releases/download/v<version>/<asset>`
    pub fn download_url(&self, version: &str, asset: &AssetName) -> String {
        let version = version.strip_prefix('v').unwrap_or(version);
        format!(
            "{}/{}/{}/releases/download/v{}/{}",
            self.host.trim_end_matches('/'),
            self.owner,
            self.repo,
            version,
            asset
        )
    }
}

/// URL to fetch and the file it lands in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub url: String,
    pub destination: PathBuf,
}

impl DownloadTarget {
    pub fn new(
        source: &ReleaseSource,
        version: &str,
        asset: &AssetName,
        destination_dir: &Path,
    ) -> Self {
        Self {
            url: source.download_url(version, asset),
            destination: destination_dir.join(asset),
        }
    }
}

/// `<data_local_dir>/relaybin/bin`, used when no directory is configured.
pub fn default_install_dir<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let base = runtime
        .data_local_dir()
        .context("Could not determine a local data directory; pass --dir")?;
    Ok(base.join("relaybin").join("bin"))
}

pub fn resolve_install_dir<R: Runtime>(runtime: &R, dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir),
        None => default_install_dir(runtime),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, AssetTable, Os, PlatformKey};
    use crate::runtime::MockRuntime;

    fn linux_asset() -> AssetName {
        AssetTable::new("rust-mcp-client")
            .resolve(&PlatformKey::new(Os::Linux, Arch::X64))
            .unwrap()
    }

    #[test]
    fn test_fetch_config_defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.timeout, Duration::from_millis(180_000));
        assert_eq!(config.retry_delay, Duration::from_millis(2_000));
        assert_eq!(config.max_redirects, 10);
    }

    #[test]
    fn test_download_url() {
        let url = ReleaseSource::default().download_url("1.2.3", &linux_asset());
        assert_eq!(
            url,
            "https://github.com/liushoukai/rust-mcp-client/releases/download/v1.2.3/rust-mcp-client-linux-x64"
        );
    }

    #[test]
    fn test_download_url_accepts_v_prefix_and_trailing_slash() {
        let source = ReleaseSource {
            host: "http://127.0.0.1:1234/".into(),
            owner: "o".into(),
            repo: "r".into(),
        };
        assert_eq!(
            source.download_url("v0.1.0", &linux_asset()),
            "http://127.0.0.1:1234/o/r/releases/download/v0.1.0/rust-mcp-client-linux-x64"
        );
    }

    #[test]
    fn test_download_target_destination() {
        let target = DownloadTarget::new(
            &ReleaseSource::default(),
            "1.0.0",
            &linux_asset(),
            Path::new("/opt/tool/bin"),
        );
        assert_eq!(
            target.destination,
            PathBuf::from("/opt/tool/bin/rust-mcp-client-linux-x64")
        );
    }

    #[test]
    fn test_default_install_dir() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_data_local_dir()
            .returning(|| Some(PathBuf::from("/home/user/.local/share")));

        assert_eq!(
            resolve_install_dir(&runtime, None).unwrap(),
            PathBuf::from("/home/user/.local/share/relaybin/bin")
        );
        assert_eq!(
            resolve_install_dir(&runtime, Some(PathBuf::from("/opt"))).unwrap(),
            PathBuf::from("/opt")
        );
    }

    #[test]
    fn test_default_install_dir_missing() {
        let mut runtime = MockRuntime::new();
        runtime.expect_data_local_dir().returning(|| None);
        assert!(default_install_dir(&runtime).is_err());
    }
}
