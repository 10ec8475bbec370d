use std::fmt;

use super::{Arch, Os, PlatformKey};
use crate::error::UnsupportedPlatform;

/// Every platform a prebuilt binary is published for.
pub const SUPPORTED_PLATFORMS: [PlatformKey; 5] = [
    PlatformKey::new(Os::Darwin, Arch::X64),
    PlatformKey::new(Os::Darwin, Arch::Arm64),
    PlatformKey::new(Os::Linux, Arch::X64),
    PlatformKey::new(Os::Linux, Arch::Arm64),
    PlatformKey::new(Os::Win32, Arch::X64),
];

/// File name of the release asset for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetName(String);

impl AssetName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<std::path::Path> for AssetName {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

/// Maps each supported platform to `<binary>-<os>-<arch>[.exe]`.
#[derive(Debug, Clone)]
pub struct AssetTable {
    binary_name: String,
}

impl AssetTable {
    pub fn new(binary_name: impl Into<String>) -> Self {
        Self {
            binary_name: binary_name.into(),
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn resolve(&self, key: &PlatformKey) -> Result<AssetName, UnsupportedPlatform> {
        if !SUPPORTED_PLATFORMS.contains(key) {
            return Err(UnsupportedPlatform {
                platform: key.to_string(),
                supported: SUPPORTED_PLATFORMS.iter().map(|k| k.to_string()).collect(),
            });
        }

        let suffix = if key.is_windows() { ".exe" } else { "" };
        Ok(AssetName(format!("{}-{}{}", self.binary_name, key, suffix)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_every_supported_platform() {
        let table = AssetTable::new("rust-mcp-client");
        let expected = [
            ((Os::Darwin, Arch::X64), "rust-mcp-client-darwin-x64"),
            ((Os::Darwin, Arch::Arm64), "rust-mcp-client-darwin-arm64"),
            ((Os::Linux, Arch::X64), "rust-mcp-client-linux-x64"),
            ((Os::Linux, Arch::Arm64), "rust-mcp-client-linux-arm64"),
            ((Os::Win32, Arch::X64), "rust-mcp-client-win32-x64.exe"),
        ];

        for ((os, arch), asset) in expected {
            let key = PlatformKey::new(os, arch);
            assert_eq!(table.resolve(&key).unwrap().as_str(), asset, "{key}");
        }
    }

    #[test]
    fn test_resolve_unsupported_lists_supported_keys() {
        let table = AssetTable::new("tool");
        let key = PlatformKey::new(Os::Win32, Arch::Arm64);

        let err = table.resolve(&key).unwrap_err();
        assert_eq!(err.platform, "win32-arm64");
        assert_eq!(
            err.supported,
            vec![
                "darwin-x64",
                "darwin-arm64",
                "linux-x64",
                "linux-arm64",
                "win32-x64"
            ]
        );

        let message = err.to_string();
        assert!(message.contains("win32-arm64"));
        for supported in &err.supported {
            assert!(message.contains(supported.as_str()));
        }
    }

    #[test]
    fn test_resolve_unknown_os() {
        let table = AssetTable::new("tool");
        let key = PlatformKey::new(Os::Other("freebsd".into()), Arch::X64);
        assert!(table.resolve(&key).is_err());
    }
}
