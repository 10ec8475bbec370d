use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::runtime::Runtime;

/// The subset of a JSON package manifest (`package.json`) the installer needs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PackageManifest {
    pub name: Option<String>,
    pub version: String,
}

impl PackageManifest {
    pub fn parse(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Failed to parse package manifest")
    }
}

/// Reads the release version from the manifest at `path`, without a `v` prefix.
#[tracing::instrument(skip(runtime))]
pub fn read_release_version<R: Runtime>(runtime: &R, path: &Path) -> Result<String> {
    let contents = runtime
        .read_to_string(path)
        .with_context(|| format!("Failed to read package manifest at {:?}", path))?;
    let manifest = PackageManifest::parse(&contents)
        .with_context(|| format!("Invalid package manifest at {:?}", path))?;

    let version = manifest.version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    if version.is_empty() {
        anyhow::bail!("Package manifest at {:?} has an empty version", path);
    }
    Ok(version.to_string())
}
