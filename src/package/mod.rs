//! Package metadata the installer reads its release version from.

mod manifest;

pub use manifest::{PackageManifest, read_release_version};
