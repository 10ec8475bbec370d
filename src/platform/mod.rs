//! Platform detection and release asset naming.
//!
//! A [`PlatformKey`] is detected once per process. [`AssetTable`] turns it
//! into the file name of the prebuilt binary published for that platform, or
//! fails with [`UnsupportedPlatform`](crate::error::UnsupportedPlatform).

mod assets;
mod detection;

pub use assets::{AssetName, AssetTable, SUPPORTED_PLATFORMS};
pub use detection::{Arch, Os, PlatformKey};
