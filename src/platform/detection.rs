use std::fmt;

/// Operating system, named the way release assets name it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Os {
    Darwin,
    Linux,
    Win32,
    Other(String),
}

/// CPU architecture, named the way release assets name it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
    X64,
    Arm64,
    Other(String),
}

/// Platform information for asset selection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformKey {
    pub os: Os,
    pub arch: Arch,
}

impl Os {
    /// Maps a Rust target OS name (`std::env::consts::OS`).
    pub fn from_target(os: &str) -> Self {
        match os {
            "macos" => Os::Darwin,
            "linux" => Os::Linux,
            "windows" => Os::Win32,
            other => Os::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Os::Darwin => "darwin",
            Os::Linux => "linux",
            Os::Win32 => "win32",
            Os::Other(name) => name,
        }
    }
}

impl Arch {
    /// Maps a Rust target arch name (`std::env::consts::ARCH`).
    pub fn from_target(arch: &str) -> Self {
        match arch {
            "x86_64" => Arch::X64,
            "aarch64" => Arch::Arm64,
            other => Arch::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Arch::X64 => "x64",
            Arch::Arm64 => "arm64",
            Arch::Other(name) => name,
        }
    }
}

impl PlatformKey {
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Detect the current platform
    pub fn detect() -> Self {
        Self {
            os: Os::from_target(std::env::consts::OS),
            arch: Arch::from_target(std::env::consts::ARCH),
        }
    }

    pub fn is_windows(&self) -> bool {
        self.os == Os::Win32
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.as_str(), self.arch.as_str())
    }
}
