//! Operating system families and launcher locations.

use super::{registry::RegistryId, triple::node_arch};
use crate::release::error::{Error, Result};
use std::str::FromStr;

/// Executable name of the Lumea launcher on flat-layout platforms.
pub const BINARY_NAME: &str = "lumea";

/// Launcher path inside the macOS application bundle.
pub const MACOS_LAUNCHER: &str = "Lumea.app/Contents/MacOS/Lumea";

/// Operating system families Lumea ships launchers for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OsFamily {
    /// macOS.
    Darwin,
    /// Mac App Store build of macOS.
    MacAppStore,
    /// Linux.
    Linux,
    /// FreeBSD.
    FreeBsd,
    /// OpenBSD.
    OpenBsd,
    /// Windows.
    Windows,
}

impl FromStr for OsFamily {
    type Err = Error;

    /// Accepts Node names (`darwin`, `win32`, `mas`) and Rust names (`macos`, `windows`).
    fn from_str(name: &str) -> Result<Self> {
        match name {
            "darwin" | "macos" => Ok(Self::Darwin),
            "mas" => Ok(Self::MacAppStore),
            "linux" => Ok(Self::Linux),
            "freebsd" => Ok(Self::FreeBsd),
            "openbsd" => Ok(Self::OpenBsd),
            "windows" | "win32" => Ok(Self::Windows),
            other => Err(Error::UnsupportedPlatform {
                platform: other.to_string(),
            }),
        }
    }
}

impl OsFamily {
    /// Relative path of the launcher executable inside a packaged app.
    pub fn launcher_path(self) -> &'static str {
        match self {
            Self::Darwin | Self::MacAppStore => MACOS_LAUNCHER,
            Self::Linux | Self::FreeBsd | Self::OpenBsd => BINARY_NAME,
            Self::Windows => "lumea.exe",
        }
    }

    /// Node `process.platform` value.
    pub fn node_platform(self) -> &'static str {
        match self {
            Self::Darwin | Self::MacAppStore => "darwin",
            Self::Linux => "linux",
            Self::FreeBsd => "freebsd",
            Self::OpenBsd => "openbsd",
            Self::Windows => "win32",
        }
    }

    /// Suffix for executables produced for this family.
    pub fn exe_suffix(self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            _ => "",
        }
    }
}

/// Everything the packaging and install steps need to know about a platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformTarget {
    /// OS family.
    pub os: OsFamily,
    /// Launcher path relative to a package's `dist/` directory.
    pub launcher_path: &'static str,
    /// Registry id of the platform sub-package.
    pub registry_id: RegistryId,
}

/// Resolves an OS name (and CPU name) to launcher path and registry id.
///
/// `arch_name` may use either Rust (`x86_64`) or Node (`x64`) naming.
pub fn resolve_platform(os_name: &str, arch_name: &str) -> Result<PlatformTarget> {
    let os: OsFamily = os_name.parse()?;
    Ok(PlatformTarget {
        os,
        launcher_path: os.launcher_path(),
        registry_id: RegistryId::new(os.node_platform(), node_host_arch(arch_name)),
    })
}

/// Resolves the platform this process is running on.
pub fn resolve_host_platform() -> Result<PlatformTarget> {
    resolve_platform(std::env::consts::OS, std::env::consts::ARCH)
}

/// Maps `std::env::consts::ARCH` to Node's `process.arch`.
pub fn node_host_arch(arch: &str) -> &str {
    match arch {
        "x86" => "ia32",
        "arm" => "arm",
        "powerpc64" => "ppc64",
        "s390x" => "s390x",
        other => node_arch(other),
    }
}
