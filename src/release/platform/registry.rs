//! Package-registry platform identifiers.

use crate::release::error::{Error, Result};
use std::{fmt, str::FromStr};

/// `{platform}-{arch}[-{abi}]` identifier of a platform-specific npm sub-package.
///
/// Platform and arch use Node's vocabulary (`win32`, `x64`, `arm64`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegistryId {
    /// Node `process.platform` value.
    pub platform: String,
    /// Node `process.arch` value.
    pub arch: String,
    /// Optional ABI (e.g. `gnu`, `musl`, `msvc`, `eabi`).
    pub abi: Option<String>,
}

impl RegistryId {
    /// Creates an id without an ABI.
    pub fn new(platform: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            arch: arch.into(),
            abi: None,
        }
    }

    /// Returns a copy carrying `abi`.
    pub fn with_abi(mut self, abi: impl Into<String>) -> Self {
        self.abi = Some(abi.into());
        self
    }

    /// `{platform}-{arch}`, ignoring the ABI.
    pub fn platform_arch(&self) -> String {
        format!("{}-{}", self.platform, self.arch)
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.abi {
            Some(abi) => write!(f, "{}-{}-{}", self.platform, self.arch, abi),
            None => write!(f, "{}-{}", self.platform, self.arch),
        }
    }
}

impl FromStr for RegistryId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(Error::GenericError(format!("invalid registry id `{s}`")));
        }
        match parts.as_slice() {
            [platform, arch] => Ok(Self::new(*platform, *arch)),
            [platform, arch, abi] => Ok(Self::new(*platform, *arch).with_abi(*abi)),
            _ => Err(Error::GenericError(format!(
                "invalid registry id `{s}`: expected platform-arch[-abi]"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_and_without_abi() {
        assert_eq!(RegistryId::new("darwin", "x64").to_string(), "darwin-x64");
        assert_eq!(
            RegistryId::new("linux", "arm").with_abi("eabi").to_string(),
            "linux-arm-eabi"
        );
    }

    #[test]
    fn parse_inverts_display() {
        for id in ["win32-x64-msvc", "linux-arm64", "freebsd-x64"] {
            let parsed: RegistryId = id.parse().unwrap();
            assert_eq!(parsed.to_string(), id);
        }
    }

    #[test]
    fn parse_rejects_bad_shapes() {
        assert!("linux".parse::<RegistryId>().is_err());
        assert!("linux--x64".parse::<RegistryId>().is_err());
        assert!("a-b-c-d".parse::<RegistryId>().is_err());
    }
}
