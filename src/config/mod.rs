//! Project configuration from `lumea-release.toml`.
//!
//! Every key is optional. Command line flags take precedence over values
//! read here.

use crate::error::{CliError, ReleaseError, Result};
use crate::release::{
    builder::{DEFAULT_BUNDLE_NAME, DEFAULT_STAGING_DIR},
    collect::DEFAULT_BINARY_PREFIX,
    install::{DEFAULT_ARTIFACT_NAME, DEFAULT_PROJECT, DEFAULT_RELEASE_HOST, InstallConfig},
    version::VersionSource,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file looked up in the current directory.
pub const CONFIG_FILE: &str = "lumea-release.toml";

/// Root of `lumea-release.toml`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseConfig {
    /// `[version]`
    pub version: VersionConfig,
    /// `[bundle]`
    pub bundle: BundleConfig,
    /// `[install]`
    pub install: InstallSection,
    /// `[collect]`
    pub collect: CollectConfig,
}

/// Manifests kept in version lockstep.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct VersionConfig {
    /// `package.json` files.
    pub json: Vec<PathBuf>,
    /// `Cargo.toml` files.
    pub cargo: Vec<PathBuf>,
    /// Compare against the latest git tag.
    pub tag: bool,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            json: vec!["package/package.json".into(), "api/package.json".into()],
            cargo: vec!["core/Cargo.toml".into()],
            tag: false,
        }
    }
}

impl VersionConfig {
    /// Sources in report order: JSON manifests, Cargo manifests, then the tag.
    pub fn sources(&self, tag: bool, repo: &Path) -> Vec<VersionSource> {
        let mut sources: Vec<VersionSource> = self
            .json
            .iter()
            .cloned()
            .map(VersionSource::JsonManifest)
            .chain(self.cargo.iter().cloned().map(VersionSource::CargoManifest))
            .collect();
        if tag {
            sources.push(VersionSource::GitTag {
                repo: repo.to_path_buf(),
            });
        }
        sources
    }
}

/// Bundling and staging.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BundleConfig {
    /// Explicit esbuild executable.
    pub esbuild: Option<PathBuf>,
    /// Disposable staging directory.
    pub staging_dir: PathBuf,
    /// Bundle file name inside the staging directory.
    pub bundle_name: String,
    /// Emit source maps.
    pub sourcemap: bool,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            esbuild: None,
            staging_dir: DEFAULT_STAGING_DIR.into(),
            bundle_name: DEFAULT_BUNDLE_NAME.into(),
            sourcemap: true,
        }
    }
}

/// Release download location.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct InstallSection {
    /// Host serving releases.
    pub release_host: String,
    /// `{owner}/{repo}`.
    pub project: String,
    /// Asset name prefix.
    pub artifact_name: String,
}

impl Default for InstallSection {
    fn default() -> Self {
        Self {
            release_host: DEFAULT_RELEASE_HOST.into(),
            project: DEFAULT_PROJECT.into(),
            artifact_name: DEFAULT_ARTIFACT_NAME.into(),
        }
    }
}

impl InstallSection {
    /// Install configuration for the package at `package_dir`.
    pub fn to_install_config(&self, package_dir: PathBuf, with_types: bool) -> InstallConfig {
        InstallConfig {
            package_dir,
            release_host: self.release_host.clone(),
            project: self.project.clone(),
            artifact_name: self.artifact_name.clone(),
            with_types,
        }
    }
}

/// Artifact collection.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CollectConfig {
    /// Root of downloaded CI artifacts.
    pub artifacts_dir: PathBuf,
    /// Directory holding the npm platform packages.
    pub npm_dir: PathBuf,
    /// File name prefix of collectable binaries.
    pub binary_prefix: String,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: "artifacts".into(),
            npm_dir: "npm".into(),
            binary_prefix: DEFAULT_BINARY_PREFIX.into(),
        }
    }
}

impl ReleaseConfig {
    /// Loads `path`, or `lumea-release.toml` from the current directory.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(CONFIG_FILE);
                if !default.is_file() {
                    log::debug!("No {} found, using defaults", CONFIG_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };

        let raw = std::fs::read_to_string(&path).map_err(|e| {
            ReleaseError::Cli(CliError::ExecutionFailed {
                command: "read_config".to_string(),
                reason: format!("Failed to read {}: {}", path.display(), e),
            })
        })?;
        Self::parse(&raw).map_err(|e| {
            ReleaseError::Cli(CliError::ExecutionFailed {
                command: "parse_config".to_string(),
                reason: format!("Failed to parse {}: {}", path.display(), e),
            })
        })
    }

    /// Parses configuration text.
    pub fn parse(raw: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}
