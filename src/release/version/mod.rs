//! Version consistency across manifests and the git tag.
//!
//! Lumea publishes an npm package, an API package and a Rust core from one
//! repository. Before a push they must all carry the same version, and a
//! release bump rewrites all of them at once.

use crate::release::error::{Error, ErrorExt, Result, VersionReading, VersionReadings};
use std::path::{Path, PathBuf};

/// Label used for the git tag in reports.
pub const GIT_TAG_LABEL: &str = "git tag";

/// One place a version is read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionSource {
    /// `version` field of a `package.json`.
    JsonManifest(PathBuf),
    /// `package.version` (or `workspace.package.version`) of a `Cargo.toml`.
    CargoManifest(PathBuf),
    /// Most recent tag reachable from `HEAD` in `repo`.
    GitTag {
        /// Working directory `git` runs in.
        repo: PathBuf,
    },
}

impl VersionSource {
    /// Human readable name used in mismatch reports.
    pub fn label(&self) -> String {
        match self {
            Self::JsonManifest(path) | Self::CargoManifest(path) => {
                path.display().to_string().replace('\\', "/")
            }
            Self::GitTag { .. } => GIT_TAG_LABEL.to_string(),
        }
    }
}

/// Prefixes `version` with `v` unless it already has one.
pub fn normalize_version(version: &str) -> String {
    let version = version.trim();
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{version}")
    }
}

/// Outcome of a successful check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionReport {
    /// The agreed, `v`-prefixed version.
    pub version: String,
    /// Every source that was read.
    pub readings: VersionReadings,
}

/// Reads the raw version from a single source.
pub async fn read_version(source: &VersionSource) -> Result<String> {
    match source {
        VersionSource::JsonManifest(path) => read_json_version(path).await,
        VersionSource::CargoManifest(path) => read_cargo_version(path).await,
        VersionSource::GitTag { repo } => read_git_tag(repo).await,
    }
}

async fn read_json_version(path: &Path) -> Result<String> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .fs_context("reading manifest", path)?;
    let manifest: serde_json::Value = serde_json::from_str(&raw)?;
    manifest
        .get("version")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| Error::VersionNotFound {
            path: path.to_path_buf(),
        })
}

async fn read_cargo_version(path: &Path) -> Result<String> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .fs_context("reading manifest", path)?;
    let manifest: toml::Table = toml::from_str(&raw)?;

    let package_version = |table: Option<&toml::Value>| {
        table
            .and_then(|t| t.get("version"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    package_version(manifest.get("package"))
        .or_else(|| {
            package_version(
                manifest
                    .get("workspace")
                    .and_then(|w| w.get("package")),
            )
        })
        .ok_or_else(|| Error::VersionNotFound {
            path: path.to_path_buf(),
        })
}

async fn read_git_tag(repo: &Path) -> Result<String> {
    let output = tokio::process::Command::new("git")
        .args(["describe", "--tags", "--abbrev=0"])
        .current_dir(repo)
        .output()
        .await
        .map_err(|error| Error::CommandFailed {
            command: "git describe --tags --abbrev=0".into(),
            error,
        })?;

    if !output.status.success() {
        return Err(Error::TagNotFound {
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    let tag = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if tag.is_empty() {
        return Err(Error::TagNotFound {
            reason: "git describe printed nothing".into(),
        });
    }
    Ok(tag)
}

/// Checks that every reading carries the same normalized version.
pub fn compare(readings: Vec<VersionReading>) -> Result<VersionReport> {
    let readings = VersionReadings(readings);
    let Some(first) = readings.0.first() else {
        return Err(Error::GenericError("no version sources configured".into()));
    };
    let version = first.version.clone();

    if readings.first_mismatch().is_some() {
        return Err(Error::VersionMismatch { readings });
    }
    Ok(VersionReport { version, readings })
}

/// Reads all `sources` in order and checks that they agree.
pub async fn check_versions(sources: &[VersionSource]) -> Result<VersionReport> {
    let mut readings = Vec::with_capacity(sources.len());
    for source in sources {
        let version = normalize_version(&read_version(source).await?);
        log::debug!("{}: {}", source.label(), version);
        readings.push(VersionReading {
            source: source.label(),
            version,
        });
    }
    compare(readings)
}

/// Parses a version given on the command line, accepting a leading `v`.
pub fn parse_release_version(raw: &str) -> Result<semver::Version> {
    let raw = raw.trim();
    let bare = raw.strip_prefix('v').unwrap_or(raw);
    Ok(semver::Version::parse(bare)?)
}

/// Writes `version` into every manifest in `sources`.
///
/// Git tags are read-only and skipped. Returns the files that were written.
pub async fn write_version(sources: &[VersionSource], version: &semver::Version) -> Result<Vec<PathBuf>> {
    let version = version.to_string();
    let mut written = Vec::new();

    for source in sources {
        let path = match source {
            VersionSource::JsonManifest(path) => {
                write_json_version(path, &version).await?;
                path
            }
            VersionSource::CargoManifest(path) => {
                write_cargo_version(path, &version).await?;
                path
            }
            VersionSource::GitTag { .. } => {
                log::debug!("Skipping git tag, it is read-only");
                continue;
            }
        };
        log::info!("✓ Set version {} in {}", version, source.label());
        written.push(path.clone());
    }

    Ok(written)
}

async fn write_json_version(path: &Path, version: &str) -> Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .fs_context("reading manifest", path)?;
    let mut manifest: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&raw)?;
    manifest.insert("version".into(), serde_json::Value::String(version.into()));

    let mut out = serde_json::to_string_pretty(&manifest)?;
    out.push('\n');
    tokio::fs::write(path, out)
        .await
        .fs_context("writing manifest", path)
}

async fn write_cargo_version(path: &Path, version: &str) -> Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .fs_context("reading manifest", path)?;
    let mut doc: toml_edit::DocumentMut = raw.parse()?;

    let has_version = |item: Option<&toml_edit::Item>| {
        item.and_then(|t| t.get("version"))
            .and_then(|v| v.as_str())
            .is_some()
    };

    let table = if has_version(doc.get("package")) {
        doc.get_mut("package")
    } else if has_version(doc.get("workspace").and_then(|w| w.get("package"))) {
        doc.get_mut("workspace").and_then(|w| w.get_mut("package"))
    } else {
        None
    };
    let Some(field) = table
        .and_then(|t| t.get_mut("version"))
        .and_then(|v| v.as_value_mut())
    else {
        return Err(Error::VersionNotFound {
            path: path.to_path_buf(),
        });
    };

    let decor = field.decor().clone();
    *field = toml_edit::Value::from(version);
    *field.decor_mut() = decor;

    tokio::fs::write(path, doc.to_string())
        .await
        .fs_context("writing manifest", path)
}
