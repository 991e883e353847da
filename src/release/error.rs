//! Error types for release operations.
//!
//! Every failure a release tool can hit is a variant here. The CLI layer wraps
//! these in [`crate::error::ReleaseError`] and turns any of them into exit code 1.

use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
};
use thiserror::Error as DeriveError;

/// Result type for release operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A single `(source, version)` pair reported by the version guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionReading {
    /// Human readable source label, e.g. `package/package.json` or `git tag`.
    pub source: String,
    /// Normalized (`v`-prefixed) version.
    pub version: String,
}

/// Errors returned by release operations.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// Manifests and/or tag disagree on the version.
    #[error("{readings}")]
    VersionMismatch {
        /// Every source that was read, in configuration order.
        readings: VersionReadings,
    },

    /// A Cargo manifest has no `version` field we know how to read.
    #[error("no version field found in {}", .path.display())]
    VersionNotFound {
        /// Manifest that was searched.
        path: PathBuf,
    },

    /// A tag was requested but `git describe` found none.
    #[error("git tag requested but no tag is reachable from HEAD: {reason}")]
    TagNotFound {
        /// Output from git.
        reason: String,
    },

    /// OS/arch combination without a Lumea build.
    #[error("Lumea builds are not available on platform: {platform}")]
    UnsupportedPlatform {
        /// The platform (and arch, when relevant) that was rejected.
        platform: String,
    },

    /// Build triple does not have 2 to 4 dash-separated segments.
    #[error("invalid build triple `{triple}`: {reason}")]
    InvalidTriple {
        /// Raw triple.
        triple: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No npm sub-package directory matches the artifact's registry id.
    #[error("no npm target directory matching `{registry_id}` for {}", .artifact.display())]
    NoMatchingTarget {
        /// Artifact being collected.
        artifact: PathBuf,
        /// Registry id that was looked for.
        registry_id: String,
    },

    /// Network failure or unexpected HTTP response.
    #[error("download of {url} failed: {reason}")]
    Download {
        /// URL that was requested.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// External process exited unsuccessfully.
    #[error("{program} exited with {code}\n{stdout}{stderr}")]
    ExternalProcess {
        /// Program that was run.
        program: String,
        /// Exit code, if the process was not killed by a signal.
        code: ExitCode,
        /// Captured stdout.
        stdout: String,
        /// Captured stderr.
        stderr: String,
    },

    /// A required external tool could not be located.
    #[error("{tool} not found: {hint}")]
    ToolNotFound {
        /// Tool name.
        tool: String,
        /// How to make it available.
        hint: String,
    },

    /// Failed to spawn a command.
    #[error("failed to run `{command}`: {error}")]
    CommandFailed {
        /// Command name.
        command: String,
        /// Spawn error.
        error: std::io::Error,
    },

    /// File has no `ASST` footer.
    #[error("no embedded assets found in {}", .path.display())]
    NoEmbeddedAssets {
        /// Inspected file.
        path: PathBuf,
    },

    /// Filesystem error with the operation and path attached.
    #[error("{context} {}: {error}", .path.display())]
    Fs {
        /// What we were doing.
        context: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        error: std::io::Error,
    },

    /// Plain IO error.
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error.
    #[error("{0}")]
    Toml(#[from] toml::de::Error),

    /// TOML document error.
    #[error("{0}")]
    TomlEdit(#[from] toml_edit::TomlError),

    /// Zip archive error.
    #[error("{0}")]
    Zip(#[from] zip::result::ZipError),

    /// HTTP client error.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// URL parse error.
    #[error("{0}")]
    Url(#[from] url::ParseError),

    /// Semver parse error.
    #[error("{0}")]
    Semver(#[from] semver::Error),

    /// Path prefix error.
    #[error("{0}")]
    StripPrefix(#[from] std::path::StripPrefixError),

    /// Directory walk error.
    #[error("{0}")]
    WalkDir(#[from] walkdir::Error),

    /// Anything else.
    #[error("{0}")]
    GenericError(String),
}

/// Exit code of an external process; `None` when it was killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub Option<i32>);

impl From<std::process::ExitStatus> for ExitCode {
    fn from(status: std::process::ExitStatus) -> Self {
        Self(status.code())
    }
}

impl Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("no exit code (terminated by signal)"),
        }
    }
}

/// All readings taken by one version check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionReadings(pub Vec<VersionReading>);

impl VersionReadings {
    /// First reading whose version differs from the first source.
    pub fn first_mismatch(&self) -> Option<&VersionReading> {
        let reference = self.0.first()?;
        self.0.iter().find(|r| r.version != reference.version)
    }
}

impl Display for VersionReadings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "❌ Version mismatch:")?;
        let width = self
            .0
            .iter()
            .map(|r| r.source.len() + 1)
            .max()
            .unwrap_or(0);
        for reading in &self.0 {
            let label = format!("{}:", reading.source);
            writeln!(f, "  {label:<width$} {}", reading.version)?;
        }
        if let (Some(reference), Some(other)) = (self.0.first(), self.first_mismatch()) {
            write!(
                f,
                "{} ({}) differs from {} ({})",
                other.source, other.version, reference.source, reference.version
            )?;
        }
        Ok(())
    }
}

/// Attaches filesystem context to IO results.
pub trait ErrorExt<T> {
    /// Wraps the error in [`Error::Fs`] with `context` and `path`.
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Adds a message to failures and missing values.
pub trait Context<T> {
    /// Converts the failure into [`Error::GenericError`] prefixed by `msg`.
    fn context<C: Display>(self, msg: C) -> Result<T>;
}

impl<T, E: Display> Context<T> for std::result::Result<T, E> {
    fn context<C: Display>(self, msg: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{msg}: {e}")))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display>(self, msg: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(msg.to_string()))
    }
}

/// Returns early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::release::Error::GenericError(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(source: &str, version: &str) -> VersionReading {
        VersionReading {
            source: source.to_string(),
            version: version.to_string(),
        }
    }

    #[test]
    fn mismatch_lists_every_source_and_names_the_odd_one() {
        let err = Error::VersionMismatch {
            readings: VersionReadings(vec![
                reading("package/package.json", "v1.2.0"),
                reading("core/Cargo.toml", "v1.2.0"),
                reading("git tag", "v1.2.1"),
            ]),
        };
        let text = err.to_string();
        assert!(text.contains("package/package.json: v1.2.0"));
        assert!(text.contains("git tag:              v1.2.1"));
        assert!(text.ends_with("git tag (v1.2.1) differs from package/package.json (v1.2.0)"));
    }

    #[test]
    fn fs_context_keeps_path() {
        let res: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = res.fs_context("reading manifest", "npm/linux-x64/package.json").unwrap_err();
        assert_eq!(err.to_string(), "reading manifest npm/linux-x64/package.json: gone");
    }

    #[test]
    fn external_process_shows_output_verbatim() {
        let err = Error::ExternalProcess {
            program: "packer".into(),
            code: ExitCode(Some(3)),
            stdout: "out\n".into(),
            stderr: "boom\n".into(),
        };
        assert_eq!(err.to_string(), "packer exited with exit code 3\nout\nboom\n");
    }
}
