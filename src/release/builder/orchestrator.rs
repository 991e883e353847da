//! Packaging orchestration.
//!
//! This module provides the [`Packager`] that runs the whole chain for one
//! artifact: stage the app, pack it into the launcher, clean up, and report
//! size and checksum.

use super::{
    checksum::calculate_sha256,
    pack::Packer,
    stage::{StageRequest, stage},
};
use crate::release::{
    bundle::{BundleOptions, Esbuild},
    error::{Error, ErrorExt, Result},
    utils::fs::remove_dir_all,
};
use std::path::{Path, PathBuf};

/// Staging directory used when none is configured.
pub const DEFAULT_STAGING_DIR: &str = ".lumea/tmp";

/// Bundle file name the launcher looks for inside its embedded archive.
pub const DEFAULT_BUNDLE_NAME: &str = "bundle.js";

/// Inputs for one packaging run.
#[derive(Clone, Debug)]
pub struct PackageSettings {
    /// Platform launcher binary to copy.
    pub launcher: PathBuf,
    /// What to stage.
    pub request: StageRequest,
    /// Disposable staging directory.
    pub staging_dir: PathBuf,
    /// Name of the bundled script inside the staging directory.
    pub bundle_name: String,
    /// Final artifact path.
    pub output: PathBuf,
    /// Bundler options.
    pub bundle_options: BundleOptions,
    /// esbuild executable.
    pub esbuild: Esbuild,
    /// Packing strategy.
    pub packer: Packer,
    /// Leave the staging directory in place after a successful pack.
    pub keep_staging: bool,
}

/// A finished artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedArtifact {
    /// Where it was written.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Hex SHA-256.
    pub checksum: String,
}

/// Runs stage, pack and cleanup for one artifact.
#[derive(Debug)]
pub struct Packager {
    settings: PackageSettings,
}

impl Packager {
    /// Creates a packager for `settings`.
    pub fn new(settings: PackageSettings) -> Self {
        Self { settings }
    }

    /// Returns the settings.
    pub fn settings(&self) -> &PackageSettings {
        &self.settings
    }

    /// Produces the packed artifact.
    ///
    /// The staging directory is removed after a successful pack. When packing
    /// fails it is left in place for inspection.
    pub async fn package(&self) -> Result<PackedArtifact> {
        let settings = &self.settings;

        if !settings.launcher.is_file() {
            return Err(Error::GenericError(format!(
                "launcher binary {} does not exist",
                settings.launcher.display()
            )));
        }

        log::info!("Staging into {}", settings.staging_dir.display());
        let staged = stage(
            &settings.request,
            &settings.staging_dir,
            &settings.bundle_name,
            &settings.esbuild,
            &settings.bundle_options,
        )
        .await?;
        if log::log_enabled!(log::Level::Debug) {
            if let Some(sha) = staged_digest(&staged.dir).await {
                log::debug!("Staged tree sha256: {}", sha);
            }
        }

        log::info!(
            "Packing {} into {}",
            settings.launcher.display(),
            settings.output.display()
        );
        if let Err(e) = settings
            .packer
            .pack(&settings.launcher, &staged.dir, &settings.output)
            .await
        {
            log::warn!(
                "Packing failed; staging directory kept at {}",
                staged.dir.display()
            );
            return Err(e);
        }

        if settings.keep_staging {
            log::info!("Keeping staging directory {}", staged.dir.display());
        } else if let Err(e) = remove_dir_all(&staged.dir).await {
            log::warn!("Failed to clean up staging directory: {}", e);
        }

        let size = tokio::fs::metadata(&settings.output)
            .await
            .fs_context("reading artifact metadata", &settings.output)?
            .len();
        let checksum = calculate_sha256(&settings.output).await?;

        Ok(PackedArtifact {
            path: settings.output.clone(),
            size,
            checksum,
        })
    }
}

/// Digest of the staged tree for diagnostics. A failure is only logged.
async fn staged_digest(dir: &Path) -> Option<String> {
    match calculate_sha256(dir).await {
        Ok(sha) => Some(sha),
        Err(e) => {
            log::warn!("Could not hash staged tree {}: {}", dir.display(), e);
            None
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::release::builder::{pack::embedded_entries, stage::tests::fake_esbuild};

    fn app(root: &std::path::Path) -> PathBuf {
        let app = root.join("app");
        std::fs::create_dir_all(app.join("assets")).unwrap();
        std::fs::write(app.join("index.js"), "export const x = 1;").unwrap();
        std::fs::write(app.join("assets/style.css"), "body{}").unwrap();
        std::fs::write(root.join("launcher"), "launcher-bytes").unwrap();
        app
    }

    fn settings(root: &std::path::Path, packer: Packer) -> PackageSettings {
        PackageSettings {
            launcher: root.join("launcher"),
            request: StageRequest::explicit(root.join("app/assets"), root.join("app/index.js")),
            staging_dir: root.join(".lumea/tmp"),
            bundle_name: DEFAULT_BUNDLE_NAME.into(),
            output: root.join("dist/lumea-app"),
            bundle_options: BundleOptions::embedded_esm(),
            esbuild: fake_esbuild(root),
            packer,
            keep_staging: false,
        }
    }

    #[tokio::test]
    async fn packages_and_removes_staging() {
        let tmp = tempfile::tempdir().unwrap();
        app(tmp.path());

        let artifact = Packager::new(settings(tmp.path(), Packer::Embedded))
            .package()
            .await
            .unwrap();

        assert_eq!(artifact.path, tmp.path().join("dist/lumea-app"));
        assert_eq!(artifact.size, std::fs::metadata(&artifact.path).unwrap().len());
        assert_eq!(artifact.checksum.len(), 64);
        assert!(!tmp.path().join(".lumea/tmp").exists());
        assert_eq!(
            embedded_entries(&artifact.path).unwrap(),
            vec!["assets/style.css", "bundle.js", "bundle.js.map"]
        );
    }

    #[tokio::test]
    async fn failed_pack_keeps_staging() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        app(tmp.path());
        let packer = tmp.path().join("broken-packer");
        std::fs::write(&packer, "#!/bin/sh\nexit 1\n").unwrap();
        std::fs::set_permissions(&packer, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = Packager::new(settings(tmp.path(), Packer::External { program: packer }))
            .package()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ExternalProcess { .. }));
        assert!(tmp.path().join(".lumea/tmp/bundle.js").exists());
        assert!(!tmp.path().join("dist/lumea-app").exists());
    }

    #[tokio::test]
    async fn staged_digest_failure_is_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(staged_digest(&tmp.path().join("gone")).await, None);

        std::fs::write(tmp.path().join("bundle.js"), "x").unwrap();
        assert!(staged_digest(tmp.path()).await.is_some());
    }

    #[tokio::test]
    async fn missing_launcher_fails_before_staging() {
        let tmp = tempfile::tempdir().unwrap();
        app(tmp.path());
        std::fs::remove_file(tmp.path().join("launcher")).unwrap();

        let err = Packager::new(settings(tmp.path(), Packer::Embedded))
            .package()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(!tmp.path().join(".lumea/tmp").exists());
    }
}
