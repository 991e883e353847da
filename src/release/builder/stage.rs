//! Asset staging.
//!
//! Builds the directory that gets embedded into the launcher: the bundled
//! script (plus source map) at the top level and a copy of the app's static
//! assets under `assets/`. Staging is never incremental; the output
//! directory is wiped and rebuilt on every run.

use crate::release::{
    bundle::{BundleOptions, Esbuild, sourcemap_path},
    error::{ErrorExt, Result},
    utils::fs::{copy_dir, create_dir_all},
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Entry file used when the manifest has no `main`.
pub const DEFAULT_ENTRY: &str = "index.js";

/// Name of the assets directory, both in the app and in the staging directory.
pub const ASSETS_DIR: &str = "assets";

#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    main: Option<String>,
}

/// Reads the `main` field of `dir/package.json`, defaulting to `index.js`.
pub async fn read_main_entry(dir: &Path) -> Result<String> {
    let manifest_path = dir.join("package.json");
    if !manifest_path.is_file() {
        log::debug!("No package.json in {}, using {}", dir.display(), DEFAULT_ENTRY);
        return Ok(DEFAULT_ENTRY.to_string());
    }
    let raw = tokio::fs::read_to_string(&manifest_path)
        .await
        .fs_context("reading package manifest", &manifest_path)?;
    let manifest: PackageManifest = serde_json::from_str(&raw)?;
    Ok(manifest
        .main
        .filter(|main| !main.is_empty())
        .unwrap_or_else(|| DEFAULT_ENTRY.to_string()))
}

/// What to stage: an assets tree and a script entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageRequest {
    /// Directory copied to `{staging}/assets`.
    pub assets_dir: PathBuf,
    /// Script handed to the bundler.
    pub entry: PathBuf,
}

impl StageRequest {
    /// Stages an app directory: `dir/assets` and `dir/{package.json main}`.
    pub async fn from_source_dir(dir: &Path) -> Result<Self> {
        Self::resolve(dir, None, None).await
    }

    /// Fills whatever was not given explicitly from the app directory `dir`.
    ///
    /// `package.json` is only read when `entry` is absent.
    pub async fn resolve(
        dir: &Path,
        assets_dir: Option<PathBuf>,
        entry: Option<PathBuf>,
    ) -> Result<Self> {
        let entry = match entry {
            Some(entry) => entry,
            None => dir.join(read_main_entry(dir).await?),
        };
        Ok(Self {
            assets_dir: assets_dir.unwrap_or_else(|| dir.join(ASSETS_DIR)),
            entry,
        })
    }

    /// Stages an explicitly given assets directory and entry script.
    pub fn explicit(assets_dir: impl Into<PathBuf>, entry: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            entry: entry.into(),
        }
    }
}

/// Result of a staging run.
#[derive(Clone, Debug)]
pub struct StagedBundle {
    /// Staging directory.
    pub dir: PathBuf,
    /// Bundled script inside `dir`.
    pub script: PathBuf,
    /// Source map inside `dir`, when one was written.
    pub sourcemap: Option<PathBuf>,
}

/// Recreates `output_dir`, copies assets into it and bundles the entry script.
pub async fn stage(
    request: &StageRequest,
    output_dir: &Path,
    bundle_name: &str,
    esbuild: &Esbuild,
    options: &BundleOptions,
) -> Result<StagedBundle> {
    create_dir_all(output_dir, true).await?;
    let assets_out = output_dir.join(ASSETS_DIR);
    create_dir_all(&assets_out, false).await?;

    if request.assets_dir.is_dir() {
        log::info!(
            "Copying assets {} -> {}",
            request.assets_dir.display(),
            assets_out.display()
        );
        copy_dir(&request.assets_dir, &assets_out).await?;
    } else {
        log::warn!(
            "Assets directory {} not found, staging without static assets",
            request.assets_dir.display()
        );
    }

    let script = output_dir.join(bundle_name);
    esbuild.bundle(&request.entry, &script, options).await?;

    let map = sourcemap_path(&script);
    let sourcemap = (options.sourcemap && map.is_file()).then_some(map);

    Ok(StagedBundle {
        dir: output_dir.to_path_buf(),
        script,
        sourcemap,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[tokio::test]
    async fn main_entry_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(read_main_entry(tmp.path()).await.unwrap(), "index.js");

        std::fs::write(tmp.path().join("package.json"), r#"{"name":"app"}"#).unwrap();
        assert_eq!(read_main_entry(tmp.path()).await.unwrap(), "index.js");

        std::fs::write(tmp.path().join("package.json"), r#"{"main":"src/app.js"}"#).unwrap();
        assert_eq!(read_main_entry(tmp.path()).await.unwrap(), "src/app.js");
    }

    #[tokio::test]
    async fn explicit_entry_skips_the_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("package.json"), "{ not json").unwrap();
        assert!(StageRequest::from_source_dir(tmp.path()).await.is_err());

        let request = StageRequest::resolve(tmp.path(), None, Some("web/main.js".into()))
            .await
            .unwrap();
        assert_eq!(request.entry, PathBuf::from("web/main.js"));
        assert_eq!(request.assets_dir, tmp.path().join("assets"));

        let request =
            StageRequest::resolve(tmp.path(), Some("static".into()), Some("main.js".into()))
                .await
                .unwrap();
        assert_eq!(request, StageRequest::explicit("static", "main.js"));
    }

    /// Writes a stand-in for esbuild that copies the entry to `--outfile` and
    /// emits a map whose sources are relative to the output directory.
    #[cfg(unix)]
    pub(crate) fn fake_esbuild(dir: &Path) -> Esbuild {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-esbuild");
        std::fs::write(
            &script,
            r#"#!/bin/sh
entry="$1"
for arg in "$@"; do
  case "$arg" in
    --outfile=*) out="${arg#--outfile=}" ;;
  esac
done
cat "$entry" > "$out"
printf '{"version":3,"sources":["%s"],"mappings":""}' "$entry" > "$out.map"
"#,
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        Esbuild::new(script)
    }

    #[cfg(unix)]
    fn tree(dir: &Path) -> Vec<(String, Vec<u8>)> {
        let mut files: Vec<(String, Vec<u8>)> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(dir).unwrap().to_string_lossy().into_owned();
                (rel, std::fs::read(e.path()).unwrap())
            })
            .collect();
        files.sort();
        files
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn staging_is_a_full_rebuild_and_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let app = tmp.path().join("app");
        std::fs::create_dir_all(app.join("assets/img")).unwrap();
        std::fs::write(app.join("package.json"), r#"{"main":"index.js"}"#).unwrap();
        std::fs::write(app.join("index.js"), "console.log('hi')").unwrap();
        std::fs::write(app.join("assets/img/logo.svg"), "<svg/>").unwrap();

        let out = tmp.path().join("stage");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("leftover.txt"), "stale").unwrap();

        let esbuild = fake_esbuild(tmp.path());
        let request = StageRequest::from_source_dir(&app).await.unwrap();
        let options = BundleOptions::embedded_esm();

        let staged = stage(&request, &out, "bundle.js", &esbuild, &options).await.unwrap();
        assert_eq!(staged.script, out.join("bundle.js"));
        assert_eq!(staged.sourcemap, Some(out.join("bundle.js.map")));
        let first = tree(&out);
        let names: Vec<&str> = first.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["assets/img/logo.svg", "bundle.js", "bundle.js.map"]);

        stage(&request, &out, "bundle.js", &esbuild, &options).await.unwrap();
        assert_eq!(tree(&out), first);
    }
}
