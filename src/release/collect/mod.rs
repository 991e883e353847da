//! Distribution of CI build artifacts into npm platform packages.
//!
//! CI uploads one launcher per target triple, named `core-{triple}[.exe]`.
//! Each one belongs to the `npm/{platform}-{arch}[-{abi}]` sub-package whose
//! directory name contains the triple's registry id. The binary is copied
//! there and its file name is added to the sub-package's `files` list.

use crate::release::{
    error::{Error, ErrorExt, Result},
    platform::{BuildTriple, RegistryId},
    utils::fs::copy_file,
};
use serde::Serialize;
use serde_json::{Map, Value, ser::PrettyFormatter};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tokio::task::JoinSet;

/// File name prefix of collectable launchers.
pub const DEFAULT_BINARY_PREFIX: &str = "core-";

/// Directory never descended into while looking for artifacts.
const SKIPPED_DIR: &str = "node_modules";

/// One artifact that was placed into a platform package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectedArtifact {
    /// Original location under the artifacts root.
    pub source: PathBuf,
    /// Platform package directory it was copied into.
    pub target_dir: PathBuf,
    /// File name, as added to `files`.
    pub file_name: String,
    /// Registry id derived from the triple.
    pub registry_id: RegistryId,
}

/// What a collector run did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectReport {
    /// Artifacts copied, grouped by target directory.
    pub collected: Vec<CollectedArtifact>,
    /// Files that do not carry the binary prefix.
    pub skipped: Vec<PathBuf>,
}

/// Returns the triple encoded in an artifact file name, or `None` when the
/// last `.`-separated term of its stem does not start with `prefix`.
///
/// `core-x86_64-pc-windows-msvc.exe` yields `x86_64-pc-windows-msvc`.
pub fn artifact_triple<'a>(path: &'a Path, prefix: &str) -> Option<&'a str> {
    let stem = path.file_stem()?.to_str()?;
    let term = stem.rsplit('.').next()?;
    term.strip_prefix(prefix).filter(|t| !t.is_empty())
}

/// Lists every file under `root`, skipping `node_modules`, in path order.
pub async fn find_artifacts(root: &Path) -> Result<Vec<PathBuf>> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = walkdir::WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(e.file_type().is_dir() && e.file_name() == SKIPPED_DIR));
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    })
    .await
    .map_err(|e| Error::GenericError(format!("Artifact scan panicked: {}", e)))?
}

/// Sorted names of the platform package directories under `npm_root`.
async fn target_dirs(npm_root: &Path) -> Result<Vec<String>> {
    let mut dirs = Vec::new();
    let mut entries = tokio::fs::read_dir(npm_root)
        .await
        .fs_context("reading npm directory", npm_root)?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .fs_context("reading npm directory", npm_root)?
    {
        let is_dir = entry
            .file_type()
            .await
            .fs_context("reading file type of", entry.path())?
            .is_dir();
        if is_dir {
            dirs.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    dirs.sort();
    log::debug!("Platform packages: {:?}", dirs);
    Ok(dirs)
}

/// Adds `file_name` to the `files` array of the manifest at `manifest_path`.
///
/// The array is created when missing. Returns `false` if the name was
/// already listed. The manifest is rewritten with 4-space indentation.
pub async fn add_to_files(manifest_path: &Path, file_name: &str) -> Result<bool> {
    let raw = tokio::fs::read_to_string(manifest_path)
        .await
        .fs_context("reading package manifest", manifest_path)?;
    let mut manifest: Map<String, Value> = serde_json::from_str(&raw)?;

    let files = manifest
        .entry("files")
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| {
            Error::GenericError(format!(
                "`files` in {} is not an array",
                manifest_path.display()
            ))
        })?;

    if files.iter().any(|f| f.as_str() == Some(file_name)) {
        log::debug!("{} already lists {}", manifest_path.display(), file_name);
        return Ok(false);
    }
    files.push(Value::String(file_name.to_string()));

    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    manifest.serialize(&mut ser)?;
    out.push(b'\n');

    tokio::fs::write(manifest_path, out)
        .await
        .fs_context("writing package manifest", manifest_path)?;
    Ok(true)
}

/// Copies one artifact into `target_dir` and records it in the manifest.
async fn place(artifact: &Path, target_dir: &Path) -> Result<String> {
    let file_name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::GenericError(format!("{} has no file name", artifact.display())))?;

    let dest = target_dir.join(&file_name);
    log::info!("Copying {} -> {}", artifact.display(), dest.display());
    copy_file(artifact, &dest).await?;

    add_to_files(&target_dir.join("package.json"), &file_name).await?;
    Ok(file_name)
}

/// Distributes every artifact under `artifacts_root` into its platform package
/// under `npm_root`.
///
/// Artifacts headed for the same package are handled one after another so
/// that manifest updates never race. Different packages are updated
/// concurrently.
pub async fn collect(artifacts_root: &Path, npm_root: &Path, prefix: &str) -> Result<CollectReport> {
    let dirs = target_dirs(npm_root).await?;
    let mut report = CollectReport::default();
    let mut groups: BTreeMap<PathBuf, Vec<(PathBuf, RegistryId)>> = BTreeMap::new();

    for artifact in find_artifacts(artifacts_root).await? {
        let Some(triple) = artifact_triple(&artifact, prefix) else {
            log::warn!(
                "[{}] is not matched with [{}], skip",
                artifact.display(),
                prefix
            );
            report.skipped.push(artifact);
            continue;
        };

        let registry_id = BuildTriple::parse(triple)?.registry_id();
        let id = registry_id.to_string();
        let dir = dirs
            .iter()
            .find(|d| d.contains(&id))
            .ok_or_else(|| Error::NoMatchingTarget {
                artifact: artifact.clone(),
                registry_id: id.clone(),
            })?;
        log::debug!("{} -> {} ({})", artifact.display(), dir, id);

        groups
            .entry(npm_root.join(dir))
            .or_default()
            .push((artifact, registry_id));
    }

    let mut tasks = JoinSet::new();
    for (target_dir, artifacts) in groups {
        tasks.spawn(async move {
            let mut placed = Vec::with_capacity(artifacts.len());
            for (source, registry_id) in artifacts {
                let file_name = place(&source, &target_dir).await?;
                placed.push(CollectedArtifact {
                    source,
                    target_dir: target_dir.clone(),
                    file_name,
                    registry_id,
                });
            }
            Ok::<_, Error>(placed)
        });
    }

    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(placed)) => report.collected.extend(placed),
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(e) => {
                first_error.get_or_insert(Error::GenericError(format!(
                    "Collector task failed: {}",
                    e
                )));
            }
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    report
        .collected
        .sort_by(|a, b| (&a.target_dir, &a.source).cmp(&(&b.target_dir, &b.source)));
    Ok(report)
}
