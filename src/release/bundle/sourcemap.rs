//! Source map path rewriting.
//!
//! esbuild writes `sources` relative to the map file's directory. Stack
//! traces are resolved from the directory the build was started in, so the
//! entries are rewritten to be relative to that directory instead.

use crate::release::{
    error::{Context, ErrorExt, Result},
    utils::fs::{relative_to, to_slash},
};
use path_absolutize::Absolutize;
use serde_json::Value;
use std::path::Path;

/// Rewrites the `sources` array of the map at `map_path` to be relative to `cwd`.
///
/// Returns the number of entries changed. Entries that are URLs or already
/// absolute are left alone.
pub async fn rewrite_sources(map_path: &Path, cwd: &Path) -> Result<usize> {
    let raw = tokio::fs::read_to_string(map_path)
        .await
        .fs_context("reading source map", map_path)?;
    let mut map: Value = serde_json::from_str(&raw)?;

    let map_dir = map_path
        .parent()
        .context("source map path has no parent directory")?
        .absolutize()
        .fs_context("resolving source map directory", map_path)?
        .into_owned();
    let cwd = cwd
        .absolutize()
        .fs_context("resolving working directory", cwd)?
        .into_owned();

    let mut changed = 0;
    if let Some(sources) = map.get_mut("sources").and_then(Value::as_array_mut) {
        for source in sources.iter_mut() {
            let Some(current) = source.as_str() else {
                continue;
            };
            if current.contains("://") || Path::new(current).is_absolute() {
                continue;
            }
            let absolute = map_dir
                .join(current)
                .absolutize()
                .fs_context("resolving source path", current)?
                .into_owned();
            let rewritten = to_slash(&relative_to(&absolute, &cwd));
            if rewritten != current {
                *source = Value::String(rewritten);
                changed += 1;
            }
        }
    }

    tokio::fs::write(map_path, serde_json::to_vec(&map)?)
        .await
        .fs_context("writing source map", map_path)?;
    log::debug!("Rewrote {} source map entries in {}", changed, map_path.display());
    Ok(changed)
}
