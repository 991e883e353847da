//! `collect`: place CI artifacts into npm platform packages.

use crate::{
    cli::{CollectArgs, RuntimeConfig},
    config::ReleaseConfig,
    error::Result,
    release::collect::collect,
};

pub(super) async fn execute(
    args: CollectArgs,
    config: &ReleaseConfig,
    runtime: &RuntimeConfig,
) -> Result<i32> {
    let artifacts = args
        .artifacts
        .unwrap_or_else(|| config.collect.artifacts_dir.clone());
    let npm = args.npm.unwrap_or_else(|| config.collect.npm_dir.clone());
    let prefix = args
        .prefix
        .unwrap_or_else(|| config.collect.binary_prefix.clone());

    runtime.progress(&format!(
        "Collecting {} into {}",
        artifacts.display(),
        npm.display()
    ))?;
    let report = collect(&artifacts, &npm, &prefix).await?;

    for artifact in &report.collected {
        runtime.indent(&format!(
            "{} -> {}",
            artifact.file_name,
            artifact.target_dir.display()
        ))?;
    }
    for skipped in &report.skipped {
        runtime.warn(&format!("Skipped {} (no `{}` prefix)", skipped.display(), prefix))?;
    }
    runtime.success(&format!(
        "Collected {} artifact(s), skipped {}",
        report.collected.len(),
        report.skipped.len()
    ))?;
    Ok(0)
}
