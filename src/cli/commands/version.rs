//! `version check` and `version set`.

use crate::{
    cli::{RuntimeConfig, VersionCommand},
    config::ReleaseConfig,
    error::{CliError, Result},
    release::version::{check_versions, parse_release_version, write_version},
};
use std::path::Path;

pub(super) async fn execute(
    command: VersionCommand,
    config: &ReleaseConfig,
    runtime: &RuntimeConfig,
) -> Result<i32> {
    match command {
        VersionCommand::Check { tag, no_tag } => {
            let tag = if tag {
                true
            } else if no_tag {
                false
            } else {
                config.version.tag
            };
            let sources = config.version.sources(tag, Path::new("."));

            let report = check_versions(&sources).await?;
            for reading in &report.readings.0 {
                runtime.verbose_println(&format!("{}: {}", reading.source, reading.version))?;
            }
            runtime.println(&format!("✅ Versions match: {}", report.version))?;
            Ok(0)
        }
        VersionCommand::Set { version } => {
            let raw = version
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| CliError::MissingArgument {
                    argument: "VERSION".to_string(),
                })?;
            let version = parse_release_version(&raw).map_err(|e| CliError::InvalidArguments {
                reason: format!("`{raw}` is not a valid version: {e}"),
            })?;

            let written = write_version(&config.version.sources(false, Path::new(".")), &version).await?;
            for path in &written {
                runtime.indent(&path.display().to_string())?;
            }
            runtime.println(&format!("✅ Version set to {version}"))?;
            Ok(0)
        }
    }
}
