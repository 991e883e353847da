//! Command line interface for lumea_release.
//!
//! This module provides argument parsing, command dispatch, and user feedback.

mod args;
pub mod commands;
mod output;

pub use args::{
    Args, BuildArgs, CollectArgs, Command, InstallArgs, PackArgs, PlatformArgs, RuntimeConfig,
    TypesArgs, VersionCommand,
};
pub use output::OutputManager;

use crate::{config::ReleaseConfig, error::Result};
use clap::Parser;

/// Main CLI entry point
///
/// Usage errors exit with 1 like every other failure; `--help` and
/// `--version` exit with 0.
pub async fn run() -> Result<i32> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            e.print()?;
            return Ok(code);
        }
    };

    let runtime = RuntimeConfig::from(&args);
    let config = ReleaseConfig::load(args.config.as_deref())?;
    log::debug!("Loaded configuration: {:?}", config);

    commands::execute(args.command, &config, &runtime).await
}
