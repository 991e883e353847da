//! Command execution functions for release operations.

mod build;
mod collect;
mod install;
mod pack;
mod platform;
mod types;
mod version;

use super::{Command, RuntimeConfig};
use crate::{config::ReleaseConfig, error::Result};

/// Runs `command` and returns the process exit code.
pub async fn execute(
    command: Command,
    config: &ReleaseConfig,
    runtime: &RuntimeConfig,
) -> Result<i32> {
    match command {
        Command::Build(args) => build::execute(args, config, runtime).await,
        Command::Pack(args) => pack::execute(args, runtime).await,
        Command::Version { command } => version::execute(command, config, runtime).await,
        Command::Collect(args) => collect::execute(args, config, runtime).await,
        Command::Install(args) => install::execute(args, config, runtime).await,
        Command::Types(args) => types::execute(args, runtime).await,
        Command::Platform(args) => platform::execute(args, runtime),
    }
}
