//! `install`: npm postinstall download of the launcher.

use crate::{
    cli::{InstallArgs, RuntimeConfig},
    config::ReleaseConfig,
    error::Result,
    release::install::{InstallOutcome, Installer},
};

pub(super) async fn execute(
    args: InstallArgs,
    config: &ReleaseConfig,
    runtime: &RuntimeConfig,
) -> Result<i32> {
    let install = config.install.to_install_config(args.dir, !args.no_types);
    let installer = Installer::new(install)?;

    match installer.install().await? {
        InstallOutcome::AlreadyInstalled { launcher } => {
            runtime.println(&format!("✅ Lumea is already installed at {}", launcher.display()))?;
        }
        InstallOutcome::Installed {
            launcher,
            bytes,
            types,
        } => {
            runtime.println(&format!("✅ Installed {} ({} bytes)", launcher.display(), bytes))?;
            if let Some(types) = types {
                runtime.indent(&format!("Types: {}", types.display()))?;
            }
        }
    }
    Ok(0)
}
