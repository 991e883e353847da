//! `build`: stage, bundle and pack an app into a launcher copy.

use crate::{
    cli::{BuildArgs, RuntimeConfig},
    config::ReleaseConfig,
    error::{CliError, Result},
    release::{
        builder::{PackageSettings, Packager, Packer, StageRequest},
        bundle::{BundleOptions, Esbuild},
        platform::resolve_host_platform,
    },
};
use std::path::{Path, PathBuf};

/// Default artifact name without the platform executable suffix.
const DEFAULT_OUTPUT_NAME: &str = "lumea-app";

pub(super) async fn execute(
    args: BuildArgs,
    config: &ReleaseConfig,
    runtime: &RuntimeConfig,
) -> Result<i32> {
    let host = resolve_host_platform()?;

    let launcher = match &args.bin {
        Some(bin) => bin.clone(),
        None => {
            let default = Path::new("dist").join(host.launcher_path);
            if !default.is_file() {
                return Err(CliError::MissingArgument {
                    argument: "--bin".to_string(),
                }
                .into());
            }
            runtime.verbose_println(&format!("Using launcher {}", default.display()))?;
            default
        }
    };

    let request =
        StageRequest::resolve(&args.dir, args.assets.clone(), args.js_entry.clone()).await?;

    let output = args.out.clone().unwrap_or_else(|| {
        PathBuf::from("dist").join(format!("{}{}", DEFAULT_OUTPUT_NAME, host.os.exe_suffix()))
    });

    let esbuild = Esbuild::locate(args.esbuild.as_deref().or(config.bundle.esbuild.as_deref()))?;
    runtime.verbose_println(&format!("esbuild: {}", esbuild.program().display()))?;

    let mut bundle_options = BundleOptions::for_format(args.format);
    bundle_options.sourcemap = args.sourcemap(config.bundle.sourcemap);

    let packer = match args.packer.clone() {
        Some(program) => Packer::External { program },
        None => Packer::Embedded,
    };

    let settings = PackageSettings {
        launcher,
        request,
        staging_dir: args
            .staging_dir
            .clone()
            .unwrap_or_else(|| config.bundle.staging_dir.clone()),
        bundle_name: config.bundle.bundle_name.clone(),
        output,
        bundle_options,
        esbuild,
        packer,
        keep_staging: args.keep_staging,
    };

    runtime.section("Building Lumea app")?;
    runtime.progress(&format!("Entry:    {}", settings.request.entry.display()))?;
    runtime.progress(&format!("Assets:   {}", settings.request.assets_dir.display()))?;
    runtime.progress(&format!("Launcher: {}", settings.launcher.display()))?;

    let artifact = Packager::new(settings).package().await?;

    runtime.success(&format!("Created {}", artifact.path.display()))?;
    runtime.indent(&format!("Size:   {} bytes", artifact.size))?;
    runtime.indent(&format!("SHA256: {}", artifact.checksum))?;
    Ok(0)
}
