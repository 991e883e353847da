//! JavaScript bundling through esbuild.
//!
//! Produces one minified script for the Node-compatible runtime embedded in
//! the Lumea launcher. Bare imports of Node built-ins are rewritten to their
//! `node:` form and kept external (see [`builtins`]), and generated source
//! maps are made relative to the invocation directory (see [`sourcemap`]).

pub mod builtins;
pub mod sourcemap;

use crate::release::error::{Error, ExitCode, Result};
use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Output module format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleFormat {
    /// CommonJS.
    Cjs,
    /// ES modules.
    Esm,
}

impl fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cjs => "cjs",
            Self::Esm => "esm",
        })
    }
}

impl FromStr for ModuleFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cjs" => Ok(Self::Cjs),
            "esm" => Ok(Self::Esm),
            other => Err(format!("unknown module format `{other}` (expected cjs or esm)")),
        }
    }
}

/// Options for one esbuild run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundleOptions {
    /// Output module format.
    pub format: ModuleFormat,
    /// Minimum language level, e.g. `es2020` or `esnext`.
    pub target: String,
    /// Specifiers left unresolved (`node:*`, `core:*`).
    pub externals: Vec<String>,
    /// Per-extension loaders, e.g. `(".wasm", "base64")`.
    pub loaders: Vec<(String, String)>,
    /// Minify output.
    pub minify: bool,
    /// Emit `{outfile}.map` next to the bundle.
    pub sourcemap: bool,
}

impl BundleOptions {
    /// CommonJS bundle for an npm-installed Node runtime.
    pub fn node_cjs() -> Self {
        Self {
            format: ModuleFormat::Cjs,
            target: "es2020".into(),
            externals: vec!["node:*".into()],
            loaders: Vec::new(),
            minify: true,
            sourcemap: true,
        }
    }

    /// ES module bundle for the launcher's embedded runtime, which also
    /// exposes host APIs under `core:`.
    pub fn embedded_esm() -> Self {
        Self {
            format: ModuleFormat::Esm,
            target: "esnext".into(),
            externals: vec!["node:*".into(), "core:*".into()],
            loaders: [(".ts", "ts"), (".js", "js"), (".json", "json"), (".wasm", "base64")]
                .into_iter()
                .map(|(ext, loader)| (ext.to_string(), loader.to_string()))
                .collect(),
            minify: true,
            sourcemap: true,
        }
    }

    /// Preset for a module format.
    pub fn for_format(format: ModuleFormat) -> Self {
        match format {
            ModuleFormat::Cjs => Self::node_cjs(),
            ModuleFormat::Esm => Self::embedded_esm(),
        }
    }
}

/// A located esbuild executable.
#[derive(Clone, Debug)]
pub struct Esbuild {
    program: PathBuf,
}

impl Esbuild {
    /// Uses `program` as the esbuild executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Finds esbuild: `explicit` if given, then `PATH`, then `node_modules/.bin`.
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self::new(path));
        }
        match which::which("esbuild") {
            Ok(path) => {
                log::debug!("Found esbuild at: {}", path.display());
                Ok(Self::new(path))
            }
            Err(e) => {
                let local = Path::new("node_modules").join(".bin").join(if cfg!(windows) {
                    "esbuild.cmd"
                } else {
                    "esbuild"
                });
                if local.is_file() {
                    log::debug!("Using project-local esbuild at: {}", local.display());
                    Ok(Self::new(local))
                } else {
                    Err(Error::ToolNotFound {
                        tool: "esbuild".into(),
                        hint: format!(
                            "{e}; install it with `npm i -D esbuild` or pass --esbuild <path>"
                        ),
                    })
                }
            }
        }
    }

    /// Path of the executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Command line arguments for bundling `entry` into `outfile`.
    pub fn args(entry: &Path, outfile: &Path, options: &BundleOptions) -> Vec<String> {
        let mut args = vec![
            entry.display().to_string(),
            "--bundle".to_string(),
            format!("--outfile={}", outfile.display()),
            "--platform=node".to_string(),
            format!("--format={}", options.format),
            format!("--target={}", options.target),
        ];
        if options.minify {
            args.push("--minify".into());
        }
        if options.sourcemap {
            args.push("--sourcemap".into());
        }
        args.extend(options.externals.iter().map(|e| format!("--external:{e}")));
        args.extend(
            options
                .loaders
                .iter()
                .map(|(ext, loader)| format!("--loader:{ext}={loader}")),
        );
        args.extend(builtins::alias_flags());
        args
    }

    /// Bundles `entry` into `outfile`, then fixes up the source map if one was requested.
    pub async fn bundle(&self, entry: &Path, outfile: &Path, options: &BundleOptions) -> Result<()> {
        log::info!("Bundling {} -> {}", entry.display(), outfile.display());

        let output = tokio::process::Command::new(&self.program)
            .args(Self::args(entry, outfile, options))
            .output()
            .await
            .map_err(|error| Error::CommandFailed {
                command: self.program.display().to_string(),
                error,
            })?;

        if !output.status.success() {
            return Err(Error::ExternalProcess {
                program: "esbuild".into(),
                code: ExitCode::from(output.status),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        if options.sourcemap {
            let map = sourcemap_path(outfile);
            if map.is_file() {
                let cwd = std::env::current_dir()?;
                sourcemap::rewrite_sources(&map, &cwd).await?;
            } else {
                log::warn!("esbuild did not write a source map at {}", map.display());
            }
        }
        Ok(())
    }
}

/// `{outfile}.map`
pub fn sourcemap_path(outfile: &Path) -> PathBuf {
    let mut name = outfile.as_os_str().to_owned();
    name.push(".map");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_args_mark_host_namespaces_external() {
        let args = Esbuild::args(
            Path::new("app/index.js"),
            Path::new(".lumea/tmp/bundle.js"),
            &BundleOptions::embedded_esm(),
        );
        assert_eq!(args[0], "app/index.js");
        assert!(args.contains(&"--bundle".to_string()));
        assert!(args.contains(&"--outfile=.lumea/tmp/bundle.js".to_string()));
        assert!(args.contains(&"--format=esm".to_string()));
        assert!(args.contains(&"--target=esnext".to_string()));
        assert!(args.contains(&"--external:node:*".to_string()));
        assert!(args.contains(&"--external:core:*".to_string()));
        assert!(args.contains(&"--loader:.wasm=base64".to_string()));
        assert!(args.contains(&"--alias:fs=node:fs".to_string()));
        assert!(args.contains(&"--minify".to_string()));
    }

    #[test]
    fn cjs_preset() {
        let options = BundleOptions::node_cjs();
        let args = Esbuild::args(Path::new("index.js"), Path::new("out.js"), &options);
        assert!(args.contains(&"--format=cjs".to_string()));
        assert!(args.contains(&"--target=es2020".to_string()));
        assert!(!args.iter().any(|a| a == "--external:core:*"));
    }

    #[test]
    fn module_format_parsing() {
        assert_eq!("esm".parse::<ModuleFormat>().unwrap(), ModuleFormat::Esm);
        assert!("iife".parse::<ModuleFormat>().is_err());
    }

    #[test]
    fn sourcemap_sits_next_to_bundle() {
        assert_eq!(
            sourcemap_path(Path::new("stage/bundle.js")),
            PathBuf::from("stage/bundle.js.map")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_esbuild_reports_output() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let fake = tmp.path().join("esbuild");
        std::fs::write(&fake, "#!/bin/sh\necho 'x [ERROR] Could not resolve \"left-pad\"' >&2\nexit 1\n")
            .unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = Esbuild::new(&fake)
            .bundle(
                Path::new("index.js"),
                &tmp.path().join("out.js"),
                &BundleOptions::node_cjs(),
            )
            .await
            .unwrap_err();
        match err {
            Error::ExternalProcess { code, stderr, .. } => {
                assert_eq!(code, ExitCode(Some(1)));
                assert!(stderr.contains("Could not resolve"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
