//! Command line argument parsing and validation.
//!
//! This module provides comprehensive CLI argument parsing using clap,
//! with one subcommand per release step.

use crate::release::bundle::ModuleFormat;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Release tooling for Lumea apps and packages
#[derive(Parser, Debug)]
#[command(
    name = "lumea_release",
    version,
    about = "Release tooling for Lumea apps and packages",
    long_about = "Builds self-contained Lumea executables and runs the release chores around them.

Usage:
  lumea_release build --dir my-app --bin dist/lumea --out dist/my-app
  lumea_release version check --tag
  lumea_release version set 1.3.0
  lumea_release collect --artifacts artifacts --npm npm
  lumea_release install

Exit code 0 = success, 1 = any failure."
)]
pub struct Args {
    /// Configuration file (default: ./lumea-release.toml)
    #[arg(long, global = true, value_name = "PATH", env = "LUMEA_RELEASE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show detailed progress
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print command results and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Release step to run
    #[command(subcommand)]
    pub command: Command,
}

/// Release steps.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bundle an app and pack it into a launcher copy
    Build(BuildArgs),

    /// Embed a staged directory into a launcher (packer protocol)
    Pack(PackArgs),

    /// Check or set the version across manifests
    Version {
        /// Version action
        #[command(subcommand)]
        command: VersionCommand,
    },

    /// Copy CI build artifacts into npm platform packages
    Collect(CollectArgs),

    /// Download the launcher into an installed npm package
    Install(InstallArgs),

    /// Merge generated API declarations into types.d.ts
    Types(TypesArgs),

    /// Show the host platform or resolve a build triple
    Platform(PlatformArgs),
}

/// Arguments of `build`.
#[derive(ClapArgs, Debug)]
pub struct BuildArgs {
    /// Launcher binary to pack (default: dist/<launcher path for this host>)
    #[arg(long = "bin", visible_alias = "binary", value_name = "PATH")]
    pub bin: Option<PathBuf>,

    /// App directory containing package.json and assets/
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub dir: PathBuf,

    /// Static assets directory (default: <dir>/assets)
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Script entry point (default: <dir>/<package.json main | index.js>)
    #[arg(long = "js-entry", value_name = "FILE")]
    pub js_entry: Option<PathBuf>,

    /// Output executable (default: ./dist/lumea-app[.exe])
    #[arg(short = 'o', long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// External packer executable (default: built-in packer)
    #[arg(long, value_name = "EXE")]
    pub packer: Option<PathBuf>,

    /// esbuild executable (default: PATH, then node_modules/.bin)
    #[arg(long, value_name = "EXE")]
    pub esbuild: Option<PathBuf>,

    /// Output module format
    #[arg(long, value_name = "FORMAT", default_value = "esm")]
    pub format: ModuleFormat,

    /// Staging directory (default: .lumea/tmp)
    #[arg(long, value_name = "DIR")]
    pub staging_dir: Option<PathBuf>,

    /// Emit a source map
    #[arg(long, overrides_with = "no_sourcemap")]
    pub sourcemap: bool,

    /// Do not emit a source map
    #[arg(long)]
    pub no_sourcemap: bool,

    /// Keep the staging directory after packing
    #[arg(long)]
    pub keep_staging: bool,
}

impl BuildArgs {
    /// Effective source map setting given the configured default.
    pub fn sourcemap(&self, configured: bool) -> bool {
        if self.sourcemap {
            true
        } else if self.no_sourcemap {
            false
        } else {
            configured
        }
    }
}

/// Arguments of `pack`.
#[derive(ClapArgs, Debug)]
pub struct PackArgs {
    /// Launcher binary
    pub launcher: PathBuf,

    /// Directory to embed
    pub staged_dir: PathBuf,

    /// Output executable
    pub out: PathBuf,
}

/// `version` actions.
#[derive(Subcommand, Debug)]
pub enum VersionCommand {
    /// Fail unless every configured source has the same version
    Check {
        /// Also compare against the latest git tag
        #[arg(long, overrides_with = "no_tag")]
        tag: bool,

        /// Do not compare against the git tag
        #[arg(long)]
        no_tag: bool,
    },

    /// Write a version into every configured manifest
    Set {
        /// New version, with or without a leading `v`
        #[arg(value_name = "VERSION")]
        version: Option<String>,
    },
}

/// Arguments of `collect`.
#[derive(ClapArgs, Debug)]
pub struct CollectArgs {
    /// Root of downloaded CI artifacts
    #[arg(long, value_name = "DIR")]
    pub artifacts: Option<PathBuf>,

    /// Directory holding npm platform packages
    #[arg(long, value_name = "DIR")]
    pub npm: Option<PathBuf>,

    /// File name prefix of collectable binaries
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,
}

/// Arguments of `install`.
#[derive(ClapArgs, Debug)]
pub struct InstallArgs {
    /// Installed npm package directory
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub dir: PathBuf,

    /// Skip downloading types.d.ts
    #[arg(long)]
    pub no_types: bool,
}

/// Arguments of `types`.
#[derive(ClapArgs, Debug)]
pub struct TypesArgs {
    /// Directory holding api_<module>.d.ts files
    #[arg(long, value_name = "DIR", default_value = "dist")]
    pub dist: PathBuf,

    /// Module to include (repeatable; default: main)
    #[arg(long = "module", value_name = "NAME")]
    pub modules: Vec<String>,
}

/// Arguments of `platform`.
#[derive(ClapArgs, Debug)]
pub struct PlatformArgs {
    /// Resolve this build triple instead of the host
    #[arg(long, value_name = "TRIPLE")]
    pub triple: Option<String>,
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print a command result line
    pub fn println(&self, message: &str) -> std::io::Result<()> {
        self.output.println(message)
    }

    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print warning message if not in quiet mode
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.output.section(title)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }
}
