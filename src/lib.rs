//! Release tooling library for Lumea
//!
//! This library provides the release steps behind the `lumea_release` binary:
//! - Packaging an app into a copy of the platform launcher
//! - Keeping manifest versions and the git tag in lockstep
//! - Distributing CI artifacts into npm platform packages
//! - Downloading the launcher at npm install time
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod config;
pub mod error;
pub mod release;

// Re-export commonly used types
pub use error::{CliError, ReleaseError, Result};
