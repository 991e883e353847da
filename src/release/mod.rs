//! Release engineering for Lumea.
//!
//! Each submodule implements one step of the release pipeline:
//!
//! - [`platform`]: OS/arch and build triple resolution
//! - [`version`]: version consistency check and bump
//! - [`bundle`]: esbuild invocation
//! - [`builder`]: staging, packing and checksums
//! - [`collect`]: copying CI artifacts into npm platform packages
//! - [`install`]: postinstall download of the launcher
//! - [`typings`]: wrapping generated API declarations

pub mod builder;
pub mod bundle;
pub mod collect;
pub mod error;
pub mod install;
pub mod platform;
pub mod typings;
pub mod utils;
pub mod version;

pub use error::{Context, Error, ErrorExt, Result};
