//! Artifact building: staging, packing and orchestration.
//!
//! # Overview
//!
//! The packager:
//! 1. Stages the app into a fresh directory ([`stage`])
//! 2. Embeds that directory into a copy of the launcher ([`pack`])
//! 3. Removes the staging directory
//! 4. Reports size and SHA-256 ([`checksum`])
//!
//! # Example
//!
//! ```no_run
//! use lumea_release::release::builder::{
//!     PackageSettings, Packager, Packer, StageRequest, DEFAULT_BUNDLE_NAME,
//! };
//! use lumea_release::release::bundle::{BundleOptions, Esbuild};
//! use std::path::Path;
//!
//! # async fn example() -> lumea_release::release::Result<()> {
//! let settings = PackageSettings {
//!     launcher: "dist/lumea".into(),
//!     request: StageRequest::from_source_dir(Path::new("my-app")).await?,
//!     staging_dir: ".lumea/tmp".into(),
//!     bundle_name: DEFAULT_BUNDLE_NAME.into(),
//!     output: "dist/lumea-app".into(),
//!     bundle_options: BundleOptions::embedded_esm(),
//!     esbuild: Esbuild::locate(None)?,
//!     packer: Packer::Embedded,
//!     keep_staging: false,
//! };
//! let artifact = Packager::new(settings).package().await?;
//! println!("SHA256: {}", artifact.checksum);
//! # Ok(())
//! # }
//! ```

pub mod checksum;
mod orchestrator;
pub mod pack;
pub mod stage;

pub use orchestrator::{
    DEFAULT_BUNDLE_NAME, DEFAULT_STAGING_DIR, PackageSettings, PackedArtifact, Packager,
};
pub use pack::Packer;
pub use stage::{StageRequest, StagedBundle};
