//! Platform resolution.
//!
//! Maps operating systems and compiler target triples onto the two naming
//! schemes the release pipeline needs: the launcher path inside a packaged
//! app, and the npm registry id (`{platform}-{arch}[-{abi}]`) of the
//! platform-specific sub-package.

mod host;
mod registry;
mod triple;

pub use host::{
    BINARY_NAME, MACOS_LAUNCHER, OsFamily, PlatformTarget, node_host_arch, resolve_host_platform,
    resolve_platform,
};
pub use registry::RegistryId;
pub use triple::{BuildTriple, node_arch, node_platform};
