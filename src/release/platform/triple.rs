//! Compiler target triple parsing.
//!
//! Turns `cpu-vendor-sys[-abi]` strings produced by `cargo build --target` into
//! the npm registry vocabulary used to name per-platform sub-packages.

use super::registry::RegistryId;
use crate::release::error::{Error, Result};

/// ABI forced onto triples whose last segment ends in `eabi`.
const EABI: &str = "eabi";

/// Rust CPU names that differ from Node's `process.arch`.
const CPU_TO_NODE_ARCH: &[(&str, &str)] = &[
    ("x86_64", "x64"),
    ("aarch64", "arm64"),
    ("i686", "ia32"),
    ("armv7", "arm"),
    ("riscv64gc", "riscv64"),
    ("powerpc64le", "ppc64"),
];

/// Rust OS names mapped to Node's `process.platform`.
const SYS_TO_NODE_PLATFORM: &[(&str, &str)] = &[
    ("linux", "linux"),
    ("freebsd", "freebsd"),
    ("darwin", "darwin"),
    ("windows", "win32"),
];

/// Translates a Rust CPU name to Node's arch name, falling back to the raw name.
pub fn node_arch(cpu: &str) -> &str {
    lookup(CPU_TO_NODE_ARCH, cpu)
}

/// Translates a Rust OS name to Node's platform name, falling back to the raw name.
pub fn node_platform(sys: &str) -> &str {
    lookup(SYS_TO_NODE_PLATFORM, sys)
}

fn lookup<'a>(table: &'static [(&'static str, &'static str)], key: &'a str) -> &'a str {
    table
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| *to)
        .unwrap_or(key)
}

/// A parsed build triple.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildTriple {
    /// CPU segment, e.g. `aarch64`.
    pub cpu: String,
    /// Vendor segment; absent for two-segment triples.
    pub vendor: Option<String>,
    /// OS segment, e.g. `linux`.
    pub sys: String,
    /// ABI segment, e.g. `musl`.
    pub abi: Option<String>,
}

impl BuildTriple {
    /// Parses a 2 to 4 segment triple.
    ///
    /// Triples ending in `eabi` always get `eabi` as their ABI, whatever the
    /// segment before it was (`armv7-unknown-linux-musleabi` -> abi `eabi`).
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidTriple {
            triple: raw.to_string(),
            reason: reason.to_string(),
        };

        let (body, forced_abi) = match raw.strip_suffix(EABI) {
            Some(rest) => (rest.trim_end_matches('-'), Some(EABI)),
            None => (raw, None),
        };

        let segments: Vec<&str> = body.split('-').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid("empty segment"));
        }

        let triple = match segments.as_slice() {
            // thumbv6m-eabi: the stripped suffix was the OS segment
            [cpu] if forced_abi.is_some() => Self {
                cpu: cpu.to_string(),
                vendor: None,
                sys: EABI.to_string(),
                abi: None,
            },
            // aarch64-fuchsia
            [cpu, sys] => Self {
                cpu: cpu.to_string(),
                vendor: None,
                sys: sys.to_string(),
                abi: None,
            },
            // aarch64-apple-darwin
            [cpu, vendor, sys] => Self {
                cpu: cpu.to_string(),
                vendor: Some(vendor.to_string()),
                sys: sys.to_string(),
                abi: None,
            },
            // aarch64-unknown-linux-musl
            [cpu, vendor, sys, abi] => Self {
                cpu: cpu.to_string(),
                vendor: Some(vendor.to_string()),
                sys: sys.to_string(),
                abi: Some(abi.to_string()),
            },
            _ => return Err(invalid("expected 2 to 4 dash-separated segments")),
        };

        Ok(match forced_abi {
            Some(abi) => Self {
                abi: Some(abi.to_string()),
                ..triple
            },
            None => triple,
        })
    }

    /// Registry id for this triple. The vendor is dropped.
    pub fn registry_id(&self) -> RegistryId {
        let id = RegistryId::new(node_platform(&self.sys), node_arch(&self.cpu));
        match &self.abi {
            Some(abi) => id.with_abi(abi.clone()),
            None => id,
        }
    }
}
