//! `platform`: show how the host or a build triple is named.

use crate::{
    cli::{PlatformArgs, RuntimeConfig},
    error::Result,
    release::platform::{BuildTriple, resolve_host_platform},
};

pub(super) fn execute(args: PlatformArgs, runtime: &RuntimeConfig) -> Result<i32> {
    match args.triple {
        Some(raw) => {
            let triple = BuildTriple::parse(&raw)?;
            runtime.println(&format!("triple:      {raw}"))?;
            runtime.verbose_println(&format!("cpu:    {}", triple.cpu))?;
            if let Some(vendor) = &triple.vendor {
                runtime.verbose_println(&format!("vendor: {vendor}"))?;
            }
            runtime.verbose_println(&format!("sys:    {}", triple.sys))?;
            if let Some(abi) = &triple.abi {
                runtime.verbose_println(&format!("abi:    {abi}"))?;
            }
            runtime.println(&format!("registry id: {}", triple.registry_id()))?;
        }
        None => {
            let host = resolve_host_platform()?;
            runtime.println(&format!("platform:    {}", host.os.node_platform()))?;
            runtime.println(&format!("launcher:    {}", host.launcher_path))?;
            runtime.println(&format!("registry id: {}", host.registry_id))?;
        }
    }
    Ok(0)
}
