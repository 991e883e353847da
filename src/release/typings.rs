//! Ambient module declarations for the Lumea API.
//!
//! The API build emits one `api_{module}.d.ts` per module. Consumers import
//! them as `lumea/{module}`, so each file is wrapped in a `declare module`
//! block and all of them are merged into a single `types.d.ts`.

use crate::release::error::{ErrorExt, Result};
use std::path::{Path, PathBuf};

/// Modules published by default.
pub const DEFAULT_MODULES: &[&str] = &["main"];

/// Output file name inside the dist directory.
pub const OUTPUT_FILE: &str = "types.d.ts";

/// Wraps `content` as the declarations of `lumea/{module}`.
pub fn wrap_module(module: &str, content: &str) -> String {
    format!("declare module \"lumea/{module}\" {{\n{content}\n}}")
}

/// Merges `dist/api_{module}.d.ts` for every module into `dist/types.d.ts`.
///
/// The per-module inputs are removed. Returns the output path.
pub async fn wrap_declarations(dist: &Path, modules: &[String]) -> Result<PathBuf> {
    let mut output = String::new();

    for module in modules {
        let input = dist.join(format!("api_{module}.d.ts"));
        let content = tokio::fs::read_to_string(&input)
            .await
            .fs_context("reading declarations", &input)?;
        output.push_str(&wrap_module(module, &content));
        output.push_str("\n\n");
        tokio::fs::remove_file(&input)
            .await
            .fs_context("removing declarations", &input)?;
    }

    let out = dist.join(OUTPUT_FILE);
    tokio::fs::write(&out, output)
        .await
        .fs_context("writing declarations", &out)?;
    log::info!("✓ {} created at {}", OUTPUT_FILE, out.display());
    Ok(out)
}
