//! `types`: merge generated API declarations.

use crate::{
    cli::{RuntimeConfig, TypesArgs},
    error::Result,
    release::typings::{DEFAULT_MODULES, wrap_declarations},
};

pub(super) async fn execute(args: TypesArgs, runtime: &RuntimeConfig) -> Result<i32> {
    let modules = if args.modules.is_empty() {
        DEFAULT_MODULES.iter().map(|m| m.to_string()).collect()
    } else {
        args.modules
    };

    let out = wrap_declarations(&args.dist, &modules).await?;
    runtime.println(&format!("✅ types.d.ts created at {}", out.display()))?;
    Ok(0)
}
