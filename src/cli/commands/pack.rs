//! `pack`: the built-in packer, callable as `<launcher> <staged_dir> <out>`.

use crate::{
    cli::{PackArgs, RuntimeConfig},
    error::Result,
    release::builder::Packer,
};

pub(super) async fn execute(args: PackArgs, runtime: &RuntimeConfig) -> Result<i32> {
    Packer::Embedded
        .pack(&args.launcher, &args.staged_dir, &args.out)
        .await?;
    runtime.success(&format!(
        "Packed {} into {}",
        args.staged_dir.display(),
        args.out.display()
    ))?;
    Ok(0)
}
