//! Build command implementation.

use miette::Result;

use jinc_ops::ops_build::{self, BuildOptions};

pub fn exec() -> Result<()> {
    let cwd = super::current_dir()?;
    ops_build::build(&cwd, &BuildOptions::default())?;
    Ok(())
}
