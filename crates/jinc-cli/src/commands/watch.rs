//! Watch command: rebuild on file changes.

use miette::Result;

use jinc_ops::ops_build::{self, BuildOptions};
use jinc_util::progress::{status, Tone};

pub fn exec() -> Result<()> {
    let cwd = super::current_dir()?;
    status(Tone::Progress, "Watching", "for changes...");
    jinc_ops::ops_watch::watch(&cwd, || {
        if let Err(e) = ops_build::build(&cwd, &BuildOptions::default()) {
            status(Tone::Problem, "Error", &format!("{e}"));
        }
        status(Tone::Progress, "Watching", "for changes...");
    })
}
