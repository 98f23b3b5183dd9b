//! Command dispatch and handler modules.

mod build;
mod clean;
mod diagnostics;
mod graph;
mod status;
mod validate;
mod watch;

use std::path::PathBuf;

use miette::Result;

use jinc_util::errors::JincError;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build => build::exec(),
        Command::Status => status::exec(cli.verbose),
        Command::Graph => graph::exec(),
        Command::Validate => validate::exec(),
        Command::Clean => clean::exec(),
        Command::Watch => watch::exec(),
        Command::Diagnostics { count } => diagnostics::exec(count),
    }
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(|e| JincError::Io(e).into())
}
