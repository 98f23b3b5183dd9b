//! Operation: report what the next build round would do.

use std::path::Path;

use jinc_builder::driver::{self, StatusReport};

use crate::ProjectContext;

/// Compute the dirty scope of the next round without locking the output
/// location or compiling anything.
pub fn status(project_dir: &Path) -> miette::Result<StatusReport> {
    let project = ProjectContext::load(project_dir)?;
    let ctx = project.build_context()?;
    driver::status(&ctx)
}
