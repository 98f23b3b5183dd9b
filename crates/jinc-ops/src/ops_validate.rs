//! Operation: check the committed output for consistency.

use std::path::Path;

use jinc_builder::validate::{validate_output, ValidationReport};

use crate::ProjectContext;

pub fn validate(project_dir: &Path) -> miette::Result<ValidationReport> {
    let project = ProjectContext::load(project_dir)?;
    validate_output(&project.layout, project.manifest.module_name())
}
