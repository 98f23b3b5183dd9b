//! Operation: run one incremental build round for the project.

use std::path::{Path, PathBuf};
use std::time::Instant;

use jinc_builder::{run_round, RoundSummary};
use jinc_util::errors::JincError;
use jinc_util::progress::{round_spinner, status, Tone};

use crate::ProjectContext;

/// Options for a build invocation.
#[derive(Debug, Default, Clone)]
pub struct BuildOptions {
    /// Suppress status output (used by `jinc watch` between cycles and tests).
    pub quiet: bool,
}

/// Result of a successful round.
#[derive(Debug)]
pub struct BuildResult {
    pub summary: RoundSummary,
    pub archive: PathBuf,
}

/// Build the project containing `project_dir`.
///
/// Returns [`JincError::Compilation`] when any source failed; the round is
/// still committed and its diagnostics are recorded in the diagnostics archive.
pub fn build(project_dir: &Path, opts: &BuildOptions) -> miette::Result<BuildResult> {
    let project = ProjectContext::load(project_dir)?;
    build_project(&project, opts)
}

pub fn build_project(project: &ProjectContext, opts: &BuildOptions) -> miette::Result<BuildResult> {
    let start = Instant::now();
    let ctx = project.build_context()?;
    let compiler = project.compiler();

    if !opts.quiet {
        status(
            Tone::Progress,
            "Compiling",
            &format!(
                "{} ({} sources, {})",
                project.manifest.target.name,
                ctx.sources.len(),
                project.manifest.compiler.kind.as_str()
            ),
        );
    }

    let pb = (!opts.quiet).then(|| round_spinner(&project.manifest.target.name));
    let outcome = run_round(&ctx, compiler.as_ref());
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let summary = outcome?;

    if !opts.quiet {
        report(&summary);
    }

    if !summary.success {
        return Err(JincError::Compilation {
            message: format!(
                "{} of {} sources failed; details in {}",
                summary.failed.len(),
                ctx.sources.len(),
                project.layout.diagnostic_path().display()
            ),
        }
        .into());
    }

    if !opts.quiet {
        status(
            Tone::Progress,
            "Finished",
            &format!(
                "{} in {:.2}s",
                project.layout.archive_path().display(),
                start.elapsed().as_secs_f64()
            ),
        );
    }
    Ok(BuildResult {
        summary,
        archive: project.layout.archive_path(),
    })
}

fn report(summary: &RoundSummary) {
    if summary.full_rebuild {
        status(Tone::Info, "Rebuilding", "all sources from scratch");
    }
    if !summary.deleted_outputs.is_empty() {
        status(
            Tone::Info,
            "Deleted",
            &format!("{} stale class files", summary.deleted_outputs.len()),
        );
    }
    if !summary.committed {
        status(Tone::Info, "Fresh", "all sources are up to date");
    } else {
        status(
            Tone::Info,
            "Compiled",
            &format!("{} of {} sources in scope", summary.compiled.len(), summary.dirty_scope.len()),
        );
    }
    for diagnostic in &summary.diagnostics {
        status(Tone::Problem, "error", &diagnostic.to_string());
    }
}
