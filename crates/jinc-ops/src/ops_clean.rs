//! Operation: remove the target's archive and incremental state.

use std::path::Path;

use jinc_graph::maplet::StoreLock;
use jinc_util::errors::JincError;

use crate::ProjectContext;

/// Result of a clean operation.
#[derive(Debug, PartialEq, Eq)]
pub enum CleanResult {
    Cleaned,
    NothingToClean,
}

/// Remove `<name>.jar` and `<name>-ic/` so the next round rebuilds from scratch.
///
/// Refuses to run while a build holds the output lock.
pub fn clean(project_dir: &Path) -> miette::Result<CleanResult> {
    let project = ProjectContext::load(project_dir)?;
    let layout = &project.layout;

    let archive = layout.archive_path();
    let data_dir = layout.data_dir();
    let _lock = if data_dir.exists() {
        Some(StoreLock::acquire(&layout.lock_path())?)
    } else {
        None
    };

    let mut cleaned = false;
    if archive.is_file() {
        std::fs::remove_file(&archive).map_err(JincError::Io)?;
        cleaned = true;
    }
    if data_dir.exists() {
        std::fs::remove_dir_all(&data_dir).map_err(JincError::Io)?;
        cleaned = true;
    }
    if cleaned {
        tracing::debug!("removed {} and {}", archive.display(), data_dir.display());
        Ok(CleanResult::Cleaned)
    } else {
        Ok(CleanResult::NothingToClean)
    }
}
