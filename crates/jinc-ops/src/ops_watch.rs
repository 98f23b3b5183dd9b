//! Operation: rebuild whenever a source or the manifest changes.
//!
//! Uses `notify` to watch the source roots and `Jinc.toml`. Events are
//! debounced so a burst of saves triggers a single round.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{EventKind, RecursiveMode, Watcher};

use jinc_core::paths::{DATA_DIR_NAME_SUFFIX, MANIFEST_FILE_NAME};
use jinc_util::errors::JincError;

use crate::ProjectContext;

const DEBOUNCE_MS: u64 = 300;

/// Watch the project containing `project_dir`, calling `on_change` once
/// initially and after every debounced burst of relevant events.
///
/// Returns when the watcher shuts down.
pub fn watch(project_dir: &Path, mut on_change: impl FnMut()) -> miette::Result<()> {
    let project = ProjectContext::load(project_dir)?;
    let watch_paths = collect_watch_paths(&project);
    let out_dir = project.layout.out_dir().to_path_buf();

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            if is_relevant_event(&event, &out_dir) {
                let _ = tx.send(());
            }
        }
    })
    .map_err(|e| JincError::Generic {
        message: format!("Failed to create file watcher: {e}"),
    })?;

    for path in &watch_paths {
        let mode = if path.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(path, mode).map_err(|e| JincError::Generic {
            message: format!("Failed to watch {}: {e}", path.display()),
        })?;
        tracing::debug!("watching {}", path.display());
    }

    on_change();
    while rx.recv().is_ok() {
        std::thread::sleep(Duration::from_millis(DEBOUNCE_MS));
        while rx.try_recv().is_ok() {}
        on_change();
    }
    Ok(())
}

/// Existing source roots plus the manifest, without nested duplicates.
pub fn collect_watch_paths(project: &ProjectContext) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = project
        .manifest
        .source_roots(&project.project_dir)
        .into_iter()
        .filter(|p| p.is_dir())
        .collect();
    let manifest_path = project.project_dir.join(MANIFEST_FILE_NAME);
    if manifest_path.is_file() {
        paths.push(manifest_path);
    }
    paths.sort();
    paths.dedup();

    let mut pruned: Vec<PathBuf> = Vec::new();
    for path in paths {
        if !pruned.iter().any(|parent| path.starts_with(parent)) {
            pruned.push(path);
        }
    }
    pruned
}

/// Filter out events that cannot change the next round.
pub fn is_relevant_event(event: &notify::Event, out_dir: &Path) -> bool {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
        _ => return false,
    }

    event.paths.iter().any(|p| {
        let name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.starts_with('.') || name.ends_with('~') || name.ends_with(".swp") {
            return false;
        }
        if p.starts_with(out_dir) {
            return false;
        }
        if p.components()
            .any(|c| c.as_os_str().to_string_lossy().ends_with(DATA_DIR_NAME_SUFFIX))
        {
            return false;
        }
        let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
        matches!(ext, "java" | "kt") || name == MANIFEST_FILE_NAME
    })
}
