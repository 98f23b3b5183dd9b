//! Discovery of the compilation inputs of a target.

use std::collections::BTreeSet;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::manifest::Manifest;
use crate::source::{NodeSource, PathSourceMapper};

/// Include/exclude filter applied to paths relative to a source root.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl SourceFilter {
    pub fn new(include: &[String], exclude: &[String]) -> miette::Result<Self> {
        Ok(Self {
            include: build_globset(include)?,
            exclude: build_globset(exclude)?,
        })
    }

    pub fn matches(&self, relative: &Path) -> bool {
        self.include.is_match(relative) && !self.exclude.is_match(relative)
    }
}

fn build_globset(patterns: &[String]) -> miette::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| jinc_util::errors::JincError::Manifest {
            message: format!("invalid glob pattern '{pattern}': {e}"),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| {
        jinc_util::errors::JincError::Manifest {
            message: format!("invalid glob patterns: {e}"),
        }
        .into()
    })
}

/// Find every source of the target described by `manifest`.
///
/// Sources are keyed relative to `project_dir`. Files under `skip_dir` (the
/// target's output directory) are never considered.
pub fn discover_sources(
    manifest: &Manifest,
    project_dir: &Path,
    skip_dir: &Path,
) -> miette::Result<BTreeSet<NodeSource>> {
    let filter = SourceFilter::new(&manifest.target.include, &manifest.target.exclude)?;
    let mapper = PathSourceMapper::new(project_dir);
    let mut sources = BTreeSet::new();

    for root in manifest.source_roots(project_dir) {
        if !root.is_dir() {
            tracing::debug!("source root {} does not exist", root.display());
            continue;
        }
        for file in jinc_util::fs::collect_files(&root) {
            if file.starts_with(skip_dir) {
                continue;
            }
            let Ok(relative) = file.strip_prefix(&root) else {
                continue;
            };
            if !filter.matches(relative) {
                continue;
            }
            if let Some(source) = mapper.to_source(&file) {
                sources.insert(source);
            }
        }
    }

    tracing::debug!("discovered {} sources", sources.len());
    Ok(sources)
}
