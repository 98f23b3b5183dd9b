//! On-disk layout of a target's build output.
//!
//! ```text
//! <out-dir>/<name>.jar
//! <out-dir>/<name>-ic/dep-graph.mv
//! <out-dir>/<name>-ic/config-state.json
//! <out-dir>/<name>-ic/classes/...
//! <out-dir>/<name>-ic/build.log
//! <out-dir>/<name>-ic/diagnostic.zip
//! <out-dir>/<name>-ic/.lock
//! <out-dir>/<name>-ic/.round-in-progress
//! ```

use std::path::{Path, PathBuf};

use crate::manifest::Manifest;

pub const MANIFEST_FILE_NAME: &str = "Jinc.toml";
pub const DATA_DIR_NAME_SUFFIX: &str = "-ic";
pub const DEP_GRAPH_FILE_NAME: &str = "dep-graph.mv";
pub const CONFIG_STATE_FILE_NAME: &str = "config-state.json";
pub const CLASSES_DIR_NAME: &str = "classes";
pub const BUILD_LOG_FILE_NAME: &str = "build.log";
pub const DIAGNOSTIC_FILE_NAME: &str = "diagnostic.zip";
pub const LOCK_FILE_NAME: &str = ".lock";
pub const ROUND_MARKER_FILE_NAME: &str = ".round-in-progress";
pub const ARCHIVE_EXTENSION: &str = "jar";
pub const KOTLIN_MODULE_EXTENSION: &str = "kotlin_module";

/// Resolved locations of one target's outputs and incremental state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    out_dir: PathBuf,
    name: String,
}

impl OutputLayout {
    pub fn new(out_dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            out_dir: out_dir.into(),
            name: name.into(),
        }
    }

    pub fn for_manifest(manifest: &Manifest, project_dir: &Path) -> Self {
        Self::new(
            project_dir.join(&manifest.target.out_dir),
            manifest.target.name.clone(),
        )
    }

    /// Locate the layout belonging to an output archive path.
    pub fn from_archive(archive: &Path) -> Option<Self> {
        let out_dir = archive.parent()?;
        let name = truncate_extension(archive.file_name()?.to_str()?);
        Some(Self::new(out_dir, name))
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn archive_path(&self) -> PathBuf {
        self.out_dir
            .join(format!("{}.{ARCHIVE_EXTENSION}", self.name))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.out_dir
            .join(format!("{}{DATA_DIR_NAME_SUFFIX}", self.name))
    }

    pub fn graph_path(&self) -> PathBuf {
        self.data_dir().join(DEP_GRAPH_FILE_NAME)
    }

    pub fn config_state_path(&self) -> PathBuf {
        self.data_dir().join(CONFIG_STATE_FILE_NAME)
    }

    pub fn classes_dir(&self) -> PathBuf {
        self.data_dir().join(CLASSES_DIR_NAME)
    }

    pub fn build_log_path(&self) -> PathBuf {
        self.data_dir().join(BUILD_LOG_FILE_NAME)
    }

    pub fn diagnostic_path(&self) -> PathBuf {
        self.data_dir().join(DIAGNOSTIC_FILE_NAME)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.data_dir().join(LOCK_FILE_NAME)
    }

    pub fn round_marker_path(&self) -> PathBuf {
        self.data_dir().join(ROUND_MARKER_FILE_NAME)
    }
}

/// Archive-relative path of the Kotlin module index for `module_name`.
pub fn kotlin_module_entry(module_name: &str) -> String {
    format!("META-INF/{module_name}.{KOTLIN_MODULE_EXTENSION}")
}

/// Strip the last extension from a file name (`app.jar` -> `app`).
pub fn truncate_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(idx) => &file_name[..idx],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_extension() {
        assert_eq!(truncate_extension("app.jar"), "app");
        assert_eq!(truncate_extension("app.tar.gz"), "app.tar");
        assert_eq!(truncate_extension("app"), "app");
        assert_eq!(truncate_extension(".lock"), ".lock");
    }

    #[test]
    fn test_layout_from_archive_round_trips() {
        let layout = OutputLayout::new("/tmp/out", "app");
        let back = OutputLayout::from_archive(&layout.archive_path()).unwrap();
        assert_eq!(back, layout);
        assert_eq!(layout.data_dir(), PathBuf::from("/tmp/out/app-ic"));
    }
}
