#![allow(dead_code)]

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use jinc_builder::descriptor::DescriptorCompiler;
use jinc_builder::{run_round, BuildContext, RoundSummary};
use jinc_core::paths::OutputLayout;
use jinc_core::source::{NodeSource, PathSourceMapper};
use jinc_graph::persist::load_graph;
use jinc_graph::{DependencyGraph, MapletStore};

/// A scratch project with descriptor sources under `src/`.
pub struct Project {
    pub dir: tempfile::TempDir,
    pub out: String,
    pub flags: Vec<String>,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            out: "out".to_string(),
            flags: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    pub fn delete(&self, rel: &str) {
        fs::remove_file(self.root().join(rel)).unwrap();
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(self.root().join(&self.out), "app")
    }

    pub fn sources(&self) -> BTreeSet<NodeSource> {
        let mapper = PathSourceMapper::new(self.root());
        jinc_util::fs::collect_files(&self.root().join("src"))
            .into_iter()
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("java") | Some("kt")
                )
            })
            .filter_map(|p| mapper.to_source(&p))
            .collect()
    }

    pub fn context(&self) -> BuildContext {
        BuildContext {
            project_root: self.root().to_path_buf(),
            layout: self.layout(),
            sources: self.sources(),
            config_fingerprint: format!("flags={}", self.flags.join(",")),
            module_name: "app".to_string(),
            classpath: Vec::new(),
            flags: self.flags.clone(),
            jobs: 2,
            write_log: true,
            diagnostic_sessions: 5,
        }
    }

    pub fn build(&self) -> RoundSummary {
        run_round(&self.context(), &DescriptorCompiler::new()).unwrap()
    }

    pub fn graph(&self) -> DependencyGraph {
        let store = MapletStore::open_read_only(&self.layout().graph_path());
        load_graph(&store).unwrap()
    }

    pub fn class_file(&self, rel: &str) -> PathBuf {
        self.layout().classes_dir().join(rel)
    }

    pub fn build_log(&self) -> String {
        fs::read_to_string(self.layout().build_log_path()).unwrap()
    }

    /// Apply staged edits for `step` (1-based): `X.new`/`X.newN` replace `X`,
    /// `X.delete`/`X.deleteN` remove it.
    pub fn apply_step(&self, step: u32) {
        let suffix = if step == 1 { String::new() } else { step.to_string() };
        for file in jinc_util::fs::collect_files(self.root()) {
            let name = file.to_string_lossy().into_owned();
            if let Some(base) = name.strip_suffix(&format!(".new{suffix}")) {
                fs::copy(&file, base).unwrap();
            } else if let Some(base) = name.strip_suffix(&format!(".delete{suffix}")) {
                let _ = fs::remove_file(base);
            }
        }
    }
}

pub fn src(key: &str) -> NodeSource {
    NodeSource::new(key)
}

pub fn set(keys: &[&str]) -> BTreeSet<NodeSource> {
    keys.iter().map(|k| src(k)).collect()
}
