pub mod ops_build;
pub mod ops_clean;
pub mod ops_graph;
pub mod ops_status;
pub mod ops_validate;
pub mod ops_watch;

use std::path::{Path, PathBuf};

use jinc_builder::descriptor::DescriptorCompiler;
use jinc_builder::process::ProcessCompiler;
use jinc_builder::{BuildContext, Compiler};
use jinc_core::config::{EffectiveBuild, GlobalConfig};
use jinc_core::manifest::{CompilerKind, Manifest};
use jinc_core::paths::{OutputLayout, MANIFEST_FILE_NAME};
use jinc_core::source_set::discover_sources;
use jinc_util::errors::JincError;
use jinc_util::fs::find_ancestor_with;

/// A located project: its manifest, output layout and effective settings.
pub struct ProjectContext {
    pub project_dir: PathBuf,
    pub manifest: Manifest,
    pub layout: OutputLayout,
    pub build: EffectiveBuild,
}

impl ProjectContext {
    /// Find `Jinc.toml` in `start` or its ancestors and load it, layering
    /// the global configuration underneath.
    pub fn load(start: &Path) -> miette::Result<Self> {
        Self::load_with(start, &GlobalConfig::load()?)
    }

    pub fn load_with(start: &Path, global: &GlobalConfig) -> miette::Result<Self> {
        let project_dir = find_ancestor_with(start, MANIFEST_FILE_NAME).ok_or_else(|| {
            JincError::Manifest {
                message: format!(
                    "Could not find {MANIFEST_FILE_NAME} in current or parent directories"
                ),
            }
        })?;
        let manifest = Manifest::from_path(&project_dir.join(MANIFEST_FILE_NAME))?;
        let layout = OutputLayout::for_manifest(&manifest, &project_dir);
        let build = EffectiveBuild::resolve(&manifest, global);
        Ok(Self {
            project_dir,
            manifest,
            layout,
            build,
        })
    }

    /// Discover the current sources and assemble the round inputs.
    pub fn build_context(&self) -> miette::Result<BuildContext> {
        let sources = discover_sources(&self.manifest, &self.project_dir, self.layout.out_dir())?;
        let classpath = self
            .manifest
            .compiler
            .classpath
            .iter()
            .map(|entry| self.project_dir.join(entry))
            .collect();
        Ok(BuildContext {
            project_root: self.project_dir.clone(),
            layout: self.layout.clone(),
            sources,
            config_fingerprint: self.manifest.config_fingerprint(),
            module_name: self.manifest.module_name().to_string(),
            classpath,
            flags: self.manifest.compiler.flags.clone(),
            jobs: self.build.jobs,
            write_log: self.build.log,
            diagnostic_sessions: self.build.diagnostic_sessions,
        })
    }

    /// The compiler collaborator selected by `[compiler] kind`.
    pub fn compiler(&self) -> Box<dyn Compiler> {
        let config = &self.manifest.compiler;
        match (config.kind, config.command.as_deref()) {
            (CompilerKind::Process, Some(command)) => Box::new(ProcessCompiler::new(
                command,
                config.args.clone(),
                self.layout.data_dir().join("staging"),
            )),
            _ => Box::new(DescriptorCompiler::new()),
        }
    }
}
