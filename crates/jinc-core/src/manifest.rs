use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::digest::Digest;

/// The parsed representation of a `Jinc.toml` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub target: TargetConfig,

    #[serde(default)]
    pub compiler: CompilerConfig,

    #[serde(default)]
    pub build: BuildSettings,
}

/// The build target from `[target]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,

    /// Source roots, relative to the manifest directory.
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,

    #[serde(default = "default_include")]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default = "default_out_dir", rename = "out-dir")]
    pub out_dir: String,

    #[serde(default, rename = "module-name")]
    pub module_name: Option<String>,
}

fn default_sources() -> Vec<String> {
    vec!["src".to_string()]
}

fn default_include() -> Vec<String> {
    vec!["**/*.java".to_string(), "**/*.kt".to_string()]
}

fn default_out_dir() -> String {
    "out".to_string()
}

/// Which compiler collaborator a target uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompilerKind {
    /// Built-in declarative compiler reading class descriptors.
    #[default]
    Descriptor,
    /// External command speaking the JSON request/response protocol.
    Process,
}

impl CompilerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilerKind::Descriptor => "descriptor",
            CompilerKind::Process => "process",
        }
    }
}

/// Compiler settings from `[compiler]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilerConfig {
    #[serde(default)]
    pub kind: CompilerKind,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub classpath: Vec<String>,
}

/// Build settings from `[build]`. Unset values fall back to the global config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSettings {
    #[serde(default)]
    pub jobs: Option<u32>,
    #[serde(default = "default_log")]
    pub log: bool,
    #[serde(default, rename = "diagnostic-sessions")]
    pub diagnostic_sessions: Option<u32>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            jobs: None,
            log: default_log(),
            diagnostic_sessions: None,
        }
    }
}

fn default_log() -> bool {
    true
}

impl Manifest {
    /// Load and parse a `Jinc.toml` file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            jinc_util::errors::JincError::Manifest {
                message: format!("Failed to read {}: {e}", path.display()),
            }
        })?;
        Self::from_str(&content)
    }

    /// Parse a `Jinc.toml` from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> miette::Result<Self> {
        let manifest: Manifest = toml::from_str(content).map_err(|e| {
            jinc_util::errors::JincError::Manifest {
                message: format!("Failed to parse Jinc.toml: {e}"),
            }
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> miette::Result<()> {
        let name = self.target.name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(jinc_util::errors::JincError::Manifest {
                message: format!("invalid target name '{}'", self.target.name),
            }
            .into());
        }
        if self.compiler.kind == CompilerKind::Process && self.compiler.command.is_none() {
            return Err(jinc_util::errors::JincError::Manifest {
                message: "compiler kind 'process' requires `command`".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Kotlin module name, defaulting to the target name.
    pub fn module_name(&self) -> &str {
        self.target
            .module_name
            .as_deref()
            .unwrap_or(&self.target.name)
    }

    /// Source roots resolved against the project directory.
    pub fn source_roots(&self, project_dir: &Path) -> Vec<PathBuf> {
        self.target
            .sources
            .iter()
            .map(|s| project_dir.join(s))
            .collect()
    }

    /// Fingerprint of every setting whose change invalidates all outputs.
    pub fn config_fingerprint(&self) -> String {
        let mut parts = vec![
            format!("schema={}", crate::SCHEMA_VERSION),
            format!("kind={}", self.compiler.kind.as_str()),
            format!("command={}", self.compiler.command.as_deref().unwrap_or("")),
            format!("module={}", self.module_name()),
        ];
        parts.extend(self.compiler.args.iter().map(|a| format!("arg={a}")));
        parts.extend(self.compiler.flags.iter().map(|f| format!("flag={f}")));
        parts.extend(self.compiler.classpath.iter().map(|c| {
            let file_name = Path::new(c)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| c.clone());
            format!("cp={file_name}")
        }));
        Digest::of_bytes(parts.join("\n").as_bytes()).as_str().to_string()
    }
}
