use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::manifest::Manifest;

/// Global user configuration loaded from `~/.jinc/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub build: BuildConfig,
}

/// Build settings from `[build]` in global config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_jobs")]
    pub jobs: u32,
    #[serde(default = "default_diagnostic_sessions", rename = "diagnostic-sessions")]
    pub diagnostic_sessions: u32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            diagnostic_sessions: default_diagnostic_sessions(),
        }
    }
}

fn default_jobs() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(4)
}

fn default_diagnostic_sessions() -> u32 {
    10
}

impl GlobalConfig {
    /// Load the global configuration from `~/.jinc/config.toml`, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if path.is_file() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                jinc_util::errors::JincError::Generic {
                    message: format!("Failed to read global config: {e}"),
                }
            })?;
            toml::from_str(&content).map_err(|e| {
                jinc_util::errors::JincError::Generic {
                    message: format!("Failed to parse global config: {e}"),
                }
                .into()
            })
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }
}

/// Settings of one build after layering the manifest over the global config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveBuild {
    pub jobs: usize,
    pub log: bool,
    pub diagnostic_sessions: usize,
}

impl EffectiveBuild {
    pub fn resolve(manifest: &Manifest, global: &GlobalConfig) -> Self {
        let jobs = manifest.build.jobs.unwrap_or(global.build.jobs).max(1);
        let sessions = manifest
            .build
            .diagnostic_sessions
            .unwrap_or(global.build.diagnostic_sessions);
        Self {
            jobs: jobs as usize,
            log: manifest.build.log,
            diagnostic_sessions: sessions as usize,
        }
    }
}

/// Returns the path to the jinc data directory (`~/.jinc/`).
pub fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".jinc")
}
