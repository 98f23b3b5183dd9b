//! Persisted `{source -> digest}` baseline of the last committed round.
//!
//! Stored as `config-state.json` next to the graph store. A blank digest means
//! the source is dirty; external readers of the file rely on that.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use jinc_core::digest::Digest;
use jinc_core::source::NodeSource;
use jinc_util::errors::JincError;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigurationState {
    pub format_version: u32,
    /// Generation of the graph snapshot committed together with this state.
    pub generation: u64,
    pub config_fingerprint: String,
    pub sources: BTreeMap<NodeSource, Digest>,
}

/// How the current digests differ from a [`ConfigurationState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceChanges {
    pub added: BTreeSet<NodeSource>,
    pub modified: BTreeSet<NodeSource>,
    pub removed: BTreeSet<NodeSource>,
}

impl SourceChanges {
    pub fn changed(&self) -> BTreeSet<NodeSource> {
        self.added
            .iter()
            .chain(&self.modified)
            .chain(&self.removed)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

impl ConfigurationState {
    pub fn new(config_fingerprint: impl Into<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            generation: 0,
            config_fingerprint: config_fingerprint.into(),
            sources: BTreeMap::new(),
        }
    }

    /// Read the state file. Missing, unreadable or foreign files yield `None`.
    pub fn load(path: &Path) -> Option<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("cannot read {}: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(state) if state.format_version == FORMAT_VERSION => Some(state),
            Ok(state) => {
                tracing::warn!(
                    "ignoring {} with format version {}",
                    path.display(),
                    state.format_version
                );
                None
            }
            Err(e) => {
                tracing::warn!("ignoring corrupt {}: {e}", path.display());
                None
            }
        }
    }

    /// Write the state file atomically.
    pub fn save(&self, path: &Path) -> miette::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| JincError::Storage {
            message: format!("cannot encode configuration state: {e}"),
        })?;
        jinc_util::fs::write_atomic(path, json.as_bytes()).map_err(|e| JincError::Storage {
            message: format!("cannot write {}: {e}", path.display()),
        })?;
        Ok(())
    }

    pub fn digest(&self, source: &NodeSource) -> Option<&Digest> {
        self.sources.get(source)
    }

    /// Sources recorded with the dirty sentinel.
    pub fn dirty_sources(&self) -> BTreeSet<NodeSource> {
        self.sources
            .iter()
            .filter(|(_, digest)| digest.is_empty())
            .map(|(source, _)| source.clone())
            .collect()
    }

    /// Compare against freshly computed digests.
    ///
    /// A source whose old or new digest is the dirty sentinel always counts
    /// as modified.
    pub fn diff(&self, current: &BTreeMap<NodeSource, Digest>) -> SourceChanges {
        let mut changes = SourceChanges::default();
        for (source, digest) in current {
            match self.sources.get(source) {
                None => {
                    changes.added.insert(source.clone());
                }
                Some(old) if old.is_empty() || digest.is_empty() || old != digest => {
                    changes.modified.insert(source.clone());
                }
                Some(_) => {}
            }
        }
        for source in self.sources.keys() {
            if !current.contains_key(source) {
                changes.removed.insert(source.clone());
            }
        }
        changes
    }
}
