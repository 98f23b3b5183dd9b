//! Compilation input identities.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Identifies one compilation input by a stable, relocation-independent key:
/// its path relative to the project root, with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeSource(String);

impl NodeSource {
    /// Create a source from a relative key. Backslashes are normalized.
    pub fn new(key: impl Into<String>) -> Self {
        let key: String = key.into();
        Self(key.replace('\\', "/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File extension of the source, if any (`"kt"`, `"java"`).
    pub fn extension(&self) -> Option<&str> {
        let name = self.0.rsplit('/').next()?;
        let (_, ext) = name.rsplit_once('.')?;
        Some(ext)
    }
}

impl fmt::Display for NodeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeSource {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Maps between absolute file paths and relocation-independent [`NodeSource`] keys.
#[derive(Debug, Clone)]
pub struct PathSourceMapper {
    root: PathBuf,
}

impl PathSourceMapper {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Key for a path under the root; `None` for paths outside it.
    pub fn to_source(&self, path: &Path) -> Option<NodeSource> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        if parts.is_empty() {
            return None;
        }
        Some(NodeSource(parts.join("/")))
    }

    /// Absolute path of a source key.
    pub fn to_path(&self, source: &NodeSource) -> PathBuf {
        source
            .as_str()
            .split('/')
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}
