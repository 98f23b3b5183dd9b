//! Content digests used for change detection.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// Lowercase hex SHA-256 of a source's bytes, or the empty sentinel.
///
/// The empty digest marks a source as dirty: it has not been (re)compiled
/// successfully and owns no valid artifacts. It is never a real hash, and it
/// is persisted as a blank string so external readers of the configuration
/// state see the same meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// The dirty sentinel.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Digest of in-memory content.
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(data)))
    }

    /// Digest of a file's content, streamed rather than read into memory.
    ///
    /// Fails for anything that cannot be read as a regular file, directories
    /// included. Callers decide whether that makes the source dirty.
    pub fn of_file(path: &Path) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher)?;
        Ok(Self(format!("{:x}", hasher.finalize())))
    }

    /// Wrap an already computed hex hash. Blank input yields the sentinel.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        let hex: String = hex.into();
        if hex.trim().is_empty() {
            Self::empty()
        } else {
            Self(hex)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("<dirty>")
        } else {
            f.write_str(&self.0)
        }
    }
}
