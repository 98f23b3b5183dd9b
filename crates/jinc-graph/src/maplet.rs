//! Durable, versioned key/value storage for one build output.
//!
//! A store holds named maplets, each a map from string keys to JSON values.
//! The whole store lives in a single file:
//!
//! ```text
//! JINC-MAPLET <format-version> <schema-version> <generation> <sha256-of-payload>
//! {"maplet-name":{"key":value,...},...}
//! ```
//!
//! A file that is missing, truncated, from another format or schema version,
//! or whose payload does not match its checksum opens as an empty store with
//! [`MapletStore::recovered`] set. Callers must then treat everything the
//! store used to hold as absent.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use jinc_core::digest::Digest;
use jinc_util::errors::JincError;

const MAGIC: &str = "JINC-MAPLET";

/// Version of the file framing. Bump on changes to the header or payload layout.
pub const FORMAT_VERSION: u32 = 1;

type Maplets = BTreeMap<String, BTreeMap<String, Value>>;

/// An open maplet store.
///
/// Writable stores hold an exclusive lock for their whole lifetime.
/// Changes stay in memory until [`snapshot`](Self::snapshot) or
/// [`close`](Self::close); dropping a store without closing it discards them.
#[derive(Debug)]
pub struct MapletStore {
    path: PathBuf,
    maplets: Maplets,
    generation: u64,
    recovered: bool,
    dirty: bool,
    lock: Option<StoreLock>,
}

impl MapletStore {
    /// Open `path` for writing, taking the exclusive lock at `lock_path`.
    ///
    /// Fails fast with [`JincError::Locked`] when another process holds it.
    pub fn open(path: &Path, lock_path: &Path) -> miette::Result<Self> {
        let lock = StoreLock::acquire(lock_path)?;
        let mut store = Self::load(path);
        store.lock = Some(lock);
        Ok(store)
    }

    /// Open `path` without locking. The result cannot be snapshotted.
    pub fn open_read_only(path: &Path) -> Self {
        Self::load(path)
    }

    fn load(path: &Path) -> Self {
        let mut store = Self {
            path: path.to_path_buf(),
            maplets: Maplets::new(),
            generation: 0,
            recovered: false,
            dirty: false,
            lock: None,
        };
        match std::fs::read(path) {
            Ok(raw) => match decode(&raw) {
                Ok((generation, maplets)) => {
                    store.generation = generation;
                    store.maplets = maplets;
                }
                Err(reason) => {
                    tracing::warn!("discarding store {}: {reason}", path.display());
                    store.recovered = true;
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                store.recovered = true;
            }
            Err(e) => {
                tracing::warn!("cannot read store {}: {e}", path.display());
                store.recovered = true;
            }
        }
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `true` when the file was missing or unusable and the store opened empty.
    pub fn recovered(&self) -> bool {
        self.recovered
    }

    /// Generation of the last snapshot; `0` for a fresh store.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get<T: DeserializeOwned>(&self, maplet: &str, key: &str) -> miette::Result<Option<T>> {
        let Some(value) = self.maplets.get(maplet).and_then(|m| m.get(key)) else {
            return Ok(None);
        };
        let decoded = serde_json::from_value(value.clone()).map_err(|e| JincError::Storage {
            message: format!("malformed value for {maplet}/{key}: {e}"),
        })?;
        Ok(Some(decoded))
    }

    pub fn put<T: Serialize>(&mut self, maplet: &str, key: &str, value: &T) -> miette::Result<()> {
        let value = serde_json::to_value(value).map_err(|e| JincError::Storage {
            message: format!("cannot encode {maplet}/{key}: {e}"),
        })?;
        let entry = self
            .maplets
            .entry(maplet.to_string())
            .or_default()
            .entry(key.to_string());
        match entry {
            std::collections::btree_map::Entry::Occupied(mut slot) => {
                if *slot.get() != value {
                    slot.insert(value);
                    self.dirty = true;
                }
            }
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
                self.dirty = true;
            }
        }
        Ok(())
    }

    /// Remove `key`; returns whether it was present.
    pub fn delete(&mut self, maplet: &str, key: &str) -> bool {
        let removed = self
            .maplets
            .get_mut(maplet)
            .is_some_and(|m| m.remove(key).is_some());
        if removed {
            self.dirty = true;
        }
        removed
    }

    /// Keys of `maplet`, sorted.
    pub fn keys(&self, maplet: &str) -> Vec<String> {
        self.maplets
            .get(maplet)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop every maplet, as if the store had been recovered empty.
    pub fn clear(&mut self) {
        if !self.maplets.is_empty() {
            self.maplets.clear();
            self.dirty = true;
        }
    }

    /// Make all changes durable under a new generation and return it.
    ///
    /// The file is replaced atomically, so a crash leaves either the previous
    /// snapshot or this one.
    pub fn snapshot(&mut self) -> miette::Result<u64> {
        if self.lock.is_none() {
            return Err(JincError::Storage {
                message: format!("store {} is open read-only", self.path.display()),
            }
            .into());
        }
        let generation = self.generation + 1;
        let bytes = encode(generation, &self.maplets)?;
        jinc_util::fs::write_atomic(&self.path, &bytes).map_err(|e| JincError::Storage {
            message: format!("cannot write {}: {e}", self.path.display()),
        })?;
        self.generation = generation;
        self.dirty = false;
        self.recovered = false;
        tracing::debug!(
            "snapshot {} at generation {generation}",
            self.path.display()
        );
        Ok(generation)
    }

    /// Flush pending changes and release the lock.
    pub fn close(mut self) -> miette::Result<()> {
        if self.dirty && self.lock.is_some() {
            self.snapshot()?;
        }
        Ok(())
    }
}

fn encode(generation: u64, maplets: &Maplets) -> miette::Result<Vec<u8>> {
    let payload = serde_json::to_vec(maplets).map_err(|e| JincError::Storage {
        message: format!("cannot encode store payload: {e}"),
    })?;
    let checksum = Digest::of_bytes(&payload);
    let mut bytes = format!(
        "{MAGIC} {FORMAT_VERSION} {} {generation} {checksum}\n",
        jinc_core::SCHEMA_VERSION
    )
    .into_bytes();
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

fn decode(raw: &[u8]) -> Result<(u64, Maplets), String> {
    let newline = raw
        .iter()
        .position(|&b| b == b'\n')
        .ok_or("missing header")?;
    let header = std::str::from_utf8(&raw[..newline]).map_err(|_| "header is not UTF-8")?;
    let payload = &raw[newline + 1..];

    let fields: Vec<&str> = header.split(' ').collect();
    let [magic, format, schema, generation, checksum] = fields[..] else {
        return Err(format!("malformed header '{header}'"));
    };
    if magic != MAGIC {
        return Err("not a maplet store".to_string());
    }
    if format.parse::<u32>().ok() != Some(FORMAT_VERSION) {
        return Err(format!("unsupported format version {format}"));
    }
    if schema.parse::<u32>().ok() != Some(jinc_core::SCHEMA_VERSION) {
        return Err(format!("unsupported schema version {schema}"));
    }
    let generation = generation
        .parse::<u64>()
        .map_err(|_| format!("bad generation '{generation}'"))?;
    if Digest::of_bytes(payload).as_str() != checksum {
        return Err("checksum mismatch".to_string());
    }
    let maplets = serde_json::from_slice(payload).map_err(|e| format!("bad payload: {e}"))?;
    Ok((generation, maplets))
}

/// Exclusive advisory lock on a build output.
///
/// The lock lives on an open handle to the lock file, not in the file's
/// existence. The kernel releases it when the holder exits, so a lock file
/// left behind by a killed build does not block the next round.
pub struct StoreLock {
    path: PathBuf,
    _held: Held,
}

impl std::fmt::Debug for StoreLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreLock").field("path", &self.path).finish()
    }
}

#[cfg(unix)]
type Held = nix::fcntl::Flock<File>;
#[cfg(not(unix))]
type Held = File;

impl StoreLock {
    /// Take the lock without waiting; [`JincError::Locked`] if someone holds it.
    pub fn acquire(path: &Path) -> Result<Self, JincError> {
        if let Some(parent) = path.parent() {
            jinc_util::fs::ensure_dir(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let mut held = lock_exclusive(file, path)?;
        // Informational only. A failure here drops `held` and releases the lock.
        held.set_len(0)?;
        writeln!(held, "{}", std::process::id())?;
        Ok(Self {
            path: path.to_path_buf(),
            _held: held,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn lock_exclusive(file: File, path: &Path) -> Result<Held, JincError> {
    use nix::errno::Errno;
    use nix::fcntl::{Flock, FlockArg};

    match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
        Ok(held) => Ok(held),
        Err((_, errno)) if errno == Errno::EWOULDBLOCK => Err(JincError::Locked {
            path: path.to_path_buf(),
        }),
        Err((_, errno)) => Err(JincError::Io(std::io::Error::from(errno))),
    }
}

#[cfg(not(unix))]
fn lock_exclusive(file: File, _path: &Path) -> Result<Held, JincError> {
    tracing::debug!("advisory locks unavailable on this platform; output is not locked");
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rejects_wrong_field_count() {
        assert!(decode(b"JINC-MAPLET 1 1\n{}").is_err());
    }

    #[test]
    fn test_decode_accepts_encoded() {
        let mut maplets = Maplets::new();
        maplets
            .entry("m".to_string())
            .or_default()
            .insert("k".to_string(), Value::from(3));
        let bytes = encode(7, &maplets).unwrap();
        let (generation, back) = decode(&bytes).unwrap();
        assert_eq!(generation, 7);
        assert_eq!(back, maplets);
    }
}
