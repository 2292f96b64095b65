use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::favourites::FavouritesSet;
use crate::source::CharacterRecord;

/// Key under which the favourites snapshot lives.
pub const FAVOURITES_KEY: &str = "favourites";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write store {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store {path} is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("value under '{key}' is not a favourites list: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode favourites: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
}

/// A durable string-to-string map, the same contract as browser local
/// storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A JSON object on disk. Every `set`/`remove` rewrites the whole file
/// before returning, staging it next to the target and renaming it into
/// place. A missing file reads as an empty store.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    /// Sibling file the new contents are staged in before the rename.
    fn staging_path(&self) -> PathBuf {
        let mut name = std::ffi::OsString::from(".");
        name.push(self.path.file_name().unwrap_or_default());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.display_path(),
                    source: e,
                })
            }
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
            path: self.display_path(),
            source: e,
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        let contents = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Encode { source: e })?;
        let staging = self.staging_path();
        std::fs::write(&staging, contents).map_err(|e| StoreError::Write {
            path: staging.display().to_string(),
            source: e,
        })?;
        std::fs::rename(&staging, &self.path).map_err(|e| StoreError::Write {
            path: self.display_path(),
            source: e,
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Reads and writes the favourites snapshot under [`FAVOURITES_KEY`].
#[derive(Clone, Debug)]
pub struct FavouritesStore<S> {
    inner: S,
}

impl<S: KeyValueStore> FavouritesStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    pub fn load(&self) -> Result<FavouritesSet, StoreError> {
        let Some(raw) = self.inner.get(FAVOURITES_KEY)? else {
            return Ok(FavouritesSet::new());
        };
        let records: Vec<CharacterRecord> =
            serde_json::from_str(&raw).map_err(|e| StoreError::Decode {
                key: FAVOURITES_KEY.to_string(),
                source: e,
            })?;
        let stored = records.len();
        let set: FavouritesSet = records.into_iter().collect();
        if set.len() != stored {
            warn!(
                stored,
                kept = set.len(),
                "dropped duplicate identifiers from stored favourites"
            );
        }
        debug!(count = set.len(), "loaded favourites");
        Ok(set)
    }

    pub fn save(&mut self, set: &FavouritesSet) -> Result<(), StoreError> {
        let raw = serde_json::to_string(set.records())
            .map_err(|e| StoreError::Encode { source: e })?;
        self.inner.set(FAVOURITES_KEY, &raw)?;
        debug!(count = set.len(), "saved favourites");
        Ok(())
    }
}
