//! Persistent key-value storage for client state.
//!
//! Stands in for the web client's local storage: synchronous string
//! get/set with no transactions. [`FileKv`] keeps one file per key and
//! writes through a temp-file rename so a crashed write never leaves a
//! half-written snapshot behind. [`MemoryKv`] backs tests.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::PersistenceError;

/// Synchronous string key-value store.
pub trait KvStore: Send {
    /// Read the value for `key`, if present.
    fn get(&self, key: &str) -> Option<String>;

    /// Write `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] when the underlying write fails;
    /// callers treat that as advisory (see the favorites store).
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: HashMap<String, String>,
}

impl MemoryKv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// File-backed store, one file per key under a directory.
#[derive(Debug)]
pub struct FileKv {
    dir: PathBuf,
}

impl FileKv {
    /// Open (creating if necessary) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the directory cannot be
    /// created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| PersistenceError::Write {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys may contain separators ("favorites:guest"); flatten to a
        // safe file name.
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl KvStore for FileKv {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        // temp write + rename keeps the visible file whole even if the
        // process dies mid-write
        std::fs::write(&tmp, value).map_err(|source| PersistenceError::Write {
            key: key.to_owned(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| PersistenceError::Write {
            key: key.to_owned(),
            source,
        })
    }
}
