//! File-backed key-value store
//!
//! Each key maps to one file under the base directory. Writes go to a
//! temporary sibling first and are renamed into place, so a crash leaves
//! either the old value or the new one.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::KeyValueStore;
use crate::core::ChatResult;

/// Default directory for persisted values
const STORE_DIR: &str = ".viveka";

/// File extension for value files
const VALUE_EXT: &str = "json";

/// File-backed store manager
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a new store with the default directory
    pub fn new() -> Self {
        Self {
            base_dir: PathBuf::from(STORE_DIR),
        }
    }

    /// Create a new store with a custom directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: dir.into(),
        }
    }

    /// Get the file path for a key
    ///
    /// Anything outside `[A-Za-z0-9_-]` becomes `_` so keys cannot escape
    /// the base directory.
    pub fn value_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_dir.join(format!("{}.{}", name, VALUE_EXT))
    }

    /// Create the base directory if it doesn't exist
    pub fn ensure_dir(&self) -> ChatResult<()> {
        if !self.base_dir.exists() {
            fs::create_dir_all(&self.base_dir)?;
        }
        Ok(())
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> ChatResult<Option<String>> {
        match fs::read_to_string(self.value_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> ChatResult<()> {
        self.ensure_dir()?;
        let path = self.value_path(key);
        let tmp = path.with_extension("tmp");

        let mut file = File::create(&tmp)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, &path)?;

        tracing::debug!("Stored {} bytes under {:?}", value.len(), path);
        Ok(())
    }

    fn remove(&self, key: &str) -> ChatResult<()> {
        match fs::remove_file(self.value_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
