//! Destination stores for finished artifacts.
//!
//! The pipeline hands every artifact to an [`ArtifactStore`] exactly once,
//! under a key derived from the input name (see
//! [`crate::config::OutputNaming`]). Keys are distinct per document, so
//! independent pipeline instances never race on one key.

use crate::error::SanitizeError;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Somewhere artifacts can be written.
pub trait ArtifactStore {
    /// Persist `body` under `key` and return where it landed.
    fn put(&self, key: &str, body: &str) -> Result<PathBuf, SanitizeError>;
}

/// Writes each artifact as a file inside a directory.
///
/// Writes are atomic: the body goes to a temp file in the same directory,
/// which is then renamed over the destination, so a crash never leaves a
/// half-written artifact behind.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactStore for DirStore {
    fn put(&self, key: &str, body: &str) -> Result<PathBuf, SanitizeError> {
        let path = self.root.join(key);
        let fail = |source: std::io::Error| SanitizeError::PersistenceFailed {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.root).map_err(fail)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root).map_err(fail)?;
        tmp.write_all(body.as_bytes()).map_err(fail)?;
        tmp.persist(&path).map_err(|e| fail(e.error))?;

        debug!("Wrote {} bytes to {}", body.len(), path.display());
        Ok(path)
    }
}

/// Keeps artifacts in memory. Useful for hosts that upload elsewhere, and
/// for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl ArtifactStore for MemoryStore {
    fn put(&self, key: &str, body: &str) -> Result<PathBuf, SanitizeError> {
        self.entries
            .lock()
            .map_err(|_| SanitizeError::Internal("memory store lock poisoned".into()))?
            .insert(key.to_string(), body.to_string());
        Ok(PathBuf::from(key))
    }
}
