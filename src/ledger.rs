//! Append-only ledger of already-processed input names.
//!
//! The batch host keeps this file between runs so scheduled jobs only pick
//! up new inputs. It is a plain JSON array of names, saved after every
//! successful file so a crash mid-batch loses at most the file in flight.
//!
//! A missing or unreadable ledger is treated as empty (and logged) rather
//! than failing the run: reprocessing is safe because artifacts are written
//! under stable keys.

use crate::error::SanitizeError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

#[derive(Debug, Clone)]
pub struct ProcessedLedger {
    path: PathBuf,
    names: Vec<String>,
    seen: HashSet<String>,
}

impl ProcessedLedger {
    /// Open the ledger at `path`, starting empty when the file is absent or
    /// cannot be parsed.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let names: Vec<String> = if path.exists() {
            match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()))
            {
                Ok(names) => names,
                Err(e) => {
                    error!("Error loading ledger {}: {}", path.display(), e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        let seen = names.iter().cloned().collect();
        Self { path, names, seen }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn is_processed(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    /// Names not yet in the ledger, in their original order.
    pub fn pending<'a, I>(&self, names: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().filter(|n| !self.is_processed(n)).collect()
    }

    /// Append `name` and save immediately. Recording a known name is a no-op.
    pub fn record(&mut self, name: &str) -> Result<(), SanitizeError> {
        if !self.seen.insert(name.to_string()) {
            return Ok(());
        }
        self.names.push(name.to_string());
        self.save()
    }

    /// Record and log instead of propagating a save failure.
    pub fn record_or_warn(&mut self, name: &str) {
        if let Err(e) = self.record(name) {
            warn!("Error saving ledger after {}: {}", name, e);
        }
    }

    pub fn save(&self) -> Result<(), SanitizeError> {
        let fail = |source: std::io::Error| SanitizeError::PersistenceFailed {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(fail)?;
        }
        let body = serde_json::to_string_pretty(&self.names)
            .map_err(|e| SanitizeError::Internal(format!("ledger serialisation: {e}")))?;
        std::fs::write(&self.path, body).map_err(fail)
    }
}
