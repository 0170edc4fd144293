//! Output types: blocks, artifacts and batch reports.
//!
//! Every type here serialises to the JSON shape written to the destination
//! store, so field names are part of the on-disk contract.

use crate::error::{FileError, SanitizeError};
use crate::pipeline::classify::DocumentType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// A text-bearing node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Trimmed, never empty.
    pub text: String,
    pub label: Option<String>,
    /// 1-indexed page from the node's first provenance entry.
    pub page: Option<u64>,
}

/// A table with at least one non-empty row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBlock {
    pub page: Option<u64>,
    pub rows: Vec<Vec<String>>,
}

/// A structural grouping node. `children_refs` is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBlock {
    pub label: String,
    pub children_refs: Value,
}

/// Structural-mode output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralArtifact {
    pub source_file: String,
    pub texts: Vec<TextBlock>,
    pub tables: Vec<TableBlock>,
    pub groups: Vec<GroupBlock>,
}

/// Classification-mode output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedArtifact {
    pub source_file: String,
    pub document_type: DocumentType,
    pub confidence: f64,
    /// Prefix of the normalised block sequence.
    pub summary_blocks: Vec<String>,
    /// Normalised blocks matching both the date and the money pattern.
    pub transaction_candidates: Vec<String>,
}

/// The artifact produced for one input document.
///
/// Serialised untagged: the JSON is exactly the inner artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SanitizedArtifact {
    Classified(ClassifiedArtifact),
    Structural(StructuralArtifact),
}

impl SanitizedArtifact {
    pub fn source_file(&self) -> &str {
        match self {
            SanitizedArtifact::Structural(a) => &a.source_file,
            SanitizedArtifact::Classified(a) => &a.source_file,
        }
    }

    /// Pretty JSON: 2-space indentation, non-ASCII written verbatim.
    pub fn to_json_pretty(&self) -> Result<String, SanitizeError> {
        serde_json::to_string_pretty(self).map_err(|e| SanitizeError::SerializationFailed {
            name: self.source_file().to_string(),
            detail: e.to_string(),
        })
    }
}

/// Result of processing one file in a batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub source_file: String,
    /// Where the artifact was written, when it was.
    pub output_path: Option<PathBuf>,
    pub result: Result<SanitizedArtifact, SanitizeError>,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            source_file: self.source_file.clone(),
            output_path: self.output_path.clone(),
            document_type: match &self.result {
                Ok(SanitizedArtifact::Classified(a)) => Some(a.document_type),
                _ => None,
            },
            error: self
                .result
                .as_ref()
                .err()
                .map(|e| FileError::from_error(&self.source_file, e)),
        }
    }
}

/// Serialisable view of a [`FileOutcome`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    pub source_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FileError>,
}

/// Aggregate statistics for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Inputs handed to the batch (after ledger filtering).
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Inputs skipped because the ledger had already seen them.
    pub skipped: usize,
    /// Inputs never started because the run was cancelled.
    pub cancelled: usize,
    pub duration_ms: u64,
    pub files: Vec<FileSummary>,
}

impl BatchReport {
    pub fn from_outcomes(outcomes: &[FileOutcome], total: usize, skipped: usize, duration_ms: u64) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
        Self {
            total,
            succeeded,
            failed: outcomes.len() - succeeded,
            skipped,
            cancelled: total.saturating_sub(outcomes.len()),
            duration_ms,
            files: outcomes.iter().map(FileOutcome::summary).collect(),
        }
    }
}
