//! Error types for the docling-sanitizer library.
//!
//! Two types reflect two different audiences:
//!
//! * [`SanitizeError`] — the typed failure of one document (or of the
//!   configuration). Returned as `Err(SanitizeError)` from the per-document
//!   entry points and carried inside [`crate::output::FileOutcome`] by the
//!   batch driver, so one bad file never aborts a batch.
//!
//! * [`FileError`] — a serialisable summary of a [`SanitizeError`] for batch
//!   reports. It drops the non-serialisable `io::Error` sources and keeps
//!   only what a log reader or a JSON consumer needs.
//!
//! A document that matches no keyword is not an error: classification
//! degrades to `UNKNOWN` with confidence `0.0`.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the docling-sanitizer library.
#[derive(Debug, Error)]
pub enum SanitizeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The top-level input is not decodable as JSON at all.
    ///
    /// Only raised for the document as a whole; malformed subtrees inside a
    /// valid JSON document are absorbed by the walker.
    #[error("'{name}' is not valid JSON: {detail}")]
    MalformedInput { name: String, detail: String },

    /// The source file could not be read from disk.
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input directory does not exist or cannot be listed.
    #[error("Input directory '{path}' cannot be listed: {source}")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Writing the artifact to the destination store failed.
    #[error("Failed to write artifact '{path}': {source}")]
    PersistenceFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact could not be serialised to JSON.
    #[error("Failed to serialise artifact for '{name}': {detail}")]
    SerializationFailed { name: String, detail: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium rejected the document bytes.
    #[error("PDF '{name}' could not be opened: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed, or a signal table could not be loaded.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SanitizeError {
    /// Short machine-readable tag for reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SanitizeError::MalformedInput { .. } => "malformed_input",
            SanitizeError::InputReadFailed { .. } => "input_read_failed",
            SanitizeError::InputDirUnreadable { .. } => "input_dir_unreadable",
            SanitizeError::PersistenceFailed { .. } => "persistence_failed",
            SanitizeError::SerializationFailed { .. } => "serialization_failed",
            SanitizeError::CorruptPdf { .. } => "corrupt_pdf",
            SanitizeError::PdfiumBindingFailed(_) => "pdfium_binding_failed",
            SanitizeError::InvalidConfig(_) => "invalid_config",
            SanitizeError::Internal(_) => "internal",
        }
    }
}

/// Serialisable per-file error summary used in batch reports.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[error("{file}: {message}")]
pub struct FileError {
    /// Source filename the error belongs to.
    pub file: String,
    /// Stable tag from [`SanitizeError::kind`].
    pub kind: String,
    /// Rendered error message.
    pub message: String,
}

impl FileError {
    pub fn from_error(file: impl Into<String>, err: &SanitizeError) -> Self {
        Self {
            file: file.into(),
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}
