//! PDF text extraction: page-by-page, line-by-line raw text via pdfium.
//!
//! Some inputs arrive as PDF rather than as Docling JSON. This adapter pulls
//! the embedded text layer out page by page and keeps every non-blank line,
//! trimmed. No layout analysis, no OCR, no images. The resulting
//! [`PdfTextDocument`] is persisted under a generated id and its lines can be
//! fed to [`crate::sanitize::classify_blocks`].
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library with thread-local state and is not safe to call
//! from async contexts. [`extract_pdf_text`] moves the work onto the blocking
//! pool so a Tokio host's worker threads never stall.
//!
//! ## Binding
//!
//! `PDFIUM_LIB_PATH` names a specific libpdfium file; without it the system
//! library search path is used.

use crate::config::SanitizeConfig;
use crate::error::{FileError, SanitizeError};
use crate::ledger::ProcessedLedger;
use crate::output::{BatchReport, FileSummary};
use crate::progress::{BatchProgressCallback, NoopProgressCallback};
use crate::sanitize::{file_name, list_inputs};
use crate::store::{ArtifactStore, DirStore};
use chrono::{SecondsFormat, Utc};
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Lines of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLines {
    /// 1-indexed page number.
    pub page: usize,
    pub content: Vec<String>,
}

/// Raw text of a whole PDF, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfTextDocument {
    pub document_id: String,
    pub filename: String,
    /// RFC 3339 UTC timestamp with a `Z` suffix.
    pub extracted_at: String,
    pub total_pages: usize,
    pub pages: Vec<PageLines>,
}

impl PdfTextDocument {
    /// Assemble a document from already-extracted pages, stamping a fresh id
    /// and the current time.
    pub fn from_pages(filename: impl Into<String>, pages: Vec<PageLines>) -> Self {
        Self {
            document_id: uuid::Uuid::new_v4().to_string(),
            filename: filename.into(),
            extracted_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            total_pages: pages.len(),
            pages,
        }
    }

    /// All lines in page order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|p| p.content.iter().map(String::as_str))
    }

    /// Destination key: `<document_id>.json`.
    pub fn key(&self) -> String {
        format!("{}.json", self.document_id)
    }

    /// Write the document to `store` as pretty JSON.
    pub fn persist(&self, store: &dyn ArtifactStore) -> Result<PathBuf, SanitizeError> {
        let body = serde_json::to_string_pretty(self).map_err(|e| {
            SanitizeError::SerializationFailed {
                name: self.filename.clone(),
                detail: e.to_string(),
            }
        })?;
        store.put(&self.key(), &body)
    }
}

/// Split one page's text into trimmed, non-blank lines.
pub fn split_page_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract text from PDF bytes on the blocking thread pool.
pub async fn extract_pdf_text(
    bytes: Vec<u8>,
    filename: String,
) -> Result<PdfTextDocument, SanitizeError> {
    tokio::task::spawn_blocking(move || extract_pdf_text_blocking(&bytes, &filename))
        .await
        .map_err(|e| SanitizeError::Internal(format!("PDF text task panicked: {}", e)))?
}

/// Blocking implementation of [`extract_pdf_text`].
pub fn extract_pdf_text_blocking(
    bytes: &[u8],
    filename: &str,
) -> Result<PdfTextDocument, SanitizeError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| SanitizeError::CorruptPdf {
            name: filename.to_string(),
            detail: format!("{:?}", e),
        })?;

    let mut pages = Vec::new();
    for (index, page) in document.pages().iter().enumerate() {
        let text = page.text().map_err(|e| SanitizeError::CorruptPdf {
            name: filename.to_string(),
            detail: format!("page {}: {:?}", index + 1, e),
        })?;
        let content = split_page_lines(&text.all());
        debug!("Page {}: {} lines", index + 1, content.len());
        pages.push(PageLines {
            page: index + 1,
            content,
        });
    }

    info!("Extracted text from {} ({} pages)", filename, pages.len());
    Ok(PdfTextDocument::from_pages(filename, pages))
}

/// Extract every `*.pdf` in `config.input_dir` into `config.output_dir`.
///
/// Mirrors [`crate::sanitize::sanitize_dir`]: ledgered files are skipped,
/// failures are isolated per file, and `config.progress_callback` receives
/// the same events. Output keys are always generated ids.
pub async fn extract_pdf_dir(
    config: &SanitizeConfig,
    mut ledger: Option<&mut ProcessedLedger>,
) -> Result<BatchReport, SanitizeError> {
    let start = Instant::now();
    let paths = list_inputs(&config.input_dir, "pdf")?;
    let found = paths.len();
    let pending: Vec<PathBuf> = match ledger.as_deref() {
        Some(l) => paths
            .into_iter()
            .filter(|p| !l.is_processed(&file_name(p)))
            .collect(),
        None => paths,
    };
    let total = pending.len();
    info!(
        "Extracting text from {} PDFs in {} ({} already processed)",
        total,
        config.input_dir.display(),
        found - total
    );

    let noop = NoopProgressCallback;
    let cb: &dyn BatchProgressCallback = match config.progress_callback {
        Some(ref cb) => cb.as_ref(),
        None => &noop,
    };
    let store = DirStore::new(&config.output_dir);
    let mut files = Vec::with_capacity(total);

    cb.on_batch_start(total);
    for (index, path) in pending.into_iter().enumerate() {
        if !cb.should_continue() {
            warn!("Batch cancelled after {} of {} files", index, total);
            break;
        }
        let name = file_name(&path);
        cb.on_file_start(index, total, &name);

        let result = match tokio::fs::read(&path).await {
            Ok(bytes) => extract_pdf_text(bytes, name.clone())
                .await
                .and_then(|doc| doc.persist(&store)),
            Err(e) => Err(SanitizeError::InputReadFailed {
                path: path.clone(),
                source: e,
            }),
        };

        match result {
            Ok(output_path) => {
                if let Some(l) = ledger.as_deref_mut() {
                    l.record_or_warn(&name);
                }
                cb.on_file_complete(index, total, &name);
                files.push(FileSummary {
                    source_file: name,
                    output_path: Some(output_path),
                    document_type: None,
                    error: None,
                });
            }
            Err(e) => {
                warn!("Failed to extract text from {}: {}", name, e);
                cb.on_file_error(index, total, &name, &e.to_string());
                files.push(FileSummary {
                    error: Some(FileError::from_error(&name, &e)),
                    source_file: name,
                    output_path: None,
                    document_type: None,
                });
            }
        }
    }

    let succeeded = files.iter().filter(|f| f.error.is_none()).count();
    cb.on_batch_complete(total, succeeded);
    Ok(BatchReport {
        total,
        succeeded,
        failed: files.len() - succeeded,
        skipped: found - total,
        cancelled: total - files.len(),
        duration_ms: start.elapsed().as_millis() as u64,
        files,
    })
}

fn bind_pdfium() -> Result<Pdfium, SanitizeError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| SanitizeError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}
