//! # docling-sanitizer
//!
//! Turn raw Docling parser output (deeply nested, schema-loose JSON) into
//! small, privacy-reduced artifacts for downstream financial analysis.
//!
//! ## Why this crate?
//!
//! Docling dumps carry everything the parser saw: geometry, styling,
//! provenance chains, image references. Downstream consumers only need the
//! text, the tables and a rough idea of what kind of document it was. This
//! crate walks the tree once, keeps the blocks that matter, and optionally
//! scores the document against a keyword table to label it as a credit card
//! invoice, a bank statement or a payment receipt.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Docling JSON
//!  │
//!  ├─ 1. Walk       texts / table rows / groups, in document order
//!  │                (or every string, for inputs outside the schema)
//!  ├─ 2. Normalise  lowercase, strip accents, ASCII-only, collapse spaces
//!  ├─ 3. Classify   keyword counts → document type + confidence
//!  ├─ 4. Candidates blocks with both a date and a money amount
//!  └─ 5. Output     one pretty-printed JSON artifact per input
//! ```
//!
//! Steps 2–4 only run in [`PipelineMode::Classification`]; the default
//! [`PipelineMode::Structural`] stops after the walk.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docling_sanitizer::{sanitize_dir, PipelineMode, ProcessedLedger, SanitizeConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SanitizeConfig::builder()
//!         .mode(PipelineMode::Classification)
//!         .input_dir("data/processed")
//!         .output_dir("data/sanitized")
//!         .build()?;
//!     let mut ledger = ProcessedLedger::load("data/state/processed_files.json");
//!     let run = sanitize_dir(&config, Some(&mut ledger))?;
//!     eprintln!("{}/{} files sanitised", run.report.succeeded, run.report.total);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docsanitize` binary (clap + anyhow + tracing-subscriber) |
//! | `pdf`   | on      | Raw PDF text extraction via pdfium ([`pdf_text`]) |
//!
//! Disable both when using only the JSON pipeline:
//! ```toml
//! docling-sanitizer = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod ledger;
pub mod output;
#[cfg(feature = "pdf")]
pub mod pdf_text;
pub mod pipeline;
pub mod progress;
pub mod sanitize;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionStrategy, OutputNaming, PipelineMode, SanitizeConfig, SanitizeConfigBuilder};
pub use error::{FileError, SanitizeError};
pub use ledger::ProcessedLedger;
pub use output::{
    BatchReport, ClassifiedArtifact, FileOutcome, FileSummary, GroupBlock, SanitizedArtifact,
    StructuralArtifact, TableBlock, TextBlock,
};
pub use pipeline::candidates::{CandidateExtractor, TransactionPatterns};
pub use pipeline::classify::{ClassificationResult, Classifier, DocumentSignals, DocumentType};
pub use pipeline::normalize::normalize;
pub use pipeline::walk::{walk, Extraction};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use sanitize::{
    classify_blocks, list_inputs, sanitize_batch, sanitize_bytes, sanitize_dir, sanitize_file,
    sanitize_value, DirRun,
};
pub use store::{ArtifactStore, DirStore, MemoryStore};
