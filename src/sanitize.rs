//! Sanitisation entry points: one document, a batch, or a directory.
//!
//! ## Layers
//!
//! - [`sanitize_value`] — pure: parsed JSON in, artifact out. Never fails.
//! - [`sanitize_bytes`] — decodes the JSON first; the only failure is
//!   [`SanitizeError::MalformedInput`].
//! - [`sanitize_batch`] / [`sanitize_dir`] — drive many documents through
//!   the above and an [`ArtifactStore`], one at a time, in input order. A
//!   failing document is logged and recorded in its [`FileOutcome`]; the
//!   batch always moves on to the next one.

use crate::config::{PipelineMode, SanitizeConfig};
use crate::error::SanitizeError;
use crate::ledger::ProcessedLedger;
use crate::output::{
    BatchReport, ClassifiedArtifact, FileOutcome, SanitizedArtifact, StructuralArtifact,
};
use crate::pipeline::candidates::CandidateExtractor;
use crate::pipeline::classify::Classifier;
use crate::pipeline::normalize::normalize;
use crate::pipeline::walk;
use crate::progress::{BatchProgressCallback, NoopProgressCallback};
use crate::store::{ArtifactStore, DirStore};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Sanitise an already-parsed document.
///
/// The artifact shape follows `config.mode`.
pub fn sanitize_value(root: &Value, source_file: &str, config: &SanitizeConfig) -> SanitizedArtifact {
    let extraction = walk::extract(root, config.strategy, config.min_string_len);
    debug!(
        "{}: {} texts, {} tables, {} groups",
        source_file,
        extraction.texts.len(),
        extraction.tables.len(),
        extraction.groups.len()
    );

    match config.mode {
        PipelineMode::Structural => SanitizedArtifact::Structural(StructuralArtifact {
            source_file: source_file.to_string(),
            texts: extraction.texts,
            tables: extraction.tables,
            groups: extraction.groups,
        }),
        PipelineMode::Classification => {
            let blocks = extraction.flatten();
            SanitizedArtifact::Classified(classify_blocks(&blocks, source_file, config))
        }
    }
}

/// Normalise raw text blocks, then classify them and pick transaction
/// candidates.
///
/// Blocks that normalise to nothing are dropped before scoring. Also usable
/// on lines from the PDF text adapter.
pub fn classify_blocks<S: AsRef<str>>(
    blocks: &[S],
    source_file: &str,
    config: &SanitizeConfig,
) -> ClassifiedArtifact {
    let normalized: Vec<String> = blocks
        .iter()
        .map(|b| normalize(b.as_ref()))
        .filter(|b| !b.is_empty())
        .collect();

    let classification = Classifier::new(config.signals.clone()).classify(&normalized);
    let candidates =
        CandidateExtractor::new(config.patterns.clone(), config.candidate_limit).extract(&normalized);

    ClassifiedArtifact {
        source_file: source_file.to_string(),
        document_type: classification.document_type,
        confidence: classification.confidence,
        summary_blocks: normalized.iter().take(config.summary_limit).cloned().collect(),
        transaction_candidates: candidates,
    }
}

/// Decode `bytes` as JSON and sanitise the result.
///
/// Nesting depth is not limited: decoding grows the stack as needed and the
/// walk is iterative.
pub fn sanitize_bytes(
    bytes: &[u8],
    source_file: &str,
    config: &SanitizeConfig,
) -> Result<SanitizedArtifact, SanitizeError> {
    let root = decode_json(bytes).map_err(|e| SanitizeError::MalformedInput {
        name: source_file.to_string(),
        detail: e.to_string(),
    })?;
    let artifact = sanitize_value(&root, source_file, config);
    walk::dispose(root);
    Ok(artifact)
}

/// Read and sanitise one file. Nothing is written.
pub fn sanitize_file(
    path: impl AsRef<Path>,
    config: &SanitizeConfig,
) -> Result<SanitizedArtifact, SanitizeError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| SanitizeError::InputReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    sanitize_bytes(&bytes, &file_name(path), config)
}

/// Sanitise in-memory inputs and persist each artifact to `store`.
///
/// Returns one outcome per processed input, in input order. Inputs after a
/// cancellation (see [`BatchProgressCallback::should_continue`]) produce no
/// outcome.
pub fn sanitize_batch<I>(inputs: I, store: &dyn ArtifactStore, config: &SanitizeConfig) -> Vec<FileOutcome>
where
    I: IntoIterator<Item = (String, Vec<u8>)>,
{
    let inputs: Vec<(String, Result<Vec<u8>, SanitizeError>)> =
        inputs.into_iter().map(|(name, bytes)| (name, Ok(bytes))).collect();
    let total = inputs.len();
    run_batch(inputs, total, store, config, None)
}

/// Result of [`sanitize_dir`].
#[derive(Debug)]
pub struct DirRun {
    pub outcomes: Vec<FileOutcome>,
    pub report: BatchReport,
}

/// Sanitise every `*.json` file in `config.input_dir` into
/// `config.output_dir`.
///
/// When a ledger is given, files it already lists are skipped and every
/// successful file is recorded as soon as its artifact is written.
pub fn sanitize_dir(
    config: &SanitizeConfig,
    mut ledger: Option<&mut ProcessedLedger>,
) -> Result<DirRun, SanitizeError> {
    let start = Instant::now();
    let paths = list_inputs(&config.input_dir, "json")?;
    let found = paths.len();

    let pending: Vec<PathBuf> = match ledger.as_deref() {
        Some(l) => paths
            .into_iter()
            .filter(|p| !l.is_processed(&file_name(p)))
            .collect(),
        None => paths,
    };
    let skipped = found - pending.len();
    if pending.is_empty() {
        info!("No new files to process in {}", config.input_dir.display());
    } else {
        info!(
            "Sanitising {} files from {} ({} already processed)",
            pending.len(),
            config.input_dir.display(),
            skipped
        );
    }

    let total = pending.len();
    // Files are read lazily so only one document is in memory at a time.
    let inputs = pending.into_iter().map(|path| {
        let bytes = std::fs::read(&path).map_err(|e| SanitizeError::InputReadFailed {
            path: path.clone(),
            source: e,
        });
        (file_name(&path), bytes)
    });

    let store = DirStore::new(&config.output_dir);
    let outcomes = run_batch(inputs, total, &store, config, ledger.as_deref_mut());
    let report = BatchReport::from_outcomes(
        &outcomes,
        total,
        skipped,
        start.elapsed().as_millis() as u64,
    );

    info!(
        "Batch complete: {}/{} succeeded, {} failed, {}ms",
        report.succeeded, report.total, report.failed, report.duration_ms
    );

    Ok(DirRun { outcomes, report })
}

/// Files in `dir` with the given extension, sorted by name.
pub fn list_inputs(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, SanitizeError> {
    let entries = std::fs::read_dir(dir).map_err(|e| SanitizeError::InputDirUnreadable {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(e) => Some(e.path()),
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .collect();
    paths.sort();
    Ok(paths)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn decode_json(bytes: &[u8]) -> Result<Value, serde_json::Error> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let root = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(root)
}

fn run_batch<I>(
    inputs: I,
    total: usize,
    store: &dyn ArtifactStore,
    config: &SanitizeConfig,
    mut ledger: Option<&mut ProcessedLedger>,
) -> Vec<FileOutcome>
where
    I: IntoIterator<Item = (String, Result<Vec<u8>, SanitizeError>)>,
{
    let noop = NoopProgressCallback;
    let cb: &dyn BatchProgressCallback = match config.progress_callback {
        Some(ref cb) => cb.as_ref(),
        None => &noop,
    };

    cb.on_batch_start(total);
    let mut outcomes = Vec::with_capacity(total);

    for (index, (name, bytes)) in inputs.into_iter().enumerate() {
        if !cb.should_continue() {
            warn!("Batch cancelled after {} of {} files", index, total);
            break;
        }
        cb.on_file_start(index, total, &name);
        info!("Processing file: {}", name);

        let outcome = process_one(name, bytes, store, config);
        match &outcome.result {
            Ok(_) => {
                if let Some(l) = ledger.as_deref_mut() {
                    l.record_or_warn(&outcome.source_file);
                }
                cb.on_file_complete(index, total, &outcome.source_file);
            }
            Err(e) => {
                warn!("Failed to process file {}: {}", outcome.source_file, e);
                cb.on_file_error(index, total, &outcome.source_file, &e.to_string());
            }
        }
        outcomes.push(outcome);
    }

    let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
    cb.on_batch_complete(total, succeeded);
    outcomes
}

fn process_one(
    name: String,
    bytes: Result<Vec<u8>, SanitizeError>,
    store: &dyn ArtifactStore,
    config: &SanitizeConfig,
) -> FileOutcome {
    let written = bytes
        .and_then(|b| sanitize_bytes(&b, &name, config))
        .and_then(|artifact| {
            let body = artifact.to_json_pretty()?;
            let key = config.naming.key_for(&name);
            let path = store.put(&key, &body)?;
            Ok((artifact, path))
        });

    match written {
        Ok((artifact, path)) => FileOutcome {
            source_file: name,
            output_path: Some(path),
            result: Ok(artifact),
        },
        Err(e) => FileOutcome {
            source_file: name,
            output_path: None,
            result: Err(e),
        },
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
