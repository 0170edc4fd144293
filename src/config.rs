//! Configuration types for document sanitisation.
//!
//! All pipeline behaviour is controlled through [`SanitizeConfig`], built via
//! [`SanitizeConfigBuilder`]. The mode is chosen here once per deployment,
//! never per call, and the keyword table and transaction patterns are
//! ordinary values so tests can substitute their own.

use crate::error::SanitizeError;
use crate::pipeline::candidates::{TransactionPatterns, DEFAULT_CANDIDATE_LIMIT};
use crate::pipeline::classify::DocumentSignals;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for a sanitisation run.
///
/// # Example
/// ```rust
/// use docling_sanitizer::{PipelineMode, SanitizeConfig};
///
/// let config = SanitizeConfig::builder()
///     .mode(PipelineMode::Classification)
///     .input_dir("data/processed")
///     .output_dir("data/sanitized")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SanitizeConfig {
    /// Structural extraction or classification. Default: [`PipelineMode::Structural`].
    pub mode: PipelineMode,

    /// How text is pulled out of the tree. Default: [`ExtractionStrategy::Structured`].
    pub strategy: ExtractionStrategy,

    /// How output keys are derived. Default: [`OutputNaming::SourceName`].
    pub naming: OutputNaming,

    /// Directory scanned for `*.json` inputs. Default: `data/processed`.
    pub input_dir: PathBuf,

    /// Directory artifacts are written to. Default: `data/sanitized`.
    pub output_dir: PathBuf,

    /// Number of normalised blocks kept in `summary_blocks`. Default: 20.
    pub summary_limit: usize,

    /// Maximum transaction candidates per document. Default: 500.
    pub candidate_limit: usize,

    /// [`ExtractionStrategy::AllStrings`] keeps strings whose trimmed length
    /// exceeds this many characters. Default: 3.
    pub min_string_len: usize,

    /// Keyword table for classification.
    pub signals: DocumentSignals,

    /// Date and money patterns for candidate extraction.
    pub patterns: TransactionPatterns,

    /// Optional per-file progress events for batch runs.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            mode: PipelineMode::default(),
            strategy: ExtractionStrategy::default(),
            naming: OutputNaming::default(),
            input_dir: PathBuf::from("data/processed"),
            output_dir: PathBuf::from("data/sanitized"),
            summary_limit: 20,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            min_string_len: 3,
            signals: DocumentSignals::default(),
            patterns: TransactionPatterns::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SanitizeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SanitizeConfig")
            .field("mode", &self.mode)
            .field("strategy", &self.strategy)
            .field("naming", &self.naming)
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("summary_limit", &self.summary_limit)
            .field("candidate_limit", &self.candidate_limit)
            .field("min_string_len", &self.min_string_len)
            .field("signals", &self.signals.categories().len())
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl SanitizeConfig {
    /// Create a new builder for `SanitizeConfig`.
    pub fn builder() -> SanitizeConfigBuilder {
        SanitizeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SanitizeConfig`].
#[derive(Debug)]
pub struct SanitizeConfigBuilder {
    config: SanitizeConfig,
}

impl SanitizeConfigBuilder {
    pub fn mode(mut self, mode: PipelineMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn strategy(mut self, strategy: ExtractionStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn naming(mut self, naming: OutputNaming) -> Self {
        self.config.naming = naming;
        self
    }

    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn summary_limit(mut self, n: usize) -> Self {
        self.config.summary_limit = n;
        self
    }

    pub fn candidate_limit(mut self, n: usize) -> Self {
        self.config.candidate_limit = n;
        self
    }

    pub fn min_string_len(mut self, n: usize) -> Self {
        self.config.min_string_len = n;
        self
    }

    pub fn signals(mut self, signals: DocumentSignals) -> Self {
        self.config.signals = signals;
        self
    }

    pub fn patterns(mut self, patterns: TransactionPatterns) -> Self {
        self.config.patterns = patterns;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SanitizeConfig, SanitizeError> {
        let c = &self.config;
        if c.summary_limit == 0 {
            return Err(SanitizeError::InvalidConfig(
                "summary limit must be ≥ 1".into(),
            ));
        }
        if c.candidate_limit == 0 {
            return Err(SanitizeError::InvalidConfig(
                "candidate limit must be ≥ 1".into(),
            ));
        }
        if c.input_dir == c.output_dir {
            return Err(SanitizeError::InvalidConfig(format!(
                "input and output directory are the same: {:?}",
                c.input_dir
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which artifact the pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    /// Texts, tables and groups. (default)
    #[default]
    Structural,
    /// Document type, confidence, summary blocks and transaction candidates.
    Classification,
}

/// How text is pulled out of the parser tree.
///
/// The structured walk understands Docling's node shapes. `AllStrings` is
/// the fallback for inputs that do not follow that schema: every string
/// longer than [`SanitizeConfig::min_string_len`] becomes a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    #[default]
    Structured,
    AllStrings,
}

/// How the destination key of an artifact is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputNaming {
    /// Same filename as the input. (default)
    #[default]
    SourceName,
    /// A fresh UUID v4 with a `.json` extension.
    Generated,
}

impl OutputNaming {
    /// Destination key for an input called `source_name`.
    pub fn key_for(&self, source_name: &str) -> String {
        match self {
            OutputNaming::SourceName => {
                let base = std::path::Path::new(source_name)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| source_name.to_string());
                if base.ends_with(".json") {
                    base
                } else {
                    format!("{base}.json")
                }
            }
            OutputNaming::Generated => format!("{}.json", uuid::Uuid::new_v4()),
        }
    }
}
