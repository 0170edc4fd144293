//! CLI binary for docling-sanitizer.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `SanitizeConfig` and prints a batch summary.

use anyhow::{Context, Result};
use clap::Parser;
use docling_sanitizer::{
    sanitize_dir, BatchProgressCallback, BatchReport, DocumentSignals, ExtractionStrategy,
    OutputNaming, PipelineMode, ProcessedLedger, ProgressCallback, SanitizeConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-file wall-clock start times, keyed by batch index.
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Sanitising");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Sanitising {total} files…"))
        ));
    }

    fn on_file_start(&self, index: usize, _total: usize, name: &str) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, Instant::now());
        }
        self.bar.set_message(name.to_string());
    }

    fn on_file_complete(&self, index: usize, total: usize, name: &str) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} {:>4}/{:<4}  {}  {}",
            green("✓"),
            index + 1,
            total,
            name,
            dim(&format!("{secs:.2}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let secs = self.elapsed_secs(index);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} {:>4}/{:<4}  {}  {}  {}",
            red("✗"),
            index + 1,
            total,
            name,
            red(&msg),
            dim(&format!("{secs:.2}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} files sanitised successfully",
                green("✔"),
                bold(&succeeded.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files sanitised  ({} failed)",
                if succeeded == 0 { red("✘") } else { cyan("⚠") },
                bold(&succeeded.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Structural extraction of every *.json in data/processed
  docsanitize data/processed -o data/sanitized

  # Classify documents and keep a ledger between scheduled runs
  docsanitize data/processed -o data/sanitized --mode classify \
      --ledger data/state/processed_files.json

  # Inputs that do not follow the Docling schema
  docsanitize dumps/ -o out/ --strategy all-strings

  # Raw text from PDFs (one <uuid>.json per document)
  docsanitize data/raw -o data/processed --mode pdf-text

  # Custom keyword table, JSON report on stdout
  docsanitize data/processed -o out/ --mode classify --signals keywords.json --json

KEYWORD TABLE FORMAT (--signals):
  [
    {"document_type": "CREDIT_CARD_INVOICE", "keywords": ["fatura", "cartao"]},
    {"document_type": "BANK_STATEMENT",      "keywords": ["extrato", "saldo"]}
  ]
  Ties between categories go to the one listed first.

ENVIRONMENT VARIABLES:
  DOCSANITIZE_*     Every flag can be set through its DOCSANITIZE_ variable
  RUST_LOG          Override log filtering (e.g. docling_sanitizer=debug)
  PDFIUM_LIB_PATH   Path to libpdfium for --mode pdf-text (else system library)
"#;

/// Sanitise Docling JSON into compact text, table and classification artifacts.
#[derive(Parser, Debug)]
#[command(
    name = "docsanitize",
    version,
    about = "Sanitise Docling JSON into compact text, table and classification artifacts",
    long_about = "Walk Docling parser output, keep text blocks, table rows and groups, \
and optionally classify each document as a credit card invoice, bank statement or \
payment receipt with a list of transaction-looking lines.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory of input files (*.json, or *.pdf with --mode pdf-text).
    #[arg(env = "DOCSANITIZE_INPUT")]
    input: PathBuf,

    /// Directory artifacts are written to.
    #[arg(short, long, env = "DOCSANITIZE_OUTPUT", default_value = "data/sanitized")]
    output: PathBuf,

    /// What to produce.
    #[arg(long, env = "DOCSANITIZE_MODE", value_enum, default_value = "structural")]
    mode: ModeArg,

    /// How text is pulled out of each document.
    #[arg(long, env = "DOCSANITIZE_STRATEGY", value_enum, default_value = "structured")]
    strategy: StrategyArg,

    /// Output file naming: same as the source, or a fresh UUID.
    #[arg(long, env = "DOCSANITIZE_NAMING", value_enum, default_value = "source")]
    naming: NamingArg,

    /// JSON keyword table replacing the built-in one.
    #[arg(long, env = "DOCSANITIZE_SIGNALS")]
    signals: Option<PathBuf>,

    /// Ledger of processed files; listed inputs are skipped.
    #[arg(long, env = "DOCSANITIZE_LEDGER")]
    ledger: Option<PathBuf>,

    /// Number of normalised blocks kept as the summary.
    #[arg(long, env = "DOCSANITIZE_SUMMARY_LIMIT", default_value_t = 20)]
    summary_limit: usize,

    /// Maximum transaction candidates per document.
    #[arg(long, env = "DOCSANITIZE_CANDIDATE_LIMIT", default_value_t = 500)]
    candidate_limit: usize,

    /// Print the batch report as JSON on stdout.
    #[arg(long, env = "DOCSANITIZE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCSANITIZE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCSANITIZE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCSANITIZE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModeArg {
    Structural,
    Classify,
    PdfText,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    Structured,
    AllStrings,
}

impl From<StrategyArg> for ExtractionStrategy {
    fn from(v: StrategyArg) -> Self {
        match v {
            StrategyArg::Structured => ExtractionStrategy::Structured,
            StrategyArg::AllStrings => ExtractionStrategy::AllStrings,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum NamingArg {
    Source,
    Uuid,
}

impl From<NamingArg> for OutputNaming {
    fn from(v: NamingArg) -> Self {
        match v {
            NamingArg::Source => OutputNaming::SourceName,
            NamingArg::Uuid => OutputNaming::Generated,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar already reports per-file results, so library INFO
    // logs are muted while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let mut ledger = cli.ledger.as_ref().map(ProcessedLedger::load);

    // ── Run batch ────────────────────────────────────────────────────────
    let report = if cli.mode == ModeArg::PdfText {
        run_pdf_text(&config, ledger.as_mut()).await?
    } else {
        // Sanitising is synchronous file I/O; keep it off the async workers.
        tokio::task::block_in_place(|| sanitize_dir(&config, ledger.as_mut()))
            .context("Sanitisation failed")?
            .report
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&report, &cli.output, show_progress);
    }

    Ok(())
}

#[cfg(feature = "pdf")]
async fn run_pdf_text(
    config: &SanitizeConfig,
    ledger: Option<&mut ProcessedLedger>,
) -> Result<BatchReport> {
    docling_sanitizer::pdf_text::extract_pdf_dir(config, ledger)
        .await
        .context("PDF text extraction failed")
}

#[cfg(not(feature = "pdf"))]
async fn run_pdf_text(
    _config: &SanitizeConfig,
    _ledger: Option<&mut ProcessedLedger>,
) -> Result<BatchReport> {
    anyhow::bail!("--mode pdf-text requires the `pdf` feature")
}

/// Map CLI args to `SanitizeConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SanitizeConfig> {
    let mode = match cli.mode {
        ModeArg::Classify => PipelineMode::Classification,
        ModeArg::Structural | ModeArg::PdfText => PipelineMode::Structural,
    };

    let mut builder = SanitizeConfig::builder()
        .mode(mode)
        .strategy(cli.strategy.into())
        .naming(cli.naming.into())
        .input_dir(&cli.input)
        .output_dir(&cli.output)
        .summary_limit(cli.summary_limit)
        .candidate_limit(cli.candidate_limit);

    if let Some(ref path) = cli.signals {
        let signals = DocumentSignals::from_json_file(path)
            .with_context(|| format!("Failed to load keyword table from {:?}", path))?;
        builder = builder.signals(signals);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(report: &BatchReport, output: &std::path::Path, show_progress: bool) {
    // The progress callback already printed the green/red tick line.
    if !show_progress {
        eprintln!(
            "Sanitised {}/{} files in {}ms",
            report.succeeded, report.total, report.duration_ms
        );
        if report.failed > 0 {
            eprintln!("  {} files failed", report.failed);
        }
    }
    if report.skipped > 0 {
        eprintln!(
            "   {}",
            dim(&format!("{} files skipped (already in ledger)", report.skipped))
        );
    }
    if report.cancelled > 0 {
        eprintln!("   {}", red(&format!("{} files not started (cancelled)", report.cancelled)));
    }
    if report.succeeded > 0 {
        eprintln!("   →  {}", bold(&output.display().to_string()));
    }
}
