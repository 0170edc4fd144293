//! Directory-level integration tests for docling-sanitizer.
//!
//! Every test builds its own scratch input/output directories with
//! `tempfile`, runs [`sanitize_dir`] over them and inspects what landed on
//! disk.

use docling_sanitizer::{
    sanitize_dir, BatchProgressCallback, DocumentType, ExtractionStrategy, OutputNaming,
    PipelineMode, ProcessedLedger, SanitizeConfig, SanitizeError,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

struct Scratch {
    input: TempDir,
    output: TempDir,
}

impl Scratch {
    fn new() -> Self {
        Self {
            input: tempfile::tempdir().unwrap(),
            output: tempfile::tempdir().unwrap(),
        }
    }

    fn write(&self, name: &str, body: &str) {
        std::fs::write(self.input.path().join(name), body).unwrap();
    }

    fn write_json(&self, name: &str, value: &Value) {
        self.write(name, &serde_json::to_string(value).unwrap());
    }

    fn read_output(&self, name: &str) -> String {
        std::fs::read_to_string(self.output.path().join(name)).unwrap()
    }

    fn output_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.output.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn config(&self, mode: PipelineMode) -> SanitizeConfig {
        SanitizeConfig::builder()
            .mode(mode)
            .input_dir(self.input.path())
            .output_dir(self.output.path())
            .build()
            .unwrap()
    }
}

fn invoice() -> Value {
    json!({
        "texts": [
            {"label": "title", "text": "Fatura do Cartão de Crédito", "prov": [{"page_no": 1}]},
            {"label": "text", "text": "Vencimento 10/06/2024", "prov": [{"page_no": 1}]},
            {"label": "text", "text": "Pagamento mínimo R$ 150,00", "prov": [{"page_no": 1}]}
        ],
        "tables": [{
            "prov": [{"page_no": 2}],
            "rows": [
                {"cells": [{"text": "12/05"}, {"text": "Padaria São João"}, {"text": "R$ 23,90"}]},
                {"cells": [{"text": ""}, {"text": "  "}]}
            ]
        }]
    })
}

// ── Structural mode ──────────────────────────────────────────────────────────

#[test]
fn test_structural_artifacts_written_per_input() {
    let s = Scratch::new();
    s.write_json("fatura.json", &invoice());
    s.write_json("vazio.json", &json!({}));
    s.write("notas.txt", "not an input");

    let run = sanitize_dir(&s.config(PipelineMode::Structural), None).unwrap();
    assert_eq!(run.report.total, 2);
    assert_eq!(run.report.succeeded, 2);
    assert_eq!(s.output_names(), vec!["fatura.json", "vazio.json"]);

    let raw = s.read_output("fatura.json");
    // Pretty-printed with two spaces, non-ASCII kept verbatim.
    assert!(raw.starts_with("{\n  \"source_file\": \"fatura.json\""));
    assert!(raw.contains("Cartão de Crédito"));

    let v: Value = serde_json::from_str(&raw).unwrap();
    let texts = v["texts"].as_array().unwrap();
    assert_eq!(texts[0]["text"], "Fatura do Cartão de Crédito");
    assert_eq!(texts[0]["label"], "title");
    assert_eq!(texts[0]["page"], 1);
    // The blank row never becomes a table.
    let tables = v["tables"].as_array().unwrap();
    assert!(tables.iter().all(|t| !t["rows"].as_array().unwrap().is_empty()));
    assert_eq!(tables[0]["rows"][0], json!(["12/05", "Padaria São João", "R$ 23,90"]));

    let empty: Value = serde_json::from_str(&s.read_output("vazio.json")).unwrap();
    assert_eq!(empty["texts"], json!([]));
    assert_eq!(empty["tables"], json!([]));
    assert_eq!(empty["groups"], json!([]));
}

#[test]
fn test_all_strings_strategy() {
    let s = Scratch::new();
    s.write_json(
        "solto.json",
        &json!({"meta": {"a": "ok", "b": "  Extrato mensal  "}, "list": ["Saldo final", 42]}),
    );
    let config = SanitizeConfig::builder()
        .strategy(ExtractionStrategy::AllStrings)
        .input_dir(s.input.path())
        .output_dir(s.output.path())
        .build()
        .unwrap();

    sanitize_dir(&config, None).unwrap();
    let v: Value = serde_json::from_str(&s.read_output("solto.json")).unwrap();
    let texts: Vec<&str> = v["texts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["Extrato mensal", "Saldo final"]);
}

// ── Classification mode ──────────────────────────────────────────────────────

#[test]
fn test_classification_artifact() {
    let s = Scratch::new();
    s.write_json("fatura.json", &invoice());

    let run = sanitize_dir(&s.config(PipelineMode::Classification), None).unwrap();
    assert_eq!(run.report.files[0].document_type, Some(DocumentType::CreditCardInvoice));

    let v: Value = serde_json::from_str(&s.read_output("fatura.json")).unwrap();
    assert_eq!(v["document_type"], "CREDIT_CARD_INVOICE");
    let confidence = v["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));
    assert_eq!(v["summary_blocks"][0], "fatura do cartao de credito");
    let candidates = v["transaction_candidates"].as_array().unwrap();
    assert!(candidates.contains(&json!("12/05 padaria sao joao r 23,90")));
    assert!(v.get("texts").is_none());
}

// ── Failure isolation ────────────────────────────────────────────────────────

#[test]
fn test_malformed_file_is_isolated() {
    let s = Scratch::new();
    s.write_json("a.json", &json!({"text": "Recibo de pagamento"}));
    s.write("b.json", "{\"texts\": [");
    s.write_json("c.json", &json!({"text": "Comprovante"}));

    let run = sanitize_dir(&s.config(PipelineMode::Structural), None).unwrap();
    assert_eq!(run.report.succeeded, 2);
    assert_eq!(run.report.failed, 1);
    assert!(matches!(
        run.outcomes[1].result,
        Err(SanitizeError::MalformedInput { .. })
    ));
    let err = run.report.files[1].error.as_ref().unwrap();
    assert_eq!(err.kind, "malformed_input");
    assert_eq!(s.output_names(), vec!["a.json", "c.json"]);
}

#[test]
fn test_missing_input_dir_is_fatal() {
    let s = Scratch::new();
    let config = SanitizeConfig::builder()
        .input_dir(s.input.path().join("nope"))
        .output_dir(s.output.path())
        .build()
        .unwrap();
    assert!(matches!(
        sanitize_dir(&config, None),
        Err(SanitizeError::InputDirUnreadable { .. })
    ));
}

// ── Ledger ───────────────────────────────────────────────────────────────────

#[test]
fn test_ledger_skips_processed_files() {
    let s = Scratch::new();
    let state = tempfile::tempdir().unwrap();
    let ledger_path = state.path().join("processed_files.json");
    s.write_json("a.json", &json!({"text": "primeiro"}));
    s.write("b.json", "broken");

    let config = s.config(PipelineMode::Structural);
    let mut ledger = ProcessedLedger::load(&ledger_path);
    let first = sanitize_dir(&config, Some(&mut ledger)).unwrap();
    assert_eq!(first.report.succeeded, 1);
    assert!(ledger.is_processed("a.json"));
    // Failed files are retried on the next run.
    assert!(!ledger.is_processed("b.json"));

    s.write_json("c.json", &json!({"text": "terceiro"}));
    let mut ledger = ProcessedLedger::load(&ledger_path);
    let second = sanitize_dir(&config, Some(&mut ledger)).unwrap();
    assert_eq!(second.report.skipped, 1);
    let names: Vec<&str> = second
        .outcomes
        .iter()
        .map(|o| o.source_file.as_str())
        .collect();
    assert_eq!(names, vec!["b.json", "c.json"]);
    assert_eq!(read_ledger(&ledger_path), vec!["a.json", "c.json"]);
}

fn read_ledger(path: &Path) -> Vec<String> {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

// ── Naming and progress ──────────────────────────────────────────────────────

#[test]
fn test_generated_names() {
    let s = Scratch::new();
    s.write_json("a.json", &json!({"text": "um"}));
    s.write_json("b.json", &json!({"text": "dois"}));
    let config = SanitizeConfig::builder()
        .naming(OutputNaming::Generated)
        .input_dir(s.input.path())
        .output_dir(s.output.path())
        .build()
        .unwrap();

    let run = sanitize_dir(&config, None).unwrap();
    let names = s.output_names();
    assert_eq!(names.len(), 2);
    assert!(names.iter().all(|n| n.ends_with(".json") && n != "a.json" && n != "b.json"));
    // The artifact still names its source.
    let path = run.outcomes[0].output_path.as_ref().unwrap();
    let v: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(v["source_file"], "a.json");
}

#[derive(Default)]
struct StopAfterOne {
    completed: AtomicUsize,
    events: Mutex<Vec<String>>,
}

impl BatchProgressCallback for StopAfterOne {
    fn on_batch_start(&self, total: usize) {
        self.events.lock().unwrap().push(format!("start:{total}"));
    }

    fn on_file_complete(&self, _index: usize, _total: usize, name: &str) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(format!("done:{name}"));
    }

    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("end:{total}:{succeeded}"));
    }

    fn should_continue(&self) -> bool {
        self.completed.load(Ordering::SeqCst) < 1
    }
}

#[test]
fn test_cancellation_between_files() {
    let s = Scratch::new();
    for name in ["a.json", "b.json", "c.json"] {
        s.write_json(name, &json!({"text": name}));
    }
    let cb = Arc::new(StopAfterOne::default());
    let config = SanitizeConfig::builder()
        .input_dir(s.input.path())
        .output_dir(s.output.path())
        .progress_callback(cb.clone())
        .build()
        .unwrap();

    let run = sanitize_dir(&config, None).unwrap();
    assert_eq!(run.outcomes.len(), 1);
    assert_eq!(run.report.cancelled, 2);
    assert_eq!(
        cb.events.lock().unwrap().clone(),
        vec!["start:3", "done:a.json", "end:3:1"]
    );
}
