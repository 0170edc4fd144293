//! Document-type classification by keyword scoring.
//!
//! Each category owns a keyword list. Every keyword that occurs as a
//! substring of a normalised block adds one point to its category; a block
//! may score for several categories, and several times for one category.
//! The best score wins and the confidence is its share of all points.
//!
//! ## Tie-break
//!
//! Equal scores resolve to the category declared first in the
//! [`DocumentSignals`] table. For [`DocumentSignals::default`] the order is
//! `CREDIT_CARD_INVOICE`, `BANK_STATEMENT`, `PAYMENT_RECEIPT`.

use crate::error::SanitizeError;
use crate::pipeline::normalize::normalize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Financial document categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    CreditCardInvoice,
    BankStatement,
    PaymentReceipt,
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::CreditCardInvoice => "CREDIT_CARD_INVOICE",
            DocumentType::BankStatement => "BANK_STATEMENT",
            DocumentType::PaymentReceipt => "PAYMENT_RECEIPT",
            DocumentType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`Classifier::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub document_type: DocumentType,
    /// Winning score divided by the sum of all scores, rounded to 2 decimals.
    pub confidence: f64,
}

impl ClassificationResult {
    pub fn unknown() -> Self {
        Self {
            document_type: DocumentType::Unknown,
            confidence: 0.0,
        }
    }
}

/// One row of the signal table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySignals {
    pub document_type: DocumentType,
    pub keywords: Vec<String>,
}

/// Ordered keyword table. Declaration order is the tie-break priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentSignals {
    categories: Vec<CategorySignals>,
}

impl DocumentSignals {
    /// Build a table from `(type, keywords)` pairs, in priority order.
    ///
    /// Fails if `UNKNOWN` is listed or a category appears twice.
    pub fn new<I, K, S>(categories: I) -> Result<Self, SanitizeError>
    where
        I: IntoIterator<Item = (DocumentType, K)>,
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let categories = categories
            .into_iter()
            .map(|(document_type, keywords)| CategorySignals {
                document_type,
                keywords: keywords.into_iter().map(Into::into).collect(),
            })
            .collect();
        Self { categories }.validated()
    }

    /// Load a table from a JSON array of `{document_type, keywords}` objects.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SanitizeError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SanitizeError::InvalidConfig(format!("cannot read signals file {path:?}: {e}"))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, SanitizeError> {
        let table: Self = serde_json::from_str(raw)
            .map_err(|e| SanitizeError::InvalidConfig(format!("invalid signals table: {e}")))?;
        table.validated()
    }

    pub fn categories(&self) -> &[CategorySignals] {
        &self.categories
    }

    /// Normalise every keyword, then check the table. Keywords are matched
    /// against normalised blocks, so one with accents or capitals would never
    /// hit, and an empty one would hit every block.
    fn validated(mut self) -> Result<Self, SanitizeError> {
        for cat in &mut self.categories {
            for kw in &mut cat.keywords {
                let normalized = normalize(kw);
                if normalized.is_empty() {
                    return Err(SanitizeError::InvalidConfig(format!(
                        "category {} has an empty keyword ({:?})",
                        cat.document_type, kw
                    )));
                }
                *kw = normalized;
            }
        }
        for (i, cat) in self.categories.iter().enumerate() {
            if cat.document_type == DocumentType::Unknown {
                return Err(SanitizeError::InvalidConfig(
                    "UNKNOWN cannot carry keywords".into(),
                ));
            }
            if self.categories[..i]
                .iter()
                .any(|c| c.document_type == cat.document_type)
            {
                return Err(SanitizeError::InvalidConfig(format!(
                    "category {} declared twice",
                    cat.document_type
                )));
            }
        }
        Ok(self)
    }
}

impl Default for DocumentSignals {
    /// Portuguese (Brazilian) financial vocabulary, already normalised.
    fn default() -> Self {
        let table = [
            (
                DocumentType::CreditCardInvoice,
                &[
                    "fatura",
                    "cartao de credito",
                    "limite disponivel",
                    "pagamento minimo",
                    "fechamento",
                    "vencimento",
                    "total da fatura",
                    "parcelamento",
                ][..],
            ),
            (
                DocumentType::BankStatement,
                &[
                    "extrato",
                    "saldo anterior",
                    "saldo atual",
                    "saldo final",
                    "movimentacao",
                    "lancamentos",
                    "debito",
                    "credito",
                ][..],
            ),
            (
                DocumentType::PaymentReceipt,
                &[
                    "comprovante",
                    "pix realizado",
                    "pagamento efetuado",
                    "valor pago",
                    "nsu",
                    "autenticacao",
                    "codigo de barras",
                ][..],
            ),
        ];
        Self {
            categories: table
                .into_iter()
                .map(|(document_type, keywords)| CategorySignals {
                    document_type,
                    keywords: keywords.iter().map(|k| k.to_string()).collect(),
                })
                .collect(),
        }
    }
}

/// Keyword-scoring classifier over normalised blocks.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    signals: DocumentSignals,
}

impl Classifier {
    pub fn new(signals: DocumentSignals) -> Self {
        Self { signals }
    }

    /// Per-category scores, in table order.
    pub fn scores<S: AsRef<str>>(&self, blocks: &[S]) -> Vec<(DocumentType, usize)> {
        self.signals
            .categories
            .iter()
            .map(|cat| {
                let score = blocks
                    .iter()
                    .map(|block| {
                        let block: &str = block.as_ref();
                        cat.keywords
                            .iter()
                            .filter(|kw| block.contains(kw.as_str()))
                            .count()
                    })
                    .sum();
                (cat.document_type, score)
            })
            .collect()
    }

    pub fn classify<S: AsRef<str>>(&self, blocks: &[S]) -> ClassificationResult {
        let scores = self.scores(blocks);
        let total: usize = scores.iter().map(|(_, s)| s).sum();
        if total == 0 {
            return ClassificationResult::unknown();
        }

        // First strictly greater score wins, so earlier categories keep ties.
        let (best, best_score) = scores
            .iter()
            .copied()
            .fold((DocumentType::Unknown, 0usize), |acc, cur| {
                if cur.1 > acc.1 {
                    cur
                } else {
                    acc
                }
            });

        debug!(?scores, winner = %best, "classified document");

        ClassificationResult {
            document_type: best,
            confidence: round2(best_score as f64 / total as f64),
        }
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
