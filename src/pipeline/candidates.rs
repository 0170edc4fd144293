//! Transaction candidate lines: blocks carrying both a date and an amount.
//!
//! Statements and invoices list one transaction per line, usually as
//! `DD/MM description 1.234,56`. A line that contains both a date and a
//! Brazilian-locale amount is kept as a candidate for downstream extraction.
//! The two patterns are matched independently; order and adjacency do not
//! matter.

use crate::error::SanitizeError;
use once_cell::sync::Lazy;
use regex::Regex;

/// `DD/MM/YYYY` or `DD/MM`.
pub const DEFAULT_DATE_PATTERN: &str = r"\d{2}/\d{2}/\d{4}|\d{2}/\d{2}";

/// Optional `r`/`$`, digit groups separated by `.`, comma, two decimals.
pub const DEFAULT_MONEY_PATTERN: &str = r"r?\$?\s?\d{1,3}(\.\d{3})*,\d{2}";

/// Hard cap on candidates per document.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 500;

static RE_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(DEFAULT_DATE_PATTERN).unwrap());
static RE_MONEY: Lazy<Regex> = Lazy::new(|| Regex::new(DEFAULT_MONEY_PATTERN).unwrap());

/// The pair of patterns a candidate must satisfy.
#[derive(Debug, Clone)]
pub struct TransactionPatterns {
    pub date: Regex,
    pub money: Regex,
}

impl TransactionPatterns {
    /// Compile custom patterns.
    pub fn new(date: &str, money: &str) -> Result<Self, SanitizeError> {
        let compile = |name: &str, src: &str| {
            Regex::new(src)
                .map_err(|e| SanitizeError::InvalidConfig(format!("invalid {name} pattern: {e}")))
        };
        Ok(Self {
            date: compile("date", date)?,
            money: compile("money", money)?,
        })
    }

    pub fn matches(&self, block: &str) -> bool {
        self.date.is_match(block) && self.money.is_match(block)
    }
}

impl Default for TransactionPatterns {
    fn default() -> Self {
        Self {
            date: RE_DATE.clone(),
            money: RE_MONEY.clone(),
        }
    }
}

/// Filters normalised blocks down to probable transaction lines.
#[derive(Debug, Clone)]
pub struct CandidateExtractor {
    patterns: TransactionPatterns,
    limit: usize,
}

impl Default for CandidateExtractor {
    fn default() -> Self {
        Self::new(TransactionPatterns::default(), DEFAULT_CANDIDATE_LIMIT)
    }
}

impl CandidateExtractor {
    pub fn new(patterns: TransactionPatterns, limit: usize) -> Self {
        Self { patterns, limit }
    }

    pub fn patterns(&self) -> &TransactionPatterns {
        &self.patterns
    }

    /// The first `limit` qualifying blocks, in input order.
    pub fn extract<S: AsRef<str>>(&self, blocks: &[S]) -> Vec<String> {
        blocks
            .iter()
            .map(AsRef::<str>::as_ref)
            .filter(|b| self.patterns.matches(b))
            .take(self.limit)
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::normalize;

    #[test]
    fn test_payment_line_qualifies() {
        let line = normalize("Pagamento em 12/05/2024 valor R$ 1.234,56");
        assert!(TransactionPatterns::default().matches(&line));
        let out = CandidateExtractor::default().extract(&[line.clone()]);
        assert_eq!(out, vec![line]);
    }

    #[test]
    fn test_short_date_and_plain_amount() {
        let p = TransactionPatterns::default();
        assert!(p.matches("03/02 mercado livre 89,90"));
        assert!(p.matches("150,00 em 03/02"));
    }

    #[test]
    fn test_requires_both_patterns() {
        let p = TransactionPatterns::default();
        assert!(!p.matches("limite disponivel r 500,00"));
        assert!(!p.matches("vencimento 10/06/2024"));
        assert!(!p.matches("total 1.234"));
        assert!(!p.matches("1/2/2024 12,5"));
    }

    #[test]
    fn test_empty_input() {
        assert!(CandidateExtractor::default().extract::<String>(&[]).is_empty());
    }

    #[test]
    fn test_order_and_cap() {
        let blocks: Vec<String> = (0..900)
            .map(|i| {
                if i % 3 == 0 {
                    format!("saldo {i}")
                } else {
                    format!("{:02}/01 compra {i} 10,00", i % 28 + 1)
                }
            })
            .collect();
        let out = CandidateExtractor::default().extract(&blocks);
        assert_eq!(out.len(), DEFAULT_CANDIDATE_LIMIT);
        assert_eq!(out[0], "02/01 compra 1 10,00");
        let p = TransactionPatterns::default();
        assert!(out.iter().all(|b| p.matches(b)));
        // Input order survives the filter.
        let positions: Vec<usize> = out
            .iter()
            .map(|c| blocks.iter().position(|b| b == c).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_custom_limit_and_patterns() {
        let p = TransactionPatterns::new(r"\d{4}-\d{2}-\d{2}", r"\d+\.\d{2}").unwrap();
        let ex = CandidateExtractor::new(p, 1);
        let out = ex.extract(&["2024-01-02 coffee 3.50", "2024-01-03 tea 2.00"]);
        assert_eq!(out, vec!["2024-01-02 coffee 3.50"]);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(TransactionPatterns::new("(", r"\d").is_err());
    }
}
