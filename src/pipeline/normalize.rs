//! Text normalisation: canonical ASCII form for keyword and pattern matching.
//!
//! Financial documents mix accents ("cartão de crédito"), currency symbols,
//! bullets and box-drawing characters. Keyword tables and regexes are written
//! against a single canonical form, so every block passes through
//! [`normalize`] before it is scored or filtered.
//!
//! ## Rule Order
//!
//! 1. Lower-case
//! 2. NFKD-decompose and drop everything non-ASCII (this removes the combining
//!    marks, so `ã` becomes `a`)
//! 3. Replace anything other than ASCII alphanumerics, whitespace, `/`, `-`,
//!    `.` and `,` with a space
//! 4. Collapse whitespace runs to one space and trim
//!
//! Compatibility decomposition can surface upper-case ASCII (`ℌ` → `H`), so
//! step 3 folds case again. That keeps the function idempotent.

use unicode_normalization::UnicodeNormalization;

/// Normalise `text` into lower-case ASCII suitable for substring matching.
///
/// Pure and total: every input maps to some (possibly empty) string, and
/// `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();

    let mut out = String::with_capacity(lowered.len());
    let mut pending_space = false;

    for c in lowered.nfkd().filter(char::is_ascii) {
        let kept = c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '.' | ',');
        if kept {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c.to_ascii_lowercase());
        } else {
            // Whitespace and every other punctuation both collapse to a
            // single separator.
            pending_space = true;
        }
    }

    out
}

/// Normalise raw bytes, degrading to an empty string when they are not UTF-8.
pub fn normalize_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => normalize(text),
        Err(_) => String::new(),
    }
}
