//! Pipeline stages for Docling JSON sanitisation.
//!
//! Each submodule implements exactly one transformation step and holds no
//! state between documents.
//!
//! ## Data Flow
//!
//! ```text
//!                    ┌──▶ structural artifact (texts, tables, groups)
//! raw JSON ──▶ walk ─┤
//!                    └──▶ normalize ──▶ classify ──▶ classified artifact
//!                                   └─▶ candidates ─┘
//! ```
//!
//! 1. [`walk`]       — flatten the parser tree into text, table and group blocks
//! 2. [`normalize`]  — lower-case ASCII canonical form of each block
//! 3. [`classify`]   — keyword scoring into a [`classify::DocumentType`]
//! 4. [`candidates`] — lines carrying both a date and an amount

pub mod candidates;
pub mod classify;
pub mod normalize;
pub mod walk;
