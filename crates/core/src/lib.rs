//! Chart configuration validator core.
//!
//! Scans a configuration document line by line, checks block keywords,
//! section nesting and setting values, commits sections into a tree, and
//! finally applies cross-setting rules over that tree. The main entry points
//! are [`validate`] and [`Validator`].

#![warn(missing_docs)]

/// Line-level recognizers and re-exported shared types.
pub mod grammar;
/// One declared setting.
pub mod setting;
/// Document validation: section stack, config tree, rules.
pub mod validate;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Diagnostics (re-exported from the diagnostics crate)
pub use grammar::diag::{Diagnostic, LineIndex, Position, Range, Severity, codes};

// Catalog
pub use grammar::tables::Catalog;

// Scanner
pub use grammar::text_range::{Keyword, TextRange, scan_keyword};

// Settings
pub use setting::Setting;

// Validator
pub use validate::{
    ConfigTree, Section, SectionId, SectionStack, ValidationResult, Validator, validate,
};

/// Blank `/* */` and `#` comments while keeping every offset.
pub use chartcfg_comments::blank_comments as delete_comments;
