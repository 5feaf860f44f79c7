//! Diagnostics for chart configuration validation.
//!
//! Provides [`Diagnostic`], [`Severity`], [`Position`], [`Range`] and
//! [`LineIndex`]. Diagnostic codes are defined in the [`codes`] module and
//! described by [`explain`].

#![warn(missing_docs)]

/// Diagnostic ID constants generated from `spec/diagnostics.jsonc`.
pub mod codes;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

// ── Positions ────────────────────────────────────────────────────────────

/// A 0-based line/column position in a document.
///
/// `character` is a byte offset inside the line. Comment blanking keeps byte
/// offsets stable, so positions computed on the blanked text are valid in the
/// original document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 0-based line number.
    pub line: usize,
    /// 0-based byte column within the line.
    pub character: usize,
}

impl Position {
    /// Create a position.
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

/// A half-open `[start, end)` range in a document.
///
/// Ranges compare structurally; two diagnostics at equal ranges are
/// considered to be at the same location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Range {
    /// First position covered.
    pub start: Position,
    /// Position one past the last character covered.
    pub end: Position,
}

impl Range {
    /// Create a range.
    ///
    /// Panics if `end` is before `start`.
    pub fn new(start: Position, end: Position) -> Self {
        assert!(end >= start, "Range end {end:?} < start {start:?}");
        Self { start, end }
    }

    /// Range covering `[start_col, end_col)` on a single line.
    pub fn on_line(line: usize, start_col: usize, end_col: usize) -> Self {
        Self::new(Position::new(line, start_col), Position::new(line, end_col))
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start.line + 1, self.start.character + 1)
    }
}

// ── LineIndex ────────────────────────────────────────────────────────────

/// Maps between byte offsets and [`Position`]s of a source string.
///
/// Built in O(n); each lookup is O(log n). Renderers that work with byte
/// spans (the CLI uses ariadne) convert a [`Range`] through this index.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line. `line_starts[0]` is always 0.
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Build a `LineIndex` from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0usize];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Convert a byte offset to a [`Position`].
    ///
    /// Offsets past the end resolve to the last line.
    pub fn position(&self, offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next.saturating_sub(1),
        };
        Position::new(line, offset.saturating_sub(self.line_starts[line]))
    }

    /// Convert a [`Position`] to a byte offset, clamped to the source length.
    pub fn offset(&self, position: Position) -> usize {
        match self.line_starts.get(position.line) {
            Some(start) => (start + position.character).min(self.len),
            None => self.len,
        }
    }

    /// Byte offset of the start of the given 0-indexed line.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Total number of lines (at least 1, even for empty input).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Severity {
    /// The document is invalid.
    Error,
    /// The document works but likely not as intended.
    Warn,
    /// Stylistic note.
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warn => write!(f, "warn"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A diagnostic message produced by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Diagnostic code (e.g. `"CC1002"`).
    pub id: Cow<'static, str>,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Location the diagnostic is anchored at.
    pub range: Range,
    /// Machine-readable details keyed by the code's `contextKeys`.
    ///
    /// `BTreeMap` keeps serialized output deterministic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl Diagnostic {
    /// Create a diagnostic with the given fields.
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        severity: Severity,
        message: impl Into<String>,
        range: Range,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            range,
            context: None,
        }
    }

    /// Create a diagnostic using the default severity declared for `id`.
    ///
    /// Unknown ids fall back to [`Severity::Error`].
    pub fn for_code(id: &'static str, message: impl Into<String>, range: Range) -> Self {
        Self::new(
            id,
            severity_for_code(id).unwrap_or(Severity::Error),
            message,
            range,
        )
    }

    /// Shorthand for an `Error` diagnostic.
    pub fn error(id: impl Into<Cow<'static, str>>, message: impl Into<String>, range: Range) -> Self {
        Self::new(id, Severity::Error, message, range)
    }

    /// Shorthand for a `Warn` diagnostic.
    pub fn warn(id: impl Into<Cow<'static, str>>, message: impl Into<String>, range: Range) -> Self {
        Self::new(id, Severity::Warn, message, range)
    }

    /// Shorthand for an `Info` diagnostic.
    pub fn info(id: impl Into<Cow<'static, str>>, message: impl Into<String>, range: Range) -> Self {
        Self::new(id, Severity::Info, message, range)
    }

    /// Attach machine-readable context (builder pattern).
    pub fn with_context(mut self, ctx: BTreeMap<String, String>) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Human-readable explanation of this diagnostic's code, if known.
    pub fn explain(&self) -> Option<&'static str> {
        explain(&self.id)
    }

    /// Whether this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[{}] {}: {}",
            self.severity, self.id, self.range, self.message
        )
    }
}

/// Human-readable explanation for a diagnostic code, if known.
pub fn explain(id: &str) -> Option<&'static str> {
    include!(concat!(env!("OUT_DIR"), "/generated_explain.rs"))
}

/// Default severity declared for a diagnostic code, if known.
pub fn severity_for_code(id: &str) -> Option<Severity> {
    include!(concat!(env!("OUT_DIR"), "/generated_severity.rs"))
}

/// Context keys a diagnostic of the given code may carry.
pub fn context_keys_for_code(id: &str) -> &'static [&'static str] {
    include!(concat!(env!("OUT_DIR"), "/generated_context_keys.rs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── LineIndex ────────────────────────────────────────────────────────

    #[test]
    fn line_index_round_trips_positions() {
        let idx = LineIndex::new("ab\ncd\n\nef");
        assert_eq!(idx.line_count(), 4);
        assert_eq!(idx.position(0), Position::new(0, 0));
        assert_eq!(idx.position(4), Position::new(1, 1));
        assert_eq!(idx.position(6), Position::new(2, 0));
        assert_eq!(idx.offset(Position::new(3, 1)), 8);
        assert_eq!(idx.line_start(1), Some(3));
        assert_eq!(idx.line_start(4), None);
    }

    #[test]
    fn line_index_clamps_out_of_bounds() {
        let idx = LineIndex::new("hi");
        assert_eq!(idx.offset(Position::new(0, 50)), 2);
        assert_eq!(idx.offset(Position::new(7, 0)), 2);
        assert_eq!(idx.position(100).line, 0);
    }

    #[test]
    fn line_index_empty_input() {
        let idx = LineIndex::new("");
        assert_eq!(idx.line_count(), 1);
        assert_eq!(idx.position(0), Position::new(0, 0));
    }

    // ── Range ────────────────────────────────────────────────────────────

    #[test]
    fn range_orders_by_start_then_end() {
        let a = Range::on_line(1, 2, 5);
        let b = Range::on_line(1, 3, 4);
        let c = Range::on_line(0, 9, 10);
        let mut all = vec![a, b, c];
        all.sort();
        assert_eq!(all, vec![c, a, b]);
    }

    #[test]
    #[should_panic(expected = "Range end")]
    fn inverted_range_panics() {
        Range::on_line(0, 5, 3);
    }

    #[test]
    fn range_display_is_one_based() {
        assert_eq!(Range::on_line(2, 4, 6).to_string(), "3:5");
    }

    // ── Diagnostic ───────────────────────────────────────────────────────

    #[test]
    fn for_code_uses_declared_severity() {
        let r = Range::on_line(0, 0, 1);
        assert_eq!(
            Diagnostic::for_code(codes::DUPLICATE_SETTING, "x", r).severity,
            Severity::Warn
        );
        assert_eq!(
            Diagnostic::for_code(codes::SETTING_SENT_AS_TAG, "x", r).severity,
            Severity::Info
        );
        assert_eq!(
            Diagnostic::for_code(codes::UNEXPECTED_SECTION, "x", r).severity,
            Severity::Error
        );
    }

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::error(
            codes::UNKNOWN_SETTING,
            "colour is unknown.",
            Range::on_line(0, 2, 8),
        );
        assert_eq!(d.to_string(), "error[CC3001] 1:3: colour is unknown.");
    }

    #[test]
    fn every_code_has_explanation_and_severity() {
        let all = [
            codes::UNKNOWN_SECTION,
            codes::UNEXPECTED_SECTION,
            codes::REQUIRED_SECTION_MISSING,
            codes::DUPLICATE_ROOT_SECTION,
            codes::DEPRECATED_SECTION,
            codes::UNMATCHED_KEYWORD,
            codes::UNKNOWN_VARIABLE,
            codes::DUPLICATE_VARIABLE,
            codes::MALFORMED_KEYWORD,
            codes::CSV_COLUMN_COUNT,
            codes::MISPLACED_KEYWORD,
            codes::UNKNOWN_SETTING,
            codes::INVALID_VALUE,
            codes::DEPRECATED_VALUE,
            codes::DUPLICATE_SETTING,
            codes::EXCLUSIVE_SETTINGS,
            codes::SETTING_NOT_ALLOWED,
            codes::REQUIRED_SETTING_MISSING,
            codes::SETTING_SENT_AS_TAG,
            codes::UNDECLARED_ALIAS,
            codes::SETTING_OUTSIDE_SECTION,
            codes::REQUIRED_IF,
            codes::INEFFECTIVE_SETTING,
            codes::VALUE_RELATION,
            codes::COLORS_THRESHOLDS_MISMATCH,
            codes::TIMESPAN_IGNORED,
        ];
        for code in all {
            assert!(explain(code).is_some(), "{code} has no explain() entry");
            assert!(severity_for_code(code).is_some(), "{code} has no severity");
        }
        assert!(explain("CC0000").is_none());
    }

    #[test]
    fn context_keys_are_exposed() {
        assert_eq!(
            context_keys_for_code(codes::CSV_COLUMN_COUNT),
            &["expected", "found"]
        );
        assert!(context_keys_for_code("nope").is_empty());
    }

    #[test]
    fn diagnostic_serde_roundtrip_omits_empty_context() {
        let d = Diagnostic::warn(codes::DUPLICATE_SETTING, "dup", Range::on_line(3, 0, 4));
        let json = serde_json::to_string(&d).unwrap();
        assert!(!json.contains("context"), "{json}");
        assert!(json.contains("\"severity\":\"warn\""), "{json}");
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }

    #[test]
    fn context_serializes_in_key_order() {
        let d = Diagnostic::error(codes::VALUE_RELATION, "x", Range::on_line(0, 0, 1)).with_context(
            BTreeMap::from([
                ("setting".into(), "end-time".into()),
                ("related".into(), "start-time".into()),
            ]),
        );
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.find("related").unwrap() < json.find("setting").unwrap());
    }
}
