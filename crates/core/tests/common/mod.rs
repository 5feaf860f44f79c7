//! Shared test helpers for `chartcfg_core` integration tests.

#![allow(unreachable_pub)]

use chartcfg_core::{Catalog, Diagnostic, Severity, Validator};
use std::sync::LazyLock;

/// Embedded catalog, loaded once per test binary.
pub static CATALOG: LazyLock<Catalog> =
    LazyLock::new(|| Catalog::builtin().unwrap_or_else(|e| panic!("builtin catalog: {e}")));

/// Opening lines of a valid chart widget; the cursor is inside `[series]`.
#[allow(dead_code)]
pub const CHART_HEAD: &str = "\
[configuration]
[group]
[widget]
  type = chart
[series]
  entity = nurswgvml007
  metric = cpu_busy
";

/// Validate with the shared catalog.
#[allow(dead_code)]
pub fn run(text: &str) -> Vec<Diagnostic> {
    Validator::new(&CATALOG).validate(text)
}

/// Diagnostic ids, in output order.
#[allow(dead_code)]
pub fn ids(issues: &[Diagnostic]) -> Vec<&str> {
    issues.iter().map(|d| &*d.id).collect()
}

/// Find first diagnostic with the given code.
#[allow(dead_code)]
pub fn find_diag<'a>(issues: &'a [Diagnostic], code: &str) -> &'a Diagnostic {
    issues
        .iter()
        .find(|d| &*d.id == code)
        .unwrap_or_else(|| panic!("expected diagnostic {code} in {issues:#?}"))
}

/// Whether any diagnostic has the given code.
#[allow(dead_code)]
pub fn has_diag(issues: &[Diagnostic], code: &str) -> bool {
    issues.iter().any(|d| &*d.id == code)
}

// ─── Severity helpers ────────────────────────────────────────────────────────

#[allow(dead_code)]
pub fn is_severity_error(s: &Severity) -> bool {
    matches!(s, Severity::Error)
}

#[allow(dead_code)]
pub fn is_severity_warn(s: &Severity) -> bool {
    matches!(s, Severity::Warn)
}

#[allow(dead_code)]
pub fn is_severity_info(s: &Severity) -> bool {
    matches!(s, Severity::Info)
}
