pub use chartcfg_diagnostics::{
    Diagnostic, LineIndex, Position, Range, Severity, codes, explain, severity_for_code,
};
