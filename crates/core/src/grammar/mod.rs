/// Re-exports from the diagnostics crate.
pub mod diag;
/// Section header and setting line recognition.
pub mod lexer;
/// Re-exports of catalog types used by the validator.
pub mod tables;
/// Block keyword scanner.
pub mod text_range;
