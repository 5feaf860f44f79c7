//! Diagnostic ID constants.
//!
//! Generated from `spec/diagnostics.jsonc` at build time. Use these instead
//! of string literals so that typos fail to compile.

include!(concat!(env!("OUT_DIR"), "/generated_codes.rs"));
