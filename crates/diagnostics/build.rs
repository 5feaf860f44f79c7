//! Build script for generating diagnostic code tables at compile time.
//!
//! Reads `spec/diagnostics.jsonc` and writes into `OUT_DIR`:
//! - `generated_codes.rs`: public `&str` constants named after `constName`
//! - `generated_explain.rs`: match expression from code id to description
//! - `generated_severity.rs`: match expression from code id to default severity
//! - `generated_context_keys.rs`: match expression from code id to its context keys

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::Path;
use chartcfg_comments::strip_jsonc;

fn main() {
    let spec_path = Path::new("spec/diagnostics.jsonc");
    println!("cargo:rerun-if-changed={}", spec_path.display());

    let raw = fs::read_to_string(spec_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", spec_path.display()));
    let spec: serde_json::Value = serde_json::from_str(&strip_jsonc(&raw))
        .expect("failed to parse diagnostics.jsonc as JSON");
    let diagnostics = spec["diagnostics"]
        .as_array()
        .expect("diagnostics.jsonc: expected `diagnostics` array");

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let out_path = Path::new(&out_dir);

    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut seen_names: HashSet<&str> = HashSet::new();

    let mut codes =
        String::from("// Auto-generated from spec/diagnostics.jsonc. DO NOT EDIT.\n\n");
    let mut explain = String::from("match id {\n");
    let mut severity = String::from("match id {\n");
    let mut context_keys = String::from("match id {\n");

    for (i, entry) in diagnostics.iter().enumerate() {
        let field = |name: &str| {
            entry[name]
                .as_str()
                .unwrap_or_else(|| panic!("diagnostics[{i}] missing string `{name}`"))
        };
        let id = field("id");
        let const_name = field("constName");
        let summary = field("summary");
        let description = field("description");

        assert!(
            id.len() == 6 && id.starts_with("CC") && id[2..].bytes().all(|b| b.is_ascii_digit()),
            "diagnostics[{i}]: id '{id}' must look like CC1234"
        );
        assert!(
            !const_name.is_empty()
                && const_name
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
                && const_name.as_bytes()[0].is_ascii_uppercase(),
            "diagnostics[{i}] (id={id}): constName '{const_name}' is not SCREAMING_SNAKE_CASE"
        );
        assert!(seen_ids.insert(id), "diagnostics[{i}]: duplicate id '{id}'");
        assert!(
            seen_names.insert(const_name),
            "diagnostics[{i}] (id={id}): duplicate constName '{const_name}'"
        );

        codes.push_str(&format!("/// {summary}\n"));
        codes.push_str(&format!("pub const {const_name}: &str = \"{id}\";\n\n"));

        explain.push_str(&format!(
            "    \"{id}\" => Some(\"{}\"),\n",
            escape_rust_string_literal(description)
        ));

        let sev_rs = match field("severity") {
            "error" => "Severity::Error",
            "warn" => "Severity::Warn",
            "info" => "Severity::Info",
            other => panic!("diagnostics[{i}] (id={id}): invalid severity '{other}'"),
        };
        severity.push_str(&format!("    \"{id}\" => Some({sev_rs}),\n"));

        let keys: Vec<String> = entry["contextKeys"]
            .as_array()
            .unwrap_or_else(|| panic!("diagnostics[{i}] (id={id}) missing `contextKeys`"))
            .iter()
            .map(|k| {
                let k = k.as_str().unwrap_or_else(|| {
                    panic!("diagnostics[{i}] (id={id}) contextKeys entries must be strings")
                });
                format!("\"{}\"", escape_rust_string_literal(k))
            })
            .collect();
        context_keys.push_str(&format!("    \"{id}\" => &[{}],\n", keys.join(", ")));
    }

    explain.push_str("    _ => None,\n}\n");
    severity.push_str("    _ => None,\n}\n");
    context_keys.push_str("    _ => &[],\n}\n");

    for (name, body) in [
        ("generated_codes.rs", &codes),
        ("generated_explain.rs", &explain),
        ("generated_severity.rs", &severity),
        ("generated_context_keys.rs", &context_keys),
    ] {
        fs::write(out_path.join(name), body)
            .unwrap_or_else(|e| panic!("failed to write {name}: {e}"));
    }
}

fn escape_rust_string_literal(value: &str) -> String {
    value.chars().flat_map(char::escape_default).collect()
}
