use std::fmt::Display;

/// Format a number without trailing zeros (`1.50` → `1.5`, `100.0` → `100`).
pub(super) fn trim_f64(n: f64) -> String {
    let s = format!("{:.6}", n);
    let s = s.trim_end_matches('0').trim_end_matches('.').to_string();
    if s.is_empty() || s == "-0" { "0".to_string() } else { s }
}

/// `"\n * a\n * b"`: one bullet per item.
pub(super) fn bullet_list<T: Display>(items: impl IntoIterator<Item = T>) -> String {
    items.into_iter().map(|item| format!("\n * {item}")).collect()
}

/// `"[a], [b]"`
pub(super) fn section_list<T: Display>(names: impl IntoIterator<Item = T>) -> String {
    names
        .into_iter()
        .map(|name| format!("[{name}]"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_numbers() {
        assert_eq!(trim_f64(1.5), "1.5");
        assert_eq!(trim_f64(100.0), "100");
        assert_eq!(trim_f64(0.0), "0");
        assert_eq!(trim_f64(-0.25), "-0.25");
    }

    #[test]
    fn lists() {
        assert_eq!(bullet_list(["a", "b"]), "\n * a\n * b");
        assert_eq!(section_list(["series", "node"]), "[series], [node]");
        assert_eq!(section_list(Vec::<&str>::new()), "");
    }
}
