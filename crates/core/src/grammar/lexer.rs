//! Line classification for section headers and setting assignments.
//!
//! Both recognizers work on a single comment-blanked line and report byte
//! columns, so ranges point into the original document.

use crate::grammar::diag::Range;
use regex::Regex;
use std::sync::LazyLock;

static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)\[(\w+)\]").expect("section regex is valid"));

static SETTING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([ \t]*)("[^"]*"|[-\w]+)[ \t]*=[ \t]*(.*)$"#).expect("setting regex is valid")
});

/// A `[name]` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader<'a> {
    /// Section name as written.
    pub name: &'a str,
    /// From the opening bracket through the end of the name.
    pub range: Range,
}

/// A `name = value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingLine<'a> {
    /// Setting name without surrounding quotes.
    pub name: &'a str,
    /// Whether the name was written in double quotes.
    pub quoted: bool,
    /// Value with trailing blanks removed.
    pub value: &'a str,
    /// Location of the name as written (quotes included).
    pub name_range: Range,
    /// Byte column where the value starts.
    pub value_column: usize,
}

/// Recognize a section header.
pub fn section_header(line: &str, line_number: usize) -> Option<SectionHeader<'_>> {
    let caps = SECTION_RE.captures(line)?;
    let indent = caps.get(1)?.end();
    let name = caps.get(2)?;
    Some(SectionHeader {
        name: name.as_str(),
        range: Range::on_line(line_number, indent, name.end()),
    })
}

/// Recognize a setting assignment.
pub fn setting_line(line: &str, line_number: usize) -> Option<SettingLine<'_>> {
    let caps = SETTING_RE.captures(line)?;
    let raw_name = caps.get(2)?;
    let value = caps.get(3)?;
    let (name, quoted) = match raw_name
        .as_str()
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
    {
        Some(inner) => (inner, true),
        None => (raw_name.as_str(), false),
    };
    Some(SettingLine {
        name,
        quoted,
        value: value.as_str().trim_end(),
        name_range: Range::on_line(line_number, raw_name.start(), raw_name.end()),
        value_column: value.start(),
    })
}
