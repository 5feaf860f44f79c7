//! Document validation.
//!
//! [`Validator`] scans a document line by line. Each line goes to the
//! keyword tracker first, then to section and setting recognition. Closed
//! sections are committed to the [`ConfigTree`], which the related-settings
//! rules walk once the scan is complete.

/// Shorthand for building a `BTreeMap<String, String>` context from key-value pairs.
///
/// ```ignore
/// ctx!("setting" => name, "value" => value)
/// ```
macro_rules! ctx {
    ($($k:expr => $v:expr),+ $(,)?) => {
        ::std::collections::BTreeMap::from([$(($k.into(), $v.into())),+])
    };
}

/// Committed section hierarchy.
pub mod config_tree;
mod diagnostics_util;
/// Block keyword nesting.
pub mod keywords;
/// Cross-setting rules over the committed tree.
pub mod rules;
/// Open-section stack.
pub mod section_stack;
mod settings;
/// Per-setting value checks.
pub mod value_check;

pub use config_tree::{ConfigTree, Section, SectionId};
pub use keywords::{KeywordTracker, LineOutcome};
pub use section_stack::SectionStack;

use crate::grammar::diag::{Diagnostic, Range, codes};
use crate::grammar::lexer::{SectionHeader, section_header, setting_line};
use crate::grammar::tables::Catalog;
use crate::grammar::text_range::TextRange;
use crate::setting::Setting;
use serde::Serialize;
use std::collections::BTreeSet;

/// Result of validating one document.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// `true` if no errors were found (warnings and info are allowed).
    pub ok: bool,
    /// All diagnostics, ordered by position.
    pub issues: Vec<Diagnostic>,
}

/// Validate `text` against `catalog`.
pub fn validate(text: &str, catalog: &Catalog) -> ValidationResult {
    let issues = Validator::new(catalog).validate(text);
    ValidationResult {
        ok: !issues.iter().any(Diagnostic::is_error),
        issues,
    }
}

/// The section whose settings are being read.
#[derive(Debug)]
struct CurrentSection {
    name: String,
    range: Range,
    settings: Vec<Setting>,
    /// Whether the section stack accepted it.
    pushed: bool,
}

/// Single-pass validator for one document at a time.
#[derive(Debug)]
pub struct Validator<'c> {
    catalog: &'c Catalog,
    stack: SectionStack<'c>,
    tree: ConfigTree,
    keywords: KeywordTracker,
    current: Option<CurrentSection>,
    aliases: BTreeSet<String>,
    alias_refs: Vec<(String, Range)>,
    issues: Vec<Diagnostic>,
}

impl<'c> Validator<'c> {
    /// Validator reading setting descriptors and section tables from `catalog`.
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            stack: SectionStack::new(catalog),
            tree: ConfigTree::new(),
            keywords: KeywordTracker::new(),
            current: None,
            aliases: BTreeSet::new(),
            alias_refs: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// Validate a whole document and return its diagnostics ordered by
    /// start position. State from a previous call is discarded.
    pub fn validate(&mut self, text: &str) -> Vec<Diagnostic> {
        *self = Self::new(self.catalog);
        let text = chartcfg_comments::blank_comments(text);
        let mut lines = 0;
        for (line_number, line) in text.lines().enumerate() {
            lines += 1;
            if self
                .keywords
                .process_line(line, line_number, &mut self.issues)
                == LineOutcome::Consumed
            {
                continue;
            }
            if let Some(header) = section_header(line, line_number) {
                self.handle_section(&header);
            } else if let Some(setting) = setting_line(line, line_number) {
                self.handle_setting(&setting);
            }
        }
        self.finish();

        let mut issues = std::mem::take(&mut self.issues);
        issues.sort_by_key(|d| d.range.start);
        tracing::debug!(
            lines,
            sections = self.tree.len(),
            issues = issues.len(),
            "document validated"
        );
        issues
    }

    /// Tree built by the last [`validate`](Self::validate) call.
    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// Consume the validator, keeping the tree built by the last call.
    pub fn into_tree(self) -> ConfigTree {
        self.tree
    }

    fn handle_section(&mut self, header: &SectionHeader<'_>) {
        let catalog = self.catalog;
        let mut name = header.name.to_ascii_lowercase();
        if let Some(canonical) = catalog.section_alias(&name) {
            self.issues.push(
                Diagnostic::for_code(
                    codes::DEPRECATED_SECTION,
                    format!("Section [{name}] is deprecated, use [{canonical}] instead."),
                    header.range,
                )
                .with_context(ctx!("section" => name.as_str(), "replacement" => canonical)),
            );
            name = canonical.to_string();
        }
        self.flush_section();

        let token = TextRange::new(name.as_str(), header.range);
        if let Some(d) = self.stack.insert_section(&token) {
            self.issues.push(d);
        }
        let pushed = self
            .stack
            .last_section()
            .is_some_and(|frame| frame.range == header.range);
        self.current = Some(CurrentSection {
            name,
            range: header.range,
            settings: Vec::new(),
            pushed,
        });
    }

    /// Close the current section: check its required settings and commit it.
    fn flush_section(&mut self) {
        let Some(section) = self.current.take() else {
            return;
        };
        self.check_required_settings(&section);
        if section.pushed {
            for setting in &section.settings {
                self.stack.insert_current_setting(setting.clone());
            }
            self.tree
                .add_section(self.catalog, &section.name, section.range, section.settings);
        }
    }

    fn check_required_settings(&mut self, section: &CurrentSection) {
        let declared = |name: &str| {
            let normalized = crate::grammar::tables::normalize_name(name);
            section.settings.iter().any(|s| s.name() == normalized)
                || self.stack.current_setting(name, true).is_some()
        };
        // derived series compute their data from other series
        if section.name == "series" && declared("value") {
            return;
        }
        let mut missing = Vec::new();
        for alternatives in self.catalog.required_settings(&section.name) {
            if let Some(first) = alternatives.first()
                && !alternatives.iter().any(|alt| declared(alt))
            {
                missing.push(first.clone());
            }
        }
        for setting in missing {
            self.issues.push(
                Diagnostic::for_code(
                    codes::REQUIRED_SETTING_MISSING,
                    format!("{setting} is required"),
                    section.range,
                )
                .with_context(ctx!("section" => section.name.as_str(), "setting" => setting)),
            );
        }
    }

    fn finish(&mut self) {
        self.flush_section();
        self.keywords.finish(&mut self.issues);
        if let Some(d) = self.stack.finalize() {
            self.issues.push(d);
        }
        for (alias, range) in std::mem::take(&mut self.alias_refs) {
            if !self.aliases.contains(&alias) {
                self.issues.push(
                    Diagnostic::for_code(
                        codes::UNDECLARED_ALIAS,
                        format!("The alias {alias} is referred, but never declared."),
                        range,
                    )
                    .with_context(ctx!("alias" => alias)),
                );
            }
        }
        let related = rules::run_rules(&self.tree, self.catalog);
        self.issues.extend(related);
    }
}
