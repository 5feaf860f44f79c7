//! Stack of currently open sections.
//!
//! Each frame tracks the child sections it still requires. Frames are popped
//! when a shallower (or equally deep) section opens; the deepest popped frame
//! with unmet requirements is reported once.

use super::diagnostics_util::section_list;
use crate::grammar::diag::{Diagnostic, Range, codes};
use crate::grammar::tables::{Catalog, normalize_name};
use crate::grammar::text_range::TextRange;
use crate::setting::Setting;
use std::cmp::Reverse;

/// One alternative set of required child sections.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DependencyOption {
    unresolved: Vec<String>,
    resolved_count: usize,
}

impl DependencyOption {
    fn new(names: &[String]) -> Self {
        Self {
            unresolved: names.to_vec(),
            resolved_count: 0,
        }
    }

    fn resolve(&mut self, section: &str) {
        let before = self.unresolved.len();
        self.unresolved.retain(|name| name != section);
        self.resolved_count += before - self.unresolved.len();
    }
}

/// An open, uncommitted section.
#[derive(Debug, Clone)]
pub struct StackFrame {
    /// Canonical section name.
    pub name: String,
    /// Location of the section token.
    pub range: Range,
    /// Settings declared so far.
    pub settings: Vec<Setting>,
    dependencies: Vec<DependencyOption>,
}

impl StackFrame {
    fn new(name: &str, range: Range, requirements: &[Vec<String>]) -> Self {
        Self {
            name: name.to_string(),
            range,
            settings: Vec::new(),
            dependencies: requirements.iter().map(|opt| DependencyOption::new(opt)).collect(),
        }
    }

    /// True when there were no requirements or one alternative is complete.
    pub fn dependencies_resolved(&self) -> bool {
        self.dependencies.is_empty() || self.dependencies.iter().any(|d| d.unresolved.is_empty())
    }

    /// Alternative closest to completion: most resolved, then fewest missing.
    fn best_option(&self) -> Option<&DependencyOption> {
        self.dependencies
            .iter()
            .max_by_key(|d| (d.resolved_count, Reverse(d.unresolved.len())))
    }

    fn setting(&self, name: &str) -> Option<&Setting> {
        self.settings.iter().find(|s| s.name() == name)
    }
}

/// Explicit-depth stack of open sections.
#[derive(Debug)]
pub struct SectionStack<'c> {
    catalog: &'c Catalog,
    frames: Vec<StackFrame>,
}

impl<'c> SectionStack<'c> {
    /// Empty stack.
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            frames: Vec::new(),
        }
    }

    /// Number of open frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no section is open.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Open a section.
    ///
    /// Returns a diagnostic when the section is unknown, too deep, a second
    /// root, or when closing open frames leaves a requirement unmet. Only the
    /// last case still pushes the section.
    pub fn insert_section(&mut self, section: &TextRange) -> Option<Diagnostic> {
        let name = section.text.as_str();
        let Some(mut depth) = self.catalog.section_depth(name) else {
            return Some(
                Diagnostic::for_code(
                    codes::UNKNOWN_SECTION,
                    format!("Unknown section [{name}]."),
                    section.range,
                )
                .with_context(ctx!("section" => name)),
            );
        };
        let len = self.frames.len();
        if depth > len && len > 0 && self.catalog.is_inheritable(name) {
            let top_is_same = self.frames.last().is_some_and(|f| f.name == name);
            depth = if top_is_same { len - 1 } else { len };
        }
        if depth > len {
            let expected = section_list(self.catalog.sections_at_depth(len));
            return Some(
                Diagnostic::for_code(
                    codes::UNEXPECTED_SECTION,
                    format!("Unexpected section [{name}]. Expected {expected}."),
                    section.range,
                )
                .with_context(ctx!("section" => name, "expected" => expected)),
            );
        }
        if depth == 0 && len > 0 {
            return Some(
                Diagnostic::for_code(
                    codes::DUPLICATE_ROOT_SECTION,
                    format!("Section [{name}] can be declared only once."),
                    section.range,
                )
                .with_context(ctx!("section" => name)),
            );
        }

        let diagnostic = if depth < len {
            let d = self.check_dependencies(depth);
            for frame in self.frames.drain(depth..) {
                tracing::trace!(section = %frame.name, "section closed");
            }
            d
        } else {
            None
        };
        for frame in &mut self.frames {
            for option in &mut frame.dependencies {
                option.resolve(name);
            }
        }
        tracing::trace!(section = name, depth, "section opened");
        self.frames.push(StackFrame::new(
            name,
            section.range,
            self.catalog.required_sections(name),
        ));
        diagnostic
    }

    /// Report unmet requirements of every open frame (end of document).
    pub fn finalize(&mut self) -> Option<Diagnostic> {
        let diagnostic = self.check_dependencies(0);
        self.frames.clear();
        diagnostic
    }

    /// Deepest frame at or above `depth` with an unmet requirement.
    fn check_dependencies(&self, depth: usize) -> Option<Diagnostic> {
        let frame = self.frames[depth.min(self.frames.len())..]
            .iter()
            .rev()
            .find(|f| !f.dependencies_resolved())?;
        let missing = &frame.best_option()?.unresolved;
        let message = match missing.as_slice() {
            [one] => format!("Required section [{one}] is not declared."),
            many => format!("Required sections {} are not declared.", section_list(many)),
        };
        Some(
            Diagnostic::for_code(codes::REQUIRED_SECTION_MISSING, message, frame.range).with_context(
                ctx!("section" => frame.name.as_str(), "missing" => missing.join(", ")),
            ),
        )
    }

    /// Innermost open frame.
    pub fn last_section(&self) -> Option<&StackFrame> {
        self.frames.last()
    }

    /// Record a setting on the innermost frame.
    pub fn insert_current_setting(&mut self, setting: Setting) {
        if let Some(frame) = self.frames.last_mut() {
            frame.settings.push(setting);
        }
    }

    /// Find a setting on the innermost frame, or on any open frame when
    /// `recursive`, innermost first.
    pub fn current_setting(&self, name: &str, recursive: bool) -> Option<&Setting> {
        let name = normalize_name(name);
        let depth = if recursive { self.frames.len() } else { 1 };
        self.frames
            .iter()
            .rev()
            .take(depth)
            .find_map(|f| f.setting(&name))
    }

    /// Settings of the innermost frame named `section`, followed by those of
    /// its enclosing frames when `recursive`.
    pub fn section_settings(&self, section: &str, recursive: bool) -> Vec<&Setting> {
        let Some(idx) = self.frames.iter().rposition(|f| f.name == section) else {
            return Vec::new();
        };
        let frames = if recursive {
            &self.frames[..=idx]
        } else {
            &self.frames[idx..=idx]
        };
        frames
            .iter()
            .rev()
            .flat_map(|f| f.settings.iter())
            .collect()
    }

    /// Location of the innermost open frame named `section`.
    pub fn section_range(&self, section: &str) -> Option<Range> {
        self.frames
            .iter()
            .rev()
            .find(|f| f.name == section)
            .map(|f| f.range)
    }

    /// Add required child sections to the innermost frame named `target`.
    ///
    /// Names are appended to every existing alternative; a frame without
    /// requirements gets a single new one.
    pub fn require_sections(&mut self, target: &str, sections: &[&str]) {
        let Some(frame) = self.frames.iter_mut().rev().find(|f| f.name == target) else {
            return;
        };
        let names: Vec<String> = sections.iter().map(|s| s.to_string()).collect();
        if frame.dependencies.is_empty() {
            frame.dependencies.push(DependencyOption::new(&names));
            return;
        }
        for option in &mut frame.dependencies {
            for name in &names {
                if !option.unresolved.contains(name) {
                    option.unresolved.push(name.clone());
                }
            }
        }
    }

    /// Replace the requirements of the innermost frame named `target`.
    pub fn set_section_requirements(&mut self, target: &str, options: &[Vec<String>]) {
        if let Some(frame) = self.frames.iter_mut().rev().find(|f| f.name == target) {
            frame.dependencies = options.iter().map(|opt| DependencyOption::new(opt)).collect();
        }
    }
}
