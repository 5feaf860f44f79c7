//! Cross-setting rules evaluated over the committed [`ConfigTree`].
//!
//! Rules are plain functions over a [`SectionQuery`], so they can be tested
//! against any section-like type. [`run_rules`] walks the tree once and
//! applies the series rules, the widget rules and the value relations.

mod relations;
mod requirement;
mod series;
mod widget;

pub use requirement::{Condition, Required, Requirement};

use super::config_tree::{ConfigTree, Section, SectionId};
use crate::grammar::diag::{Diagnostic, Range};
use crate::grammar::tables::{Catalog, Scope, ScopeKey, normalize_name};
use crate::setting::Setting;

/// Read access a rule needs from one section.
pub trait SectionQuery {
    /// Canonical section name.
    fn name(&self) -> &str;

    /// Location of the section token.
    fn range(&self) -> Range;

    /// Setting declared on this section only.
    fn local_setting(&self, name: &str) -> Option<&Setting>;

    /// Nearest declaration on this section or an ancestor.
    fn setting_from_tree(&self, name: &str) -> Option<&Setting>;

    /// Nearest `type`/`mode` binding.
    fn scope_value(&self, key: ScopeKey) -> Option<&str>;

    /// Catalog default of `name` in the scope visible here.
    fn default_value(&self, name: &str) -> Option<String>;

    /// Value in effect: scope for `type`/`mode`, then the tree, then the
    /// catalog default.
    fn effective_value(&self, name: &str) -> Option<String> {
        let declared = match ScopeKey::from_name(&normalize_name(name)) {
            Some(key) => self.scope_value(key).map(str::to_string),
            None => self.setting_from_tree(name).map(|s| s.value.clone()),
        };
        declared.or_else(|| self.default_value(name))
    }

    /// Conditions that do not hold here, in the given order.
    fn failing_conditions<'r>(&self, conditions: &'r [Condition]) -> Vec<&'r Condition> {
        conditions
            .iter()
            .filter(|c| !c.holds(self.effective_value(c.setting).as_deref()))
            .collect()
    }

    /// Whether every condition holds here.
    fn match_conditions(&self, conditions: &[Condition]) -> bool {
        self.failing_conditions(conditions).is_empty()
    }
}

/// A tree node seen through [`SectionQuery`].
#[derive(Debug, Clone, Copy)]
pub struct SectionView<'a> {
    tree: &'a ConfigTree,
    catalog: &'a Catalog,
    id: SectionId,
}

impl<'a> SectionView<'a> {
    /// View of node `id`.
    pub fn new(tree: &'a ConfigTree, catalog: &'a Catalog, id: SectionId) -> Self {
        Self { tree, catalog, id }
    }

    fn section(&self) -> &'a Section {
        self.tree.get(self.id)
    }
}

impl SectionQuery for SectionView<'_> {
    fn name(&self) -> &str {
        &self.section().name
    }

    fn range(&self) -> Range {
        self.section().range
    }

    fn local_setting(&self, name: &str) -> Option<&Setting> {
        self.section().setting(name)
    }

    fn setting_from_tree(&self, name: &str) -> Option<&Setting> {
        self.tree.get_setting(self.id, name)
    }

    fn scope_value(&self, key: ScopeKey) -> Option<&str> {
        self.tree.scope_value(self.id, key)
    }

    fn default_value(&self, name: &str) -> Option<String> {
        let scope: Scope = self.tree.effective_scope(self.id);
        self.catalog.lookup(name)?.resolve(&scope).default_value
    }
}

/// Apply every rule to every node; one diagnostic per range survives.
pub fn run_rules(tree: &ConfigTree, catalog: &Catalog) -> Vec<Diagnostic> {
    let issues = tree.go_through_tree(|id, section| {
        let view = SectionView::new(tree, catalog, id);
        let mut out = match section.name.as_str() {
            "series" => series::check(&view),
            "widget" => widget::check(&view),
            _ => Vec::new(),
        };
        out.extend(relations::check(&view));
        out
    });
    tracing::debug!(sections = tree.len(), issues = issues.len(), "related settings checked");
    issues
}
