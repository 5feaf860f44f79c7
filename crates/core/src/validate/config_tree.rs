//! Committed section hierarchy, built as frames leave the section stack.
//!
//! Nodes live in an arena and refer to each other by [`SectionId`]. Scope is
//! stored per node as a local overlay; lookups walk the parent chain.

use crate::grammar::diag::{Diagnostic, Range};
use crate::grammar::tables::{Catalog, Scope, ScopeKey, normalize_name};
use crate::setting::Setting;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::HashSet;

/// Depth of the shallowest section that can never be a parent slot.
const NESTED_DEPTH: usize = 4;

/// Index of a node in its [`ConfigTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId(usize);

/// One committed section.
#[derive(Debug, Clone)]
pub struct Section {
    /// Canonical section name.
    pub name: String,
    /// Location of the section token.
    pub range: Range,
    /// Settings in declaration order.
    pub settings: Vec<Setting>,
    /// Enclosing section; `None` for the root.
    pub parent: Option<SectionId>,
    /// Nested sections in document order.
    pub children: Vec<SectionId>,
    /// `type`/`mode` declared on this node only.
    pub scope: Scope,
}

impl Section {
    /// Setting declared on this node.
    pub fn setting(&self, name: &str) -> Option<&Setting> {
        let name = normalize_name(name);
        self.settings.iter().find(|s| s.name() == name)
    }
}

/// Section hierarchy of one document.
#[derive(Debug, Clone, Default)]
pub struct ConfigTree {
    sections: Vec<Section>,
    root: Option<SectionId>,
    last_by_depth: Vec<Option<SectionId>>,
    previous: Option<SectionId>,
    last_added_parent: Option<SectionId>,
}

impl ConfigTree {
    /// Empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Root `[configuration]` node.
    pub fn root(&self) -> Option<SectionId> {
        self.root
    }

    /// Node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this tree.
    pub fn get(&self, id: SectionId) -> &Section {
        &self.sections[id.0]
    }

    /// Number of attached nodes.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether nothing was attached.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// All nodes with their ids, in insertion order.
    pub fn sections(&self) -> impl Iterator<Item = (SectionId, &Section)> {
        self.sections
            .iter()
            .enumerate()
            .map(|(i, s)| (SectionId(i), s))
    }

    /// Attach a closed section.
    ///
    /// Returns `None` when there is no legal parent slot; the section stack
    /// has already reported that case.
    pub fn add_section(
        &mut self,
        catalog: &Catalog,
        name: &str,
        range: Range,
        settings: Vec<Setting>,
    ) -> Option<SectionId> {
        let depth = catalog.section_depth(name)?;
        let parent = match depth {
            0 if self.root.is_none() => None,
            0 => {
                tracing::trace!(section = name, "second root dropped");
                return None;
            }
            1 => Some(self.root?),
            2 => Some(self.last_at(1)?),
            3 => Some(self.nested_to_previous(catalog, name).or_else(|| self.last_at(2))?),
            NESTED_DEPTH => Some(
                self.nested_to_previous(catalog, name)
                    .or(self.last_added_parent)?,
            ),
            _ => None,
        };
        if depth > 0 && parent.is_none() {
            tracing::trace!(section = name, depth, "no parent slot, section dropped");
            return None;
        }

        let id = SectionId(self.sections.len());
        let mut scope = Scope::default();
        for key in [ScopeKey::Type, ScopeKey::Mode] {
            if let Some(s) = settings.iter().find(|s| s.name() == key.setting_name()) {
                scope.set(key, &s.value);
            }
        }
        self.sections.push(Section {
            name: name.to_string(),
            range,
            settings,
            parent,
            children: Vec::new(),
            scope,
        });
        match parent {
            Some(p) => self.sections[p.0].children.push(id),
            None => self.root = Some(id),
        }
        if self.last_by_depth.len() <= depth {
            self.last_by_depth.resize(depth + 1, None);
        }
        self.last_by_depth[depth] = Some(id);
        self.last_by_depth.truncate(depth + 1);
        if depth < NESTED_DEPTH {
            self.last_added_parent = Some(id);
        }
        self.previous = Some(id);
        tracing::trace!(section = name, depth, "section attached");
        Some(id)
    }

    fn last_at(&self, depth: usize) -> Option<SectionId> {
        self.last_by_depth.get(depth).copied().flatten()
    }

    /// The previously added section, if it may directly enclose `name`.
    fn nested_to_previous(&self, catalog: &Catalog, name: &str) -> Option<SectionId> {
        let previous = self.previous?;
        let previous_name = &self.get(previous).name;
        catalog
            .parent_sections(name)
            .iter()
            .any(|p| p == previous_name)
            .then_some(previous)
    }

    /// `id` followed by its ancestors, innermost first.
    pub fn ancestors(&self, id: SectionId) -> impl Iterator<Item = (SectionId, &Section)> {
        std::iter::successors(Some(id), |&cur| self.get(cur).parent).map(|i| (i, self.get(i)))
    }

    /// Nearest declaration of `name` on `id` or its ancestors.
    pub fn get_setting(&self, id: SectionId, name: &str) -> Option<&Setting> {
        let name = normalize_name(name);
        self.ancestors(id)
            .find_map(|(_, s)| s.settings.iter().find(|st| st.name() == name))
    }

    /// Nearest `type`/`mode` binding on `id` or its ancestors.
    pub fn scope_value(&self, id: SectionId, key: ScopeKey) -> Option<&str> {
        self.ancestors(id).find_map(|(_, s)| s.scope.get(key))
    }

    /// Scope visible at `id`.
    pub fn effective_scope(&self, id: SectionId) -> Scope {
        Scope::new(
            self.scope_value(id, ScopeKey::Type),
            self.scope_value(id, ScopeKey::Mode),
        )
    }

    /// Visit every node once (pre-order) and collect the visitor's
    /// diagnostics, keeping the first diagnostic per range.
    pub fn go_through_tree<F>(&self, mut visit: F) -> Vec<Diagnostic>
    where
        F: FnMut(SectionId, &Section) -> Vec<Diagnostic>,
    {
        let mut seen: HashSet<Range> = HashSet::new();
        let mut out = Vec::new();
        let mut pending: Vec<SectionId> = self.root.into_iter().collect();
        while let Some(id) = pending.pop() {
            let section = self.get(id);
            for d in visit(id, section) {
                if seen.insert(d.range) {
                    out.push(d);
                }
            }
            pending.extend(section.children.iter().rev().copied());
        }
        out
    }
}

struct NodeView<'a> {
    tree: &'a ConfigTree,
    id: SectionId,
}

impl Serialize for NodeView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let section = self.tree.get(self.id);
        let children: Vec<NodeView<'_>> = section
            .children
            .iter()
            .map(|&id| NodeView {
                tree: self.tree,
                id,
            })
            .collect();
        let mut st = serializer.serialize_struct("Section", 5)?;
        st.serialize_field("name", &section.name)?;
        st.serialize_field("range", &section.range)?;
        st.serialize_field("scope", &section.scope)?;
        st.serialize_field("settings", &section.settings)?;
        st.serialize_field("children", &children)?;
        st.end()
    }
}

impl Serialize for ConfigTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let root = self.root.map(|id| NodeView { tree: self, id });
        let mut st = serializer.serialize_struct("ConfigTree", 1)?;
        st.serialize_field("root", &root)?;
        st.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::text_range::TextRange;
    use std::sync::LazyLock;

    static CATALOG: LazyLock<Catalog> = LazyLock::new(|| Catalog::builtin().unwrap());

    fn setting(name: &str, value: &str, line: usize) -> Setting {
        Setting::from_default(
            CATALOG.lookup(name).unwrap(),
            value,
            TextRange::new(name, Range::on_line(line, 0, name.len())),
            &Scope::default(),
        )
    }

    fn build(sections: &[(&str, Vec<Setting>)]) -> (ConfigTree, Vec<Option<SectionId>>) {
        let mut tree = ConfigTree::new();
        let ids = sections
            .iter()
            .enumerate()
            .map(|(i, (name, settings))| {
                tree.add_section(&CATALOG, name, Range::on_line(i, 0, name.len() + 1), settings.clone())
            })
            .collect();
        (tree, ids)
    }

    fn parent_name(tree: &ConfigTree, id: Option<SectionId>) -> Option<&str> {
        let parent = tree.get(id?).parent?;
        Some(tree.get(parent).name.as_str())
    }

    #[test]
    fn attaches_by_depth() {
        let (tree, ids) = build(&[
            ("configuration", vec![]),
            ("group", vec![]),
            ("widget", vec![]),
            ("series", vec![]),
            ("widget", vec![]),
            ("series", vec![]),
        ]);
        assert_eq!(tree.root(), ids[0]);
        assert_eq!(parent_name(&tree, ids[1]), Some("configuration"));
        assert_eq!(parent_name(&tree, ids[3]), Some("widget"));
        assert_eq!(tree.get(ids[5].unwrap()).parent, ids[4]);
        assert_eq!(tree.get(ids[1].unwrap()).children.len(), 2);
    }

    #[test]
    fn series_after_column_nests_under_column() {
        let (tree, ids) = build(&[
            ("configuration", vec![]),
            ("group", vec![]),
            ("widget", vec![]),
            ("column", vec![]),
            ("series", vec![]),
            ("series", vec![]),
        ]);
        assert_eq!(tree.get(ids[4].unwrap()).parent, ids[3]);
        assert_eq!(tree.get(ids[5].unwrap()).parent, ids[2]);
    }

    #[test]
    fn depth_four_nests_to_previous_or_last_parent() {
        let (tree, ids) = build(&[
            ("configuration", vec![]),
            ("group", vec![]),
            ("widget", vec![]),
            ("dropdown", vec![]),
            ("option", vec![]),
            ("option", vec![]),
            ("series", vec![]),
            ("tags", vec![]),
            ("tags", vec![]),
        ]);
        assert_eq!(tree.get(ids[4].unwrap()).parent, ids[3]);
        assert_eq!(tree.get(ids[5].unwrap()).parent, ids[3]);
        assert_eq!(tree.get(ids[7].unwrap()).parent, ids[6]);
        assert_eq!(tree.get(ids[8].unwrap()).parent, ids[6]);
    }

    #[test]
    fn tags_under_configuration() {
        let (tree, ids) = build(&[("configuration", vec![]), ("tags", vec![])]);
        assert_eq!(tree.get(ids[1].unwrap()).parent, ids[0]);
    }

    #[test]
    fn sections_without_parent_slot_are_dropped() {
        let (tree, ids) = build(&[("widget", vec![]), ("configuration", vec![]), ("configuration", vec![])]);
        assert_eq!(ids, vec![None, Some(SectionId(0)), None]);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn scope_and_settings_are_inherited() {
        let (tree, ids) = build(&[
            ("configuration", vec![setting("timespan", "1 day", 0)]),
            ("group", vec![]),
            ("widget", vec![setting("type", "Chart", 2), setting("mode", "column", 2)]),
            ("series", vec![]),
        ]);
        let series = ids[3].unwrap();
        assert_eq!(tree.scope_value(series, ScopeKey::Type), Some("chart"));
        assert_eq!(tree.effective_scope(series), Scope::new(Some("chart"), Some("column")));
        assert_eq!(tree.get_setting(series, "timespan").unwrap().value, "1 day");
        assert!(tree.get_setting(ids[0].unwrap(), "type").is_none());
        assert_eq!(tree.ancestors(series).count(), 4);
    }

    #[test]
    fn walk_visits_each_node_once_and_dedups_ranges() {
        let (tree, _) = build(&[
            ("configuration", vec![]),
            ("group", vec![]),
            ("widget", vec![]),
            ("series", vec![]),
        ]);
        let mut visited = Vec::new();
        let shared = Range::on_line(99, 0, 1);
        let issues = tree.go_through_tree(|_, s| {
            visited.push(s.name.clone());
            vec![Diagnostic::error("X", s.name.clone(), shared)]
        });
        assert_eq!(visited, ["configuration", "group", "widget", "series"]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "configuration");
    }

    #[test]
    fn serializes_nested() {
        let (tree, _) = build(&[
            ("configuration", vec![]),
            ("group", vec![]),
            ("widget", vec![setting("type", "gauge", 2)]),
        ]);
        let json = serde_json::to_value(&tree).unwrap();
        let widget = &json["root"]["children"][0]["children"][0];
        assert_eq!(widget["name"], "widget");
        assert_eq!(widget["scope"]["type"], "gauge");
        assert_eq!(widget["settings"][0]["value"], "gauge");
    }
}
