//! One declared occurrence of a setting.

use crate::grammar::diag::{Diagnostic, Range};
use crate::grammar::tables::{DefaultSetting, Scope};
use crate::grammar::text_range::TextRange;
use crate::validate::value_check;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// A `name = value` declaration resolved against the catalog.
///
/// `spec` is the catalog descriptor with the scope overrides visible at the
/// declaration already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    /// Resolved descriptor.
    pub spec: DefaultSetting,
    /// First declared value.
    pub value: String,
    /// Every declared value in document order; more than one only for
    /// multi-line settings.
    pub values: Vec<String>,
    /// Location of the setting name.
    pub text_range: TextRange,
}

impl Setting {
    /// Build a setting from its catalog descriptor, applying the overrides
    /// selected by `scope`.
    pub fn from_default(
        default: &DefaultSetting,
        value: &str,
        text_range: TextRange,
        scope: &Scope,
    ) -> Self {
        Self {
            spec: default.resolve(scope),
            value: value.to_string(),
            values: vec![value.to_string()],
            text_range,
        }
    }

    /// Normalized name.
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Name as documented.
    pub fn display_name(&self) -> &str {
        &self.spec.display_name
    }

    /// Location of the first declaration.
    pub fn range(&self) -> Range {
        self.text_range.range
    }

    /// Number of comma-separated entries across all declared values.
    pub fn item_count(&self) -> usize {
        self.values
            .iter()
            .flat_map(|v| v.split(','))
            .filter(|item| !item.trim().is_empty())
            .count()
    }

    /// Validate the first value against the resolved descriptor.
    pub fn check_type(&self) -> Option<Diagnostic> {
        value_check::check_value(&self.spec, &self.value, self.range())
    }
}

impl Serialize for Setting {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let multi = self.values.len() > 1;
        let mut st = serializer.serialize_struct("Setting", if multi { 4 } else { 3 })?;
        st.serialize_field("name", self.display_name())?;
        st.serialize_field("value", &self.value)?;
        if multi {
            st.serialize_field("values", &self.values)?;
        }
        st.serialize_field("range", &self.text_range.range)?;
        st.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::tables::Catalog;

    fn setting(cat: &Catalog, name: &str, value: &str, scope: &Scope) -> Setting {
        Setting::from_default(
            cat.lookup(name).unwrap(),
            value,
            TextRange::new(name, Range::on_line(0, 0, name.len())),
            scope,
        )
    }

    #[test]
    fn resolves_overrides_at_creation() {
        let cat = Catalog::builtin().unwrap();
        let mode = setting(&cat, "mode", "half", &Scope::new(Some("gauge"), None));
        assert_eq!(mode.spec.enum_values, ["default", "half"]);
        assert!(mode.check_type().is_none());
        let mode = setting(&cat, "mode", "half", &Scope::new(Some("chart"), None));
        assert!(mode.check_type().is_some());
    }

    #[test]
    fn counts_items_across_values() {
        let cat = Catalog::builtin().unwrap();
        let mut colors = setting(&cat, "colors", "red, green", &Scope::default());
        colors.values.push("blue".into());
        assert_eq!(colors.item_count(), 3);
    }

    #[test]
    fn serializes_compactly() {
        let cat = Catalog::builtin().unwrap();
        let s = setting(&cat, "metric", "cpu_busy", &Scope::default());
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["name"], "metric");
        assert_eq!(json["value"], "cpu_busy");
        assert!(json.get("values").is_none());
    }
}
