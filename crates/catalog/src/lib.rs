//! Settings dictionary and structural section tables.
//!
//! A [`Catalog`] holds every known [`DefaultSetting`] keyed by its normalized
//! name, together with the static maps that drive section nesting: depth per
//! section, inheritable sections, parent sections, required child sections and
//! settings, and per-widget-type section requirements.
//!
//! Catalogs are deserialized from JSONC. The default dictionary is embedded at
//! compile time and available through [`Catalog::builtin`]. A catalog is
//! immutable once built and is shared by reference with every validator.

pub mod scope_expr;

pub use scope_expr::{Scope, ScopeExpr, ScopeKey};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Embedded default catalog source.
pub const BUILTIN_CATALOG: &str = include_str!("../data/catalog.jsonc");

/// Maximum edit distance for "did you mean" suggestions.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Errors raised while loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog is not valid JSON or does not match the schema.
    #[error("invalid catalog JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// An override selector failed to parse.
    #[error("setting `{setting}`: invalid scope expression `{expression}`: {reason}")]
    InvalidScopeExpression {
        /// Display name of the setting.
        setting: String,
        /// Offending expression source.
        expression: String,
        /// Parser message.
        reason: String,
    },
    /// A setting entry is inconsistent.
    #[error("setting `{setting}`: {reason}")]
    InvalidSetting {
        /// Display name of the setting.
        setting: String,
        /// What is wrong with it.
        reason: String,
    },
    /// A structural map references a section missing from `sectionDepth`.
    #[error("`{map}` references unknown section `{section}`")]
    UnknownSection {
        /// Name of the map holding the reference.
        map: &'static str,
        /// Unknown section name.
        section: String,
    },
}

// ── Setting descriptors ────────────────────────────────────────────────────

/// Value type of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    /// Free text, optionally restricted to comma-separated enum tokens.
    String,
    /// Signed decimal number.
    Number,
    /// Signed integer.
    Integer,
    /// One of the boolean vocabulary tokens.
    Boolean,
    /// One of a fixed set of values.
    Enum,
    /// `<count> <unit>` duration.
    Interval,
    /// Calendar expression or ISO date.
    Date,
    /// JSON value.
    Object,
}

impl fmt::Display for SettingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SettingType::String => "string",
            SettingType::Number => "number",
            SettingType::Integer => "integer",
            SettingType::Boolean => "boolean",
            SettingType::Enum => "enum",
            SettingType::Interval => "interval",
            SettingType::Date => "date",
            SettingType::Object => "object",
        })
    }
}

/// Numeric bound; `excluded` makes it open.
///
/// In JSON either a plain number (closed bound) or
/// `{ "value": 0, "excluded": true }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBound")]
pub struct Bound {
    /// Limit value.
    pub value: f64,
    /// Whether the limit itself is outside the allowed range.
    pub excluded: bool,
}

impl Bound {
    /// Closed bound at `value`.
    pub fn inclusive(value: f64) -> Self {
        Self {
            value,
            excluded: false,
        }
    }

    /// Open bound at `value`.
    pub fn exclusive(value: f64) -> Self {
        Self {
            value,
            excluded: true,
        }
    }

    /// Same bound with the limit multiplied by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            value: self.value * factor,
            ..self
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBound {
    Plain(f64),
    Detailed {
        value: f64,
        #[serde(default)]
        excluded: bool,
    },
}

impl From<RawBound> for Bound {
    fn from(raw: RawBound) -> Self {
        match raw {
            RawBound::Plain(value) => Bound::inclusive(value),
            RawBound::Detailed { value, excluded } => Bound { value, excluded },
        }
    }
}

/// Partial descriptor applied when a scope override matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingPatch {
    /// Replacement type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<SettingType>,
    /// Replacement enum list.
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// Replacement lower bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<Bound>,
    /// Replacement upper bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<Bound>,
    /// Replacement example.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    /// Replacement default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// Format a string value must match, with the phrase used to describe it.
#[derive(Debug, Clone)]
pub struct ValuePattern {
    /// Compiled pattern; matched against the whole value.
    pub regex: Regex,
    /// Completes "<setting> must be ...", e.g. `an identifier, for example s1`.
    pub hint: String,
}

impl ValuePattern {
    /// Whether `value` has the expected format.
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for ValuePattern {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str() && self.hint == other.hint
    }
}

/// A patch guarded by a scope expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeOverride {
    /// Source text of the guard.
    pub source: String,
    /// Parsed guard.
    pub expr: ScopeExpr,
    /// Patch applied when the guard holds.
    pub patch: SettingPatch,
}

/// Static descriptor of a setting.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultSetting {
    /// Name as written in documentation (e.g. `start-time`).
    pub display_name: String,
    /// Normalized name: lower-cased, letters only (e.g. `starttime`).
    pub name: String,
    /// Value type.
    pub kind: SettingType,
    /// Allowed values, lower-cased and sorted.
    pub enum_values: Vec<String>,
    /// Lower bound for numeric types.
    pub min_value: Option<Bound>,
    /// Upper bound for numeric types.
    pub max_value: Option<Bound>,
    /// Example value used in messages.
    pub example: Option<String>,
    /// Value assumed when the setting is not declared.
    pub default_value: Option<String>,
    /// Format string values must match.
    pub pattern: Option<ValuePattern>,
    /// Normalized names of settings that cannot share a section with this one.
    pub excludes: Vec<String>,
    /// Whether repeated declarations accumulate.
    pub multi_line: bool,
    /// Sections the setting may appear in (empty: any).
    pub sections: Vec<String>,
    /// Widget types the setting has effect for (empty: any).
    pub widgets: Vec<String>,
    /// Documentation text.
    pub description: Option<String>,
    /// Scope overrides in catalog order.
    pub overrides: Vec<ScopeOverride>,
}

impl DefaultSetting {
    /// Apply a patch in place.
    pub fn apply(&mut self, patch: &SettingPatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(values) = &patch.enum_values {
            self.enum_values = normalize_enum(values);
        }
        if let Some(min) = patch.min_value {
            self.min_value = Some(min);
        }
        if let Some(max) = patch.max_value {
            self.max_value = Some(max);
        }
        if let Some(example) = &patch.example {
            self.example = Some(example.clone());
        }
        if let Some(default) = &patch.default_value {
            self.default_value = Some(default.clone());
        }
    }

    /// Descriptor with every override matching `scope` applied in order.
    pub fn resolve(&self, scope: &Scope) -> DefaultSetting {
        let mut resolved = self.clone();
        for ov in &self.overrides {
            if ov.expr.eval(scope) {
                resolved.apply(&ov.patch);
            }
        }
        resolved
    }

    /// Whether the setting may be declared in `section`.
    ///
    /// Settings may also be declared in a section shallower than every
    /// listed section; deeper sections inherit them.
    pub fn allowed_in(&self, section: &str, catalog: &Catalog) -> bool {
        if self.sections.is_empty() || self.sections.iter().any(|s| s == section) {
            return true;
        }
        let Some(depth) = catalog.section_depth(section) else {
            return false;
        };
        self.sections
            .iter()
            .filter_map(|s| catalog.section_depth(s))
            .all(|listed| depth < listed)
    }

    /// Whether the setting has effect for widgets of `widget_type`.
    pub fn applies_to_widget(&self, widget_type: &str) -> bool {
        self.widgets.is_empty()
            || self
                .widgets
                .iter()
                .any(|w| w.eq_ignore_ascii_case(widget_type))
    }
}

/// Normalize a setting name: lower-case, letters only.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn normalize_enum(values: &[String]) -> Vec<String> {
    let set: BTreeSet<String> = values.iter().map(|v| v.to_ascii_lowercase()).collect();
    set.into_iter().collect()
}

// ── Section tables ─────────────────────────────────────────────────────────

/// Required children of a section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionRequirements {
    /// Alternatives of child-section name lists; one list must be fully declared.
    pub sections: Vec<Vec<String>>,
    /// Each inner list names alternatives of which at least one setting must be declared.
    pub settings: Vec<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CatalogFile {
    settings: Vec<RawSetting>,
    section_depth: BTreeMap<String, usize>,
    #[serde(default)]
    inheritable_sections: Vec<String>,
    #[serde(default)]
    parent_sections: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    required_section_settings: BTreeMap<String, SectionRequirements>,
    #[serde(default)]
    widget_requirements_by_type: BTreeMap<String, Vec<Vec<String>>>,
    #[serde(default)]
    section_aliases: BTreeMap<String, String>,
    #[serde(default)]
    free_form_sections: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawSetting {
    display_name: String,
    #[serde(rename = "type")]
    kind: SettingType,
    #[serde(rename = "enum", default)]
    enum_values: Vec<String>,
    #[serde(default)]
    min_value: Option<Bound>,
    #[serde(default)]
    max_value: Option<Bound>,
    #[serde(default)]
    example: Option<String>,
    #[serde(default)]
    default_value: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    pattern_hint: Option<String>,
    #[serde(default)]
    excludes: Vec<String>,
    #[serde(default)]
    multi_line: bool,
    #[serde(default)]
    section: Vec<String>,
    #[serde(default)]
    widget: Vec<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "override", default)]
    overrides: Vec<RawOverride>,
}

#[derive(Deserialize)]
struct RawOverride {
    when: String,
    #[serde(flatten)]
    patch: SettingPatch,
}

/// Settings dictionary plus structural section tables.
#[derive(Debug, Clone)]
pub struct Catalog {
    settings: BTreeMap<String, DefaultSetting>,
    section_depth: BTreeMap<String, usize>,
    inheritable_sections: BTreeSet<String>,
    parent_sections: BTreeMap<String, Vec<String>>,
    required: BTreeMap<String, SectionRequirements>,
    widget_requirements: BTreeMap<String, Vec<Vec<String>>>,
    section_aliases: BTreeMap<String, String>,
    free_form_sections: BTreeSet<String>,
}

impl Catalog {
    /// Load the catalog embedded at compile time.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_jsonc(BUILTIN_CATALOG)
    }

    /// Load a catalog from JSONC text.
    pub fn from_jsonc(source: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(&chartcfg_comments::strip_jsonc(source))?;
        Self::from_file(file)
    }

    fn from_file(file: CatalogFile) -> Result<Self, CatalogError> {
        let section_depth: BTreeMap<String, usize> = file
            .section_depth
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        let known = |map: &'static str, name: &str| -> Result<String, CatalogError> {
            let name = name.to_ascii_lowercase();
            if section_depth.contains_key(&name) {
                Ok(name)
            } else {
                Err(CatalogError::UnknownSection { map, section: name })
            }
        };

        let mut settings = BTreeMap::new();
        for raw in file.settings {
            let setting = build_setting(raw, &known)?;
            if settings.contains_key(&setting.name) {
                return Err(CatalogError::InvalidSetting {
                    setting: setting.display_name,
                    reason: "declared more than once".into(),
                });
            }
            settings.insert(setting.name.clone(), setting);
        }

        let inheritable_sections = file
            .inheritable_sections
            .iter()
            .map(|s| known("inheritableSections", s))
            .collect::<Result<_, _>>()?;
        let mut parent_sections = BTreeMap::new();
        for (child, parents) in file.parent_sections {
            let child = known("parentSections", &child)?;
            let parents = parents
                .iter()
                .map(|p| known("parentSections", p))
                .collect::<Result<_, _>>()?;
            parent_sections.insert(child, parents);
        }
        let mut required = BTreeMap::new();
        for (section, reqs) in file.required_section_settings {
            let section = known("requiredSectionSettings", &section)?;
            let sections = reqs
                .sections
                .iter()
                .map(|opt| {
                    opt.iter()
                        .map(|s| known("requiredSectionSettings", s))
                        .collect::<Result<Vec<_>, _>>()
                })
                .collect::<Result<_, _>>()?;
            let settings = reqs
                .settings
                .iter()
                .map(|alts| alts.iter().map(|s| s.to_ascii_lowercase()).collect())
                .collect();
            required.insert(section, SectionRequirements { sections, settings });
        }
        let mut widget_requirements = BTreeMap::new();
        for (widget_type, options) in file.widget_requirements_by_type {
            let options = options
                .iter()
                .map(|opt| {
                    opt.iter()
                        .map(|s| known("widgetRequirementsByType", s))
                        .collect::<Result<Vec<_>, _>>()
                })
                .collect::<Result<_, _>>()?;
            widget_requirements.insert(widget_type.to_ascii_lowercase(), options);
        }
        let mut section_aliases = BTreeMap::new();
        for (alias, canonical) in file.section_aliases {
            let canonical = known("sectionAliases", &canonical)?;
            section_aliases.insert(alias.to_ascii_lowercase(), canonical);
        }
        let free_form_sections = file
            .free_form_sections
            .iter()
            .map(|s| known("freeFormSections", s))
            .collect::<Result<_, _>>()?;

        let catalog = Self {
            settings,
            section_depth,
            inheritable_sections,
            parent_sections,
            required,
            widget_requirements,
            section_aliases,
            free_form_sections,
        };
        tracing::debug!(
            settings = catalog.settings.len(),
            sections = catalog.section_depth.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Look up a setting by any spelling of its name.
    pub fn lookup(&self, name: &str) -> Option<&DefaultSetting> {
        self.settings.get(&normalize_name(name))
    }

    /// Closest known setting name, for "did you mean" hints.
    pub fn suggest(&self, name: &str) -> Option<&str> {
        let wanted = normalize_name(name);
        if wanted.is_empty() {
            return None;
        }
        self.settings
            .values()
            .map(|s| (strsim::levenshtein(&wanted, &s.name), s))
            .filter(|(d, _)| *d <= MAX_SUGGESTION_DISTANCE)
            .min_by_key(|(d, _)| *d)
            .map(|(_, s)| s.display_name.as_str())
    }

    /// All settings in normalized-name order.
    pub fn settings(&self) -> impl Iterator<Item = &DefaultSetting> {
        self.settings.values()
    }

    /// Structural depth of a section.
    pub fn section_depth(&self, section: &str) -> Option<usize> {
        self.section_depth.get(section).copied()
    }

    /// Known sections at `depth`, in name order.
    pub fn sections_at_depth(&self, depth: usize) -> Vec<&str> {
        self.section_depth
            .iter()
            .filter(|(_, d)| **d == depth)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Canonical name for a deprecated section alias.
    pub fn section_alias(&self, section: &str) -> Option<&str> {
        self.section_aliases.get(section).map(String::as_str)
    }

    /// Whether a section may be re-declared at any level.
    pub fn is_inheritable(&self, section: &str) -> bool {
        self.inheritable_sections.contains(section)
    }

    /// Whether settings in a section are user data.
    pub fn is_free_form(&self, section: &str) -> bool {
        self.free_form_sections.contains(section)
    }

    /// Sections that may directly enclose `section`.
    pub fn parent_sections(&self, section: &str) -> &[String] {
        self.parent_sections
            .get(section)
            .map_or(&[], Vec::as_slice)
    }

    /// Alternatives of required child sections.
    pub fn required_sections(&self, section: &str) -> &[Vec<String>] {
        self.required
            .get(section)
            .map_or(&[], |r| r.sections.as_slice())
    }

    /// Required settings of a section, as lists of alternatives.
    pub fn required_settings(&self, section: &str) -> &[Vec<String>] {
        self.required
            .get(section)
            .map_or(&[], |r| r.settings.as_slice())
    }

    /// Child-section requirements selected by a widget `type` value.
    pub fn widget_requirements(&self, widget_type: &str) -> Option<&[Vec<String>]> {
        self.widget_requirements
            .get(&widget_type.to_ascii_lowercase())
            .map(Vec::as_slice)
    }
}

fn build_setting(
    raw: RawSetting,
    known: &impl Fn(&'static str, &str) -> Result<String, CatalogError>,
) -> Result<DefaultSetting, CatalogError> {
    let name = normalize_name(&raw.display_name);
    if name.is_empty() {
        return Err(CatalogError::InvalidSetting {
            setting: raw.display_name,
            reason: "name has no letters".into(),
        });
    }
    if let (Some(min), Some(max)) = (raw.min_value, raw.max_value)
        && min.value > max.value
    {
        return Err(CatalogError::InvalidSetting {
            setting: raw.display_name,
            reason: format!("minValue {} exceeds maxValue {}", min.value, max.value),
        });
    }
    let pattern = match (raw.pattern, raw.pattern_hint) {
        (None, None) => None,
        (Some(source), Some(hint)) => {
            let regex = Regex::new(&format!("^(?:{source})$")).map_err(|e| {
                CatalogError::InvalidSetting {
                    setting: raw.display_name.clone(),
                    reason: format!("invalid pattern `{source}`: {e}"),
                }
            })?;
            Some(ValuePattern { regex, hint })
        }
        _ => {
            return Err(CatalogError::InvalidSetting {
                setting: raw.display_name,
                reason: "pattern and patternHint must be given together".into(),
            });
        }
    };
    let sections = raw
        .section
        .iter()
        .map(|s| known("settings", s))
        .collect::<Result<_, _>>()?;
    let mut overrides = Vec::with_capacity(raw.overrides.len());
    for ov in raw.overrides {
        let expr = ScopeExpr::parse(&ov.when).map_err(|reason| {
            CatalogError::InvalidScopeExpression {
                setting: raw.display_name.clone(),
                expression: ov.when.clone(),
                reason,
            }
        })?;
        overrides.push(ScopeOverride {
            source: ov.when,
            expr,
            patch: ov.patch,
        });
    }
    Ok(DefaultSetting {
        name,
        kind: raw.kind,
        enum_values: normalize_enum(&raw.enum_values),
        min_value: raw.min_value,
        max_value: raw.max_value,
        example: raw.example,
        default_value: raw.default_value,
        pattern,
        excludes: raw.excludes.iter().map(|e| normalize_name(e)).collect(),
        multi_line: raw.multi_line,
        sections,
        widgets: raw.widget.iter().map(|w| w.to_ascii_lowercase()).collect(),
        description: raw.description,
        overrides,
        display_name: raw.display_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"{
      // minimal catalog
      "sectionDepth": { "configuration": 0, "group": 1, "widget": 2, "series": 3, "tags": 4 },
      "inheritableSections": ["tags"],
      "sectionAliases": { "tag": "tags" },
      "settings": [
        { "displayName": "mode", "type": "enum", "enum": ["Default"],
          "override": [
            { "when": "type == 'chart'", "enum": ["stack", "default", "column"] },
            { "when": "type == 'text'", "enum": [] }
          ] },
        { "displayName": "arrow-length", "type": "number", "minValue": 0,
          "maxValue": { "value": 1, "excluded": true }, "section": ["widget"] },
        { "displayName": "entity", "type": "string", "section": ["series"] }
      ]
    }"#;

    #[test]
    fn normalizes_names() {
        assert_eq!(normalize_name("Start-Time"), "starttime");
        assert_eq!(normalize_name("forecast-ssa-group-auto-count"), "forecastssagroupautocount");
    }

    #[test]
    fn loads_small_catalog() {
        let cat = Catalog::from_jsonc(SMALL).unwrap();
        let arrow = cat.lookup("ARROW_LENGTH").unwrap();
        assert_eq!(arrow.display_name, "arrow-length");
        assert_eq!(arrow.min_value, Some(Bound::inclusive(0.0)));
        assert_eq!(arrow.max_value, Some(Bound::exclusive(1.0)));
        assert_eq!(cat.section_alias("tag"), Some("tags"));
        assert_eq!(cat.sections_at_depth(1), vec!["group"]);
        assert!(cat.is_inheritable("tags"));
    }

    #[test]
    fn overrides_apply_in_order() {
        let cat = Catalog::from_jsonc(SMALL).unwrap();
        let mode = cat.lookup("mode").unwrap();
        assert_eq!(mode.enum_values, vec!["default"]);
        let chart = mode.resolve(&Scope::new(Some("chart"), None));
        assert_eq!(chart.enum_values, vec!["column", "default", "stack"]);
        let text = mode.resolve(&Scope::new(Some("text"), None));
        assert!(text.enum_values.is_empty());
    }

    #[test]
    fn section_inheritance_allows_shallower_sections() {
        let cat = Catalog::from_jsonc(SMALL).unwrap();
        let entity = cat.lookup("entity").unwrap();
        assert!(entity.allowed_in("series", &cat));
        assert!(entity.allowed_in("widget", &cat));
        assert!(!entity.allowed_in("tags", &cat));
    }

    #[test]
    fn suggests_close_names() {
        let cat = Catalog::from_jsonc(SMALL).unwrap();
        assert_eq!(cat.suggest("entiti"), Some("entity"));
        assert_eq!(cat.suggest("zzzzzzzzzz"), None);
        // at most three edits away
        assert_eq!(cat.suggest("entityabc"), Some("entity"));
        assert_eq!(cat.suggest("entityabcd"), None);
        assert_eq!(cat.suggest("-"), None);
    }

    #[test]
    fn rejects_unknown_type() {
        let src = r#"{ "sectionDepth": {}, "settings": [ { "displayName": "x", "type": "float" } ] }"#;
        assert!(matches!(Catalog::from_jsonc(src), Err(CatalogError::InvalidJson(_))));
    }

    #[test]
    fn rejects_bad_override_expression() {
        let src = r#"{ "sectionDepth": {}, "settings": [
            { "displayName": "x", "type": "string", "override": [ { "when": "type = 'a'" } ] } ] }"#;
        let err = Catalog::from_jsonc(src).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidScopeExpression { .. }), "{err}");
    }

    #[test]
    fn rejects_unknown_section_reference() {
        let src = r#"{ "sectionDepth": { "widget": 2 }, "inheritableSections": ["tags"], "settings": [] }"#;
        let err = Catalog::from_jsonc(src).unwrap_err();
        assert_eq!(err.to_string(), "`inheritableSections` references unknown section `tags`");
    }

    #[test]
    fn rejects_duplicate_setting() {
        let src = r#"{ "sectionDepth": {}, "settings": [
            { "displayName": "start-time", "type": "date" },
            { "displayName": "starttime", "type": "date" } ] }"#;
        assert!(matches!(
            Catalog::from_jsonc(src),
            Err(CatalogError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn patterns_match_the_whole_value() {
        let src = r#"{ "sectionDepth": {}, "settings": [
            { "displayName": "alias", "type": "string", "pattern": "[a-z]+\\d*", "patternHint": "a word" } ] }"#;
        let cat = Catalog::from_jsonc(src).unwrap();
        let pattern = cat.lookup("alias").unwrap().pattern.as_ref().unwrap();
        assert_eq!(pattern.hint, "a word");
        assert!(pattern.is_match("s1"));
        assert!(!pattern.is_match("s1 s2"));
        assert!(!pattern.is_match("1s"));
    }

    #[test]
    fn rejects_invalid_pattern() {
        let src = r#"{ "sectionDepth": {}, "settings": [
            { "displayName": "alias", "type": "string", "pattern": "[a-z", "patternHint": "a word" } ] }"#;
        let err = Catalog::from_jsonc(src).unwrap_err();
        assert!(err.to_string().starts_with("setting `alias`: invalid pattern `[a-z`"), "{err}");
    }

    #[test]
    fn pattern_needs_a_hint() {
        let src = r#"{ "sectionDepth": {}, "settings": [
            { "displayName": "alias", "type": "string", "pattern": "[a-z]+" } ] }"#;
        let err = Catalog::from_jsonc(src).unwrap_err();
        assert_eq!(err.to_string(), "setting `alias`: pattern and patternHint must be given together");
    }
}
