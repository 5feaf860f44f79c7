//! Handling of `name = value` lines.

use super::{Validator, value_check};
use crate::grammar::diag::{Diagnostic, Range, codes};
use crate::grammar::lexer::SettingLine;
use crate::grammar::tables::{Scope, ScopeKey};
use crate::grammar::text_range::TextRange;
use crate::setting::Setting;
use regex::Regex;
use std::sync::LazyLock;

/// `{name}` in a URL, but not `${expr}` / `@{expr}`.
static URL_PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^$@])\{\w+\}").expect("url placeholder regex is valid")
});

static ALIAS_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"value\(\s*['"]([^'"]+)['"]\s*\)"#).expect("alias reference regex is valid")
});

impl Validator<'_> {
    pub(super) fn handle_setting(&mut self, line: &SettingLine<'_>) {
        let catalog = self.catalog;
        let range = line.name_range;
        let Some(section) = self.current.as_ref() else {
            self.issues.push(
                Diagnostic::for_code(
                    codes::SETTING_OUTSIDE_SECTION,
                    format!("{} must be declared inside a section.", line.name),
                    range,
                )
                .with_context(ctx!("setting" => line.name)),
            );
            return;
        };
        let section_name = section.name.clone();

        if catalog.is_free_form(&section_name) {
            if !line.quoted
                && section_name != "placeholders"
                && catalog.lookup(line.name).is_some()
            {
                self.issues.push(
                    Diagnostic::for_code(
                        codes::SETTING_SENT_AS_TAG,
                        format!(
                            "{} is interpreted as a tag and is sent to the server. Move the setting outside of the [{section_name}] section or enclose it in double quotes.",
                            line.name
                        ),
                        range,
                    )
                    .with_context(ctx!("setting" => line.name, "section" => section_name.as_str())),
                );
            }
            return;
        }

        let Some(default) = catalog.lookup(line.name) else {
            let suggestion = catalog.suggest(line.name);
            let mut message = format!("{} is unknown.", line.name);
            if let Some(s) = suggestion {
                message.push_str(&format!(" Did you mean {s}?"));
            }
            let mut context = ctx!("setting" => line.name);
            if let Some(s) = suggestion {
                context.insert("suggestion".into(), s.into());
            }
            self.issues.push(
                Diagnostic::for_code(codes::UNKNOWN_SETTING, message, range).with_context(context),
            );
            return;
        };

        if !default.allowed_in(&section_name, catalog) {
            self.issues.push(
                Diagnostic::for_code(
                    codes::SETTING_NOT_ALLOWED,
                    format!(
                        "{} setting is not allowed in [{section_name}] section.",
                        default.display_name
                    ),
                    range,
                )
                .with_context(
                    ctx!("setting" => default.display_name.as_str(), "section" => section_name.as_str()),
                ),
            );
            return;
        }

        let scope = self.line_scope();
        let setting = Setting::from_default(default, line.value, TextRange::new(line.name, range), &scope);
        if let Some(widget_type) = scope.widget_type.as_deref()
            && !setting.spec.applies_to_widget(widget_type)
        {
            let conditions = format!("type is one of {}", setting.spec.widgets.join(", "));
            self.issues.push(
                Diagnostic::for_code(
                    codes::INEFFECTIVE_SETTING,
                    format!(
                        "{} setting is applied only if {conditions}.",
                        setting.display_name()
                    ),
                    range,
                )
                .with_context(ctx!("setting" => setting.display_name(), "conditions" => conditions)),
            );
        }

        if self.merge_repeated(&setting, line.value, range) {
            return;
        }
        if let Some(d) = setting.check_type() {
            self.issues.push(d);
        }
        self.check_exclusions(&setting);
        self.track_side_effects(&setting, line);
        if let Some(current) = self.current.as_mut() {
            current.settings.push(setting);
        }
    }

    /// Scope visible at the current line: the current section's `type` and
    /// `mode`, then those of the open ancestors.
    fn line_scope(&self) -> Scope {
        let mut scope = Scope::default();
        for key in [ScopeKey::Type, ScopeKey::Mode] {
            let name = key.setting_name();
            let local = self
                .current
                .as_ref()
                .and_then(|c| c.settings.iter().find(|s| s.name() == name));
            if let Some(s) = local.or_else(|| self.stack.current_setting(name, true)) {
                scope.set(key, &s.value);
            }
        }
        scope
    }

    /// Handle a repeated declaration in the same section. Returns `true`
    /// when `setting` was merged into an earlier one.
    fn merge_repeated(&mut self, setting: &Setting, value: &str, range: Range) -> bool {
        let Some(current) = self.current.as_mut() else {
            return false;
        };
        let Some(existing) = current
            .settings
            .iter_mut()
            .find(|s| s.name() == setting.name())
        else {
            return false;
        };
        if existing.spec.multi_line {
            if let Some(d) = value_check::check_value(&existing.spec, value, range) {
                self.issues.push(d);
            }
            existing.values.push(value.to_string());
            return true;
        }
        self.issues.push(
            Diagnostic::for_code(
                codes::DUPLICATE_SETTING,
                format!("{} is already defined", setting.display_name()),
                range,
            )
            .with_context(ctx!("setting" => setting.display_name())),
        );
        if let Some(d) = setting.check_type() {
            self.issues.push(d);
        }
        // last declaration wins
        *existing = setting.clone();
        true
    }

    fn check_exclusions(&mut self, setting: &Setting) {
        let Some(current) = self.current.as_ref() else {
            return;
        };
        for other in &current.settings {
            if setting.spec.excludes.iter().any(|e| e == other.name())
                || other.spec.excludes.iter().any(|e| e == setting.name())
            {
                self.issues.push(
                    Diagnostic::for_code(
                        codes::EXCLUSIVE_SETTINGS,
                        format!(
                            "{} can not be specified simultaneously with {}",
                            setting.display_name(),
                            other.display_name()
                        ),
                        setting.range(),
                    )
                    .with_context(ctx!(
                        "setting" => setting.display_name(),
                        "excluded" => other.display_name(),
                    )),
                );
            }
        }
    }

    /// Settings that change section requirements or declare names.
    fn track_side_effects(&mut self, setting: &Setting, line: &SettingLine<'_>) {
        let Some(current) = self.current.as_ref() else {
            return;
        };
        let pushed = current.pushed && current.name == "widget";
        match setting.name() {
            "type" if pushed => {
                if let Some(options) = self.catalog.widget_requirements(&setting.value) {
                    self.stack.set_section_requirements("widget", options);
                }
            }
            "url" if pushed => {
                if URL_PLACEHOLDER_RE.is_match(&setting.value) {
                    self.stack.require_sections("widget", &["placeholders"]);
                }
            }
            "alias" => {
                self.aliases.insert(setting.value.trim().to_string());
            }
            "value" => {
                let line_number = setting.range().start.line;
                for caps in ALIAS_REF_RE.captures_iter(line.value) {
                    if let Some(m) = caps.get(1) {
                        let start = line.value_column + m.start();
                        self.alias_refs.push((
                            m.as_str().to_string(),
                            Range::on_line(line_number, start, line.value_column + m.end()),
                        ));
                    }
                }
            }
            _ => {}
        }
    }
}
