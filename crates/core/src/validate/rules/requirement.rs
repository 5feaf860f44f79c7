use super::SectionQuery;
use crate::validate::diagnostics_util::bullet_list;
use crate::grammar::diag::{Diagnostic, codes};

/// Predicate over the effective value of one setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    /// Setting whose effective value is tested.
    pub setting: &'static str,
    /// Accepted values, compared case-insensitively.
    pub values: &'static [&'static str],
}

impl Condition {
    /// Whether `value` satisfies the condition; an absent value never does.
    pub fn holds(&self, value: Option<&str>) -> bool {
        value.is_some_and(|v| self.values.iter().any(|ok| ok.eq_ignore_ascii_case(v.trim())))
    }

    /// Human phrase: `type is chart`, `mode is one of column, column-stack`.
    pub fn describe(&self) -> String {
        match self.values {
            [one] => format!("{} is {one}", self.setting),
            many => format!("{} is one of {}", self.setting, many.join(", ")),
        }
    }
}

/// What must accompany the dependent setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Required {
    /// This setting must be declared.
    Setting(&'static str),
    /// At least one of these must be declared.
    AnyOf(&'static [&'static str]),
    /// Nothing: the dependent is only checked for having an effect.
    None,
}

/// Declarative rule tying a dependent setting to conditions and companions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    /// Setting whose presence triggers the rule.
    pub dependent: &'static str,
    /// Conditions on the effective scope.
    pub conditions: &'static [Condition],
    /// Companion requirement.
    pub required: Required,
}

impl Requirement {
    /// Evaluate the rule on one section.
    pub fn check(&self, section: &impl SectionQuery) -> Option<Diagnostic> {
        match self.required {
            Required::None => self.check_effect(section),
            Required::Setting(required) => {
                self.applies(section)?;
                if section.setting_from_tree(required).is_some() {
                    return None;
                }
                Some(
                    Diagnostic::for_code(
                        codes::REQUIRED_IF,
                        format!("{required} is required if {} is specified", self.dependent),
                        section.range(),
                    )
                    .with_context(ctx!("setting" => self.dependent, "required" => required)),
                )
            }
            Required::AnyOf(candidates) => {
                self.applies(section)?;
                if candidates.iter().any(|c| section.setting_from_tree(c).is_some()) {
                    return None;
                }
                Some(
                    Diagnostic::for_code(
                        codes::REQUIRED_IF,
                        format!(
                            "{} has effect only with one of the following:{}",
                            self.dependent,
                            bullet_list(candidates)
                        ),
                        section.range(),
                    )
                    .with_context(
                        ctx!("setting" => self.dependent, "required" => candidates.join(", ")),
                    ),
                )
            }
        }
    }

    /// `Some(())` when the dependent is visible and every condition holds.
    fn applies(&self, section: &impl SectionQuery) -> Option<()> {
        section.setting_from_tree(self.dependent)?;
        section.match_conditions(self.conditions).then_some(())
    }

    fn check_effect(&self, section: &impl SectionQuery) -> Option<Diagnostic> {
        let setting = section.local_setting(self.dependent)?;
        let failing = section.failing_conditions(self.conditions);
        if failing.is_empty() {
            return None;
        }
        let conditions = failing
            .iter()
            .map(|c| c.describe())
            .collect::<Vec<_>>()
            .join(" and ");
        Some(
            Diagnostic::for_code(
                codes::INEFFECTIVE_SETTING,
                format!(
                    "{} setting is applied only if {conditions}.",
                    setting.display_name()
                ),
                setting.range(),
            )
            .with_context(ctx!("setting" => setting.display_name(), "conditions" => conditions)),
        )
    }
}
