use super::{Condition, Required, Requirement, SectionQuery};
use crate::grammar::diag::Diagnostic;

const COLUMN_CHART: &[Condition] = &[
    Condition {
        setting: "type",
        values: &["chart"],
    },
    Condition {
        setting: "mode",
        values: &["column", "column-stack"],
    },
];

const WIDGET_RULES: &[Requirement] = &[
    Requirement {
        dependent: "centralize-columns",
        conditions: COLUMN_CHART,
        required: Required::None,
    },
    Requirement {
        dependent: "centralize-ticks",
        conditions: COLUMN_CHART,
        required: Required::None,
    },
];

pub(super) fn check(section: &impl SectionQuery) -> Vec<Diagnostic> {
    WIDGET_RULES.iter().filter_map(|r| r.check(section)).collect()
}
