use super::{Condition, Required, Requirement, SectionQuery};
use crate::grammar::diag::Diagnostic;

const COLUMN_MODES: &[Condition] = &[Condition {
    setting: "mode",
    values: &["column", "column-stack"],
}];

const SERIES_RULES: &[Requirement] = &[
    Requirement {
        dependent: "alert-style",
        conditions: &[],
        required: Required::Setting("alert-expression"),
    },
    Requirement {
        dependent: "table",
        conditions: &[],
        required: Required::Setting("attribute"),
    },
    Requirement {
        dependent: "attribute",
        conditions: &[],
        required: Required::Setting("table"),
    },
    Requirement {
        dependent: "forecast-style",
        conditions: &[],
        required: Required::AnyOf(&["data-type", "value"]),
    },
    Requirement {
        dependent: "summarize-period",
        conditions: &[],
        required: Required::AnyOf(&["statistic", "statistics"]),
    },
    Requirement {
        dependent: "negative-style",
        conditions: COLUMN_MODES,
        required: Required::None,
    },
    Requirement {
        dependent: "current-period-style",
        conditions: COLUMN_MODES,
        required: Required::None,
    },
];

pub(super) fn check(section: &impl SectionQuery) -> Vec<Diagnostic> {
    SERIES_RULES.iter().filter_map(|r| r.check(section)).collect()
}
