//! Node-local comparisons between related setting values.
//!
//! A check runs on the node declaring either side of the relation; the
//! other side is looked up through the ancestor chain.

use super::{Condition, SectionQuery};
use crate::grammar::diag::{Diagnostic, codes};
use crate::setting::Setting;
use crate::validate::value_check::parse_iso_date;

const SEGMENTED_WIDGETS: &[Condition] = &[
    Condition {
        setting: "type",
        values: &["gauge", "calendar", "treemap"],
    },
    Condition {
        setting: "mode",
        values: &["half", "default"],
    },
];

pub(super) fn check(section: &impl SectionQuery) -> Vec<Diagnostic> {
    [
        date_order(section, "end-time", "start-time", Order::After),
        date_order(section, "forecast-horizon-end-time", "end-time", Order::After),
        date_order(
            section,
            "forecast-horizon-start-time",
            "forecast-horizon-end-time",
            Order::Before,
        ),
        ssa_groups(section),
        colors_thresholds(section),
        timespan_ignored(section),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[derive(Clone, Copy)]
enum Order {
    Before,
    After,
}

/// `anchor` must be strictly before/after `other`. Both are looked up
/// through the ancestor chain; at least one must be declared here.
/// Only absolute dates are compared.
fn date_order(
    section: &impl SectionQuery,
    anchor: &str,
    other: &str,
    order: Order,
) -> Option<Diagnostic> {
    if section.local_setting(anchor).is_none() && section.local_setting(other).is_none() {
        return None;
    }
    let declared = section.setting_from_tree(anchor)?;
    let related = section.setting_from_tree(other)?;
    let a = parse_iso_date(&declared.value)?;
    let b = parse_iso_date(&related.value)?;
    let (ok, relation) = match order {
        Order::After => (a > b, "greater"),
        Order::Before => (a < b, "less"),
    };
    if ok {
        return None;
    }
    Some(relation_error(
        declared,
        format!("{anchor} must be {relation} than {other}"),
        other,
    ))
}

/// The eigentriple limit must exceed the automatic group count; both fall
/// back to their catalog defaults.
fn ssa_groups(section: &impl SectionQuery) -> Option<Diagnostic> {
    const COUNT: &str = "forecast-ssa-group-auto-count";
    const LIMIT: &str = "forecast-ssa-decompose-eigentriple-limit";
    let anchor = section
        .local_setting(LIMIT)
        .or_else(|| section.local_setting(COUNT))?;
    let count: f64 = section.effective_value(COUNT)?.trim().parse().ok()?;
    let limit: f64 = section.effective_value(LIMIT)?.trim().parse().ok()?;
    if limit > count {
        return None;
    }
    Some(relation_error(
        anchor,
        format!("{LIMIT} must be greater than {COUNT}"),
        if anchor.name() == "forecastssagroupautocount" { LIMIT } else { COUNT },
    ))
}

fn colors_thresholds(section: &impl SectionQuery) -> Option<Diagnostic> {
    let colors = section.local_setting("colors")?;
    let thresholds = section.setting_from_tree("thresholds")?;
    if !section.match_conditions(SEGMENTED_WIDGETS) {
        return None;
    }
    let (c, t) = (colors.item_count(), thresholds.item_count());
    if c + 1 == t {
        return None;
    }
    Some(
        Diagnostic::for_code(
            codes::COLORS_THRESHOLDS_MISMATCH,
            "Number of colors (if specified) must be equal to\nnumber of thresholds minus 1.",
            colors.range(),
        )
        .with_context(ctx!("colors" => c.to_string(), "thresholds" => t.to_string())),
    )
}

fn timespan_ignored(section: &impl SectionQuery) -> Option<Diagnostic> {
    const NAMES: [&str; 3] = ["start-time", "end-time", "timespan"];
    if !NAMES.iter().any(|n| section.local_setting(n).is_some()) {
        return None;
    }
    let timespan = section.setting_from_tree("timespan")?;
    section.setting_from_tree("start-time")?;
    section.setting_from_tree("end-time")?;
    Some(
        Diagnostic::for_code(
            codes::TIMESPAN_IGNORED,
            "timespan is ignored when start-time and end-time are both specified.",
            timespan.range(),
        )
        .with_context(ctx!("setting" => timespan.display_name())),
    )
}

fn relation_error(anchor: &Setting, message: String, related: &str) -> Diagnostic {
    Diagnostic::for_code(codes::VALUE_RELATION, message, anchor.range())
        .with_context(ctx!("setting" => anchor.display_name(), "related" => related))
}
