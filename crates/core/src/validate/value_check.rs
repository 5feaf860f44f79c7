//! Per-value type checks.
//!
//! Values containing `${...}` or `@{...}` placeholders are resolved at
//! runtime and are never checked here.

use super::diagnostics_util::{bullet_list, trim_f64};
use crate::grammar::diag::{Diagnostic, Range, codes};
use crate::grammar::tables::{Bound, DefaultSetting, SettingType};
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use regex::Regex;
use std::sync::LazyLock;

const BOOLEANS: [&str; 10] = [
    "false", "no", "null", "none", "0", "off", "true", "yes", "on", "1",
];

const UNITS: &str = "nanosecond|millisecond|second|minute|hour|day|week|month|quarter|year";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[$@]\{[^}]*\}").expect("placeholder regex is valid"));

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?\d*\.?\d+(?:[eE][-+]?\d+)?$").expect("number regex is valid")
});

static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?\d+$").expect("integer regex is valid"));

static INTERVAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^\d+(?:\.\d+)?[ \t]+(?:{UNITS})s?$")).expect("interval regex is valid")
});

static CALENDAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(?:now|today|yesterday|tomorrow|(?:previous|current|next)_(?:minute|hour|day|week|month|quarter|year)|first_day|first_working_day|first_vacation_day|last_working_day|last_vacation_day|monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tue|wed|thu|fri|sat|sun)(?:[ \t]*[-+][ \t]*\d+(?:\.\d+)?[ \t]*\*[ \t]*(?:{UNITS}|working_day)s?)*$"
    ))
    .expect("calendar regex is valid")
});

static ISO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\d{4})-(\d{2})-(\d{2})(?:[ T](\d{2}):(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?(z|[+-]\d{2}:?\d{2})?)?$",
    )
    .expect("iso date regex is valid")
});

static PERCENTILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^percentile(?:\((\d+(?:\.\d+)?)\)|_(\d+(?:\.\d+)?))$")
        .expect("percentile regex is valid")
});

/// Check one declared value against a resolved descriptor.
pub fn check_value(spec: &DefaultSetting, value: &str, range: Range) -> Option<Diagnostic> {
    if PLACEHOLDER_RE.is_match(value) {
        return None;
    }
    let check = Check { spec, value, range };
    match spec.kind {
        SettingType::String => check.string(),
        SettingType::Number => check.number(false),
        SettingType::Integer => check.number(true),
        SettingType::Boolean => check.boolean(),
        SettingType::Enum => check.enumeration(),
        SettingType::Interval => check.interval(),
        SettingType::Date => check.date(),
        SettingType::Object => check.object(),
    }
}

/// Parse an absolute ISO date, normalized to UTC when a zone is given.
///
/// Calendar expressions return `None`.
pub fn parse_iso_date(value: &str) -> Option<NaiveDateTime> {
    let caps = ISO_RE.captures(value.trim())?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let date = NaiveDate::from_ymd_opt(caps.get(1)?.as_str().parse().ok()?, num(2)?, num(3)?)?;
    let nanos = caps.get(7).map_or(Some(0), |m| {
        format!("{:0<9}", m.as_str()).parse::<u32>().ok()
    })?;
    let local = date.and_hms_nano_opt(num(4).unwrap_or(0), num(5).unwrap_or(0), num(6).unwrap_or(0), nanos)?;
    let Some(zone) = caps.get(8) else {
        return Some(local);
    };
    let offset = parse_offset(zone.as_str())?;
    Some(offset.from_local_datetime(&local).single()?.naive_utc())
}

fn parse_offset(zone: &str) -> Option<FixedOffset> {
    if zone.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    let sign = if zone.starts_with('-') { -1 } else { 1 };
    let digits: String = zone.chars().filter(char::is_ascii_digit).collect();
    let hours: i32 = digits.get(..2)?.parse().ok()?;
    let minutes: i32 = digits.get(2..4)?.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

struct Check<'a> {
    spec: &'a DefaultSetting,
    value: &'a str,
    range: Range,
}

impl Check<'_> {
    fn name(&self) -> &str {
        &self.spec.display_name
    }

    fn example_suffix(&self) -> String {
        self.spec
            .example
            .as_deref()
            .map(|ex| format!(" For example, {ex}"))
            .unwrap_or_default()
    }

    fn invalid(&self, message: String) -> Option<Diagnostic> {
        Some(
            Diagnostic::for_code(codes::INVALID_VALUE, message, self.range).with_context(ctx!(
                "setting" => self.name(),
                "value" => self.value,
                "type" => self.spec.kind.to_string(),
            )),
        )
    }

    fn not_one_of(&self) -> Option<Diagnostic> {
        self.invalid(format!(
            "{} must be one of:{}",
            self.name(),
            bullet_list(&self.spec.enum_values)
        ))
    }

    fn string(&self) -> Option<Diagnostic> {
        if self.value.is_empty() {
            return self.invalid(format!("{} can not be empty.", self.name()));
        }
        if !self.spec.enum_values.is_empty() {
            let all_known = self.value.split(',').all(|token| {
                let token = token.trim().to_ascii_lowercase();
                self.spec.enum_values.contains(&token)
            });
            if !all_known {
                return self.not_one_of();
            }
        }
        if let Some(pattern) = &self.spec.pattern
            && !pattern.is_match(self.value.trim())
        {
            return self.invalid(format!("{} must be {}.", self.name(), pattern.hint));
        }
        None
    }

    fn number(&self, integer: bool) -> Option<Diagnostic> {
        let (text, scale) = match self.value.strip_suffix('%') {
            Some(stripped) if self.spec.name == "arrowlength" => (stripped.trim_end(), 100.0),
            _ => (self.value, 1.0),
        };
        let pattern = if integer { &*INTEGER_RE } else { &*NUMBER_RE };
        let parsed = pattern
            .is_match(text)
            .then(|| text.parse::<f64>().ok())
            .flatten();
        let Some(n) = parsed else {
            let kind = if integer { "an integer" } else { "a number" };
            return self.invalid(format!(
                "{} must be {kind}.{}",
                self.name(),
                self.example_suffix()
            ));
        };
        let min = self.spec.min_value.map(|b| b.scaled(scale));
        let max = self.spec.max_value.map(|b| b.scaled(scale));
        if above(n, min) && below(n, max) {
            return None;
        }
        self.invalid(format!(
            "{} should be {}.{}",
            self.name(),
            describe_bounds(min, max),
            self.example_suffix()
        ))
    }

    fn boolean(&self) -> Option<Diagnostic> {
        let lower = self.value.to_ascii_lowercase();
        if BOOLEANS.contains(&lower.as_str()) {
            return None;
        }
        self.invalid(format!(
            "{} must be a boolean: {}.",
            self.name(),
            BOOLEANS.join(", ")
        ))
    }

    fn enumeration(&self) -> Option<Diagnostic> {
        if self.spec.enum_values.is_empty() {
            return Some(
                Diagnostic::for_code(
                    codes::SETTING_NOT_ALLOWED,
                    format!("{} setting is not allowed here.", self.name()),
                    self.range,
                )
                .with_context(ctx!("setting" => self.name())),
            );
        }
        let lower = self.value.to_ascii_lowercase();
        if self.spec.enum_values.contains(&lower) {
            return None;
        }
        if self.spec.name.contains("statistic")
            && let Some(caps) = PERCENTILE_RE.captures(&lower)
        {
            return self.percentile(&caps);
        }
        self.not_one_of()
    }

    fn percentile(&self, caps: &regex::Captures<'_>) -> Option<Diagnostic> {
        let (arg, deprecated) = match (caps.get(1), caps.get(2)) {
            (Some(arg), _) => (arg.as_str(), false),
            (None, Some(arg)) => (arg.as_str(), true),
            (None, None) => return self.not_one_of(),
        };
        let in_range = arg.parse::<f64>().is_ok_and(|n| (0.0..=100.0).contains(&n));
        if !in_range {
            return self.invalid(format!(
                "{} percentile must be in range [0, 100]. For example, percentile(95)",
                self.name()
            ));
        }
        deprecated.then(|| {
            Diagnostic::for_code(
                codes::DEPRECATED_VALUE,
                format!("percentile_{arg} is deprecated. Use percentile({arg}) instead."),
                self.range,
            )
            .with_context(ctx!("setting" => self.name(), "value" => self.value))
        })
    }

    fn interval(&self) -> Option<Diagnostic> {
        let lower = self.value.to_ascii_lowercase();
        if lower == "all" || INTERVAL_RE.is_match(self.value) || self.spec.enum_values.contains(&lower) {
            return None;
        }
        if self.spec.name == "updateinterval" && self.value.bytes().all(|b| b.is_ascii_digit()) && !self.value.is_empty() {
            return Some(
                Diagnostic::for_code(
                    codes::DEPRECATED_VALUE,
                    format!(
                        "Specifying {} in seconds without a unit is deprecated. Use {} second instead.",
                        self.name(),
                        self.value
                    ),
                    self.range,
                )
                .with_context(ctx!("setting" => self.name(), "value" => self.value)),
            );
        }
        let alternatives = if self.spec.enum_values.is_empty() {
            String::new()
        } else {
            format!(" or one of: {}", self.spec.enum_values.join(", "))
        };
        self.invalid(format!(
            "{} must be a count and a unit, for example {}{alternatives}.",
            self.name(),
            self.spec.example.as_deref().unwrap_or("1 hour")
        ))
    }

    fn date(&self) -> Option<Diagnostic> {
        if CALENDAR_RE.is_match(self.value) || parse_iso_date(self.value).is_some() {
            return None;
        }
        self.invalid(format!(
            "{} must be a calendar expression, for example previous_day - 1 * day, or an ISO date, for example 2018-07-05 12:00:00.",
            self.name()
        ))
    }

    fn object(&self) -> Option<Diagnostic> {
        match serde_json::from_str::<serde_json::Value>(self.value) {
            Ok(_) => None,
            Err(e) => self.invalid(format!("{} must be valid JSON: {e}.", self.name())),
        }
    }
}

fn above(n: f64, min: Option<Bound>) -> bool {
    min.is_none_or(|b| if b.excluded { n > b.value } else { n >= b.value })
}

fn below(n: f64, max: Option<Bound>) -> bool {
    max.is_none_or(|b| if b.excluded { n < b.value } else { n <= b.value })
}

fn describe_bounds(min: Option<Bound>, max: Option<Bound>) -> String {
    match (min, max) {
        (Some(lo), Some(hi)) => format!(
            "in range {}{}, {}{}",
            if lo.excluded { '(' } else { '[' },
            trim_f64(lo.value),
            trim_f64(hi.value),
            if hi.excluded { ')' } else { ']' },
        ),
        (Some(lo), None) => format!(
            "greater than {}{}",
            if lo.excluded { "" } else { "or equal to " },
            trim_f64(lo.value)
        ),
        (None, Some(hi)) => format!(
            "less than {}{}",
            if hi.excluded { "" } else { "or equal to " },
            trim_f64(hi.value)
        ),
        (None, None) => "a number".to_string(),
    }
}
