//! Shared water-parameter bands. Each parameter intersects the ranges of
//! every planned species and grades how far the tank's reading falls outside.

use super::{Issue, IssueCategory, Member, RuleContext};
use crate::{constants, severity::Severity};
use aquaforge_schemas::species::{Category, SpeciesRecord, ToleranceRange};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    Temperature,
    Ph,
    Gh,
    Kh,
}

impl Parameter {
    pub const ALL: [Parameter; 4] =
        [Parameter::Temperature, Parameter::Ph, Parameter::Gh, Parameter::Kh];

    pub fn label(&self) -> &'static str {
        match self {
            Parameter::Temperature => "Temperature",
            Parameter::Ph => "pH",
            Parameter::Gh => "gH",
            Parameter::Kh => "kH",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Temperature => " °F",
            Parameter::Ph => "",
            Parameter::Gh => " dGH",
            Parameter::Kh => " dKH",
        }
    }

    pub fn range_of(&self, record: &SpeciesRecord) -> ToleranceRange<f64> {
        match self {
            Parameter::Temperature => record.temperature_f,
            Parameter::Ph => record.ph,
            Parameter::Gh => record.gh,
            Parameter::Kh => record.kh,
        }
    }
}

/// Result of intersecting every member's range for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Band {
    /// Every species tolerates `[min, max]`.
    Shared { min: f64, max: f64 },
    /// No overlap; `[min, max]` is the gap between the lowest maximum and the highest minimum.
    Conflict { min: f64, max: f64 },
}

pub fn intersect<I: IntoIterator<Item = ToleranceRange<f64>>>(ranges: I) -> Option<Band> {
    let mut lo = f64::NEG_INFINITY;
    let mut hi = f64::INFINITY;
    let mut any = false;
    for range in ranges {
        any = true;
        lo = lo.max(range.min);
        hi = hi.min(range.max);
    }
    if !any {
        return None;
    }
    if hi + constants::EPSILON >= lo {
        Some(Band::Shared { min: lo, max: hi.max(lo) })
    } else {
        Some(Band::Conflict { min: hi, max: lo })
    }
}

/// Distance outside the band that turns a warning into a bad result.
pub fn bad_margin(parameter: Parameter, members: &[Member<'_>], kh: f64) -> f64 {
    match parameter {
        Parameter::Temperature => constants::TEMPERATURE_BAD_MARGIN_F,
        Parameter::Gh => constants::GH_BAD_MARGIN,
        Parameter::Kh => constants::KH_BAD_MARGIN,
        Parameter::Ph => {
            let sensitive = members.iter().any(|m| m.record.ph_sensitive);
            let base = if sensitive {
                constants::PH_SENSITIVE_BAD_MARGIN
            } else {
                constants::PH_BAD_MARGIN
            };
            if kh >= constants::PH_BUFFERED_KH {
                base + constants::PH_BUFFERED_EXTRA_MARGIN
            } else {
                base
            }
        }
    }
}

fn reading(ctx: &RuleContext<'_>, parameter: Parameter) -> f64 {
    match parameter {
        Parameter::Temperature => ctx.water.temperature_f,
        Parameter::Ph => ctx.water.ph,
        Parameter::Gh => ctx.water.gh,
        Parameter::Kh => ctx.water.kh,
    }
}

fn grade(distance: f64, margin: f64) -> Severity {
    if distance <= constants::EPSILON {
        Severity::Ok
    } else if distance > margin + constants::EPSILON {
        Severity::Bad
    } else {
        Severity::Warn
    }
}

pub fn evaluate_parameter(ctx: &RuleContext<'_>, parameter: Parameter) -> Option<Issue> {
    let members = &ctx.combined;
    let band = intersect(members.iter().map(|m| parameter.range_of(m.record)))?;
    let value = reading(ctx, parameter);
    let margin = bad_margin(parameter, members, ctx.water.kh);
    let unit = parameter.unit();

    let outliers: Vec<&Member<'_>> = members
        .iter()
        .filter(|m| parameter.range_of(m.record).distance_to(value) > constants::EPSILON)
        .collect();

    let (severity, message) = match band {
        Band::Shared { min, max } => {
            let distance = ToleranceRange::new(min, max).distance_to(value);
            let severity = grade(distance, margin);
            (
                severity,
                format!(
                    "{} {:.1}{} is outside the shared {:.1}–{:.1}{} band",
                    parameter.label(),
                    value,
                    unit,
                    min,
                    max,
                    unit
                ),
            )
        }
        Band::Conflict { min, max } => {
            let worst = members
                .iter()
                .map(|m| parameter.range_of(m.record).distance_to(value))
                .fold(0.0, f64::max);
            let severity = grade(worst, margin).max(Severity::Warn);
            (
                severity,
                format!(
                    concat!(
                        "No shared {} range (ranges part between {:.1} and {:.1}{}); ",
                        "worst fit is {:.1}{} off"
                    ),
                    parameter.label(),
                    min,
                    max,
                    unit,
                    worst,
                    unit
                ),
            )
        }
    };

    if severity == Severity::Ok {
        return None;
    }
    Some(
        Issue::new(IssueCategory::Condition, severity, "water_conditions", message)
            .about(outliers.iter().map(|m| m.id())),
    )
}

pub fn water_conditions(ctx: &RuleContext<'_>) -> Vec<Issue> {
    Parameter::ALL
        .iter()
        .filter_map(|&parameter| evaluate_parameter(ctx, parameter))
        .collect()
}

/// Snails build shells from dissolved minerals.
pub fn shell_health(ctx: &RuleContext<'_>) -> Vec<Issue> {
    if ctx.water.gh >= constants::SNAIL_MIN_GH {
        return Vec::new();
    }
    ctx.combined
        .iter()
        .filter(|m| m.record.category == Category::Snail)
        .map(|snail| {
            Issue::new(
                IssueCategory::Condition,
                Severity::Warn,
                "shell_health",
                format!("{}: low gH risks shell health", snail.name()),
            )
            .about([snail.id()])
        })
        .collect()
}
