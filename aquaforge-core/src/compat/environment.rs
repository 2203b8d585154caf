use super::{Issue, IssueCategory, RuleContext};
use crate::severity::Severity;
use aquaforge_schemas::species::{BlackwaterNeed, Salinity};

fn positions(salinity: Salinity) -> &'static [u8] {
    match salinity {
        Salinity::Fresh => &[0],
        Salinity::BrackishLow => &[1],
        Salinity::BrackishHigh => &[2],
        Salinity::Marine => &[3],
        Salinity::Dual => &[0, 1],
    }
}

/// Steps apart on fresh ↔ brackish-low ↔ brackish-high ↔ marine.
/// `Dual` sits on both fresh and brackish-low.
pub fn salinity_steps(a: Salinity, b: Salinity) -> u8 {
    positions(a)
        .iter()
        .flat_map(|pa| positions(b).iter().map(move |pb| pa.abs_diff(*pb)))
        .min()
        .unwrap_or(0)
}

pub fn salinity(ctx: &RuleContext<'_>) -> Vec<Issue> {
    let water = ctx.water.salinity;
    if water == Salinity::Marine {
        return vec![Issue::new(
            IssueCategory::Salinity,
            Severity::Bad,
            "salinity",
            "Not compatible: marine water is not supported".to_string(),
        )
        .blocking_for_beginners()];
    }

    let mut issues: Vec<Issue> = ctx
        .combined
        .iter()
        .filter_map(|member| {
            let wanted = member.record.salinity;
            let (severity, message) = match salinity_steps(wanted, water) {
                0 => return None,
                1 => (
                    Severity::Warn,
                    format!("{} prefers {} water (tank is {})", member.name(), wanted, water),
                ),
                _ => (
                    Severity::Bad,
                    format!("{} cannot live in {} water (needs {})", member.name(), water, wanted),
                ),
            };
            let issue = Issue::new(IssueCategory::Salinity, severity, "salinity", message);
            Some(issue.about([member.id()]))
        })
        .collect();

    let fresh_only = ctx.combined.iter().any(|m| m.record.salinity == Salinity::Fresh);
    let brackish_only = ctx
        .combined
        .iter()
        .any(|m| matches!(m.record.salinity, Salinity::BrackishLow | Salinity::BrackishHigh));
    if fresh_only && brackish_only {
        issues.push(Issue::new(
            IssueCategory::Salinity,
            Severity::Warn,
            "salinity_mix",
            "Mixed fresh/brackish stock; target brackish-low or use dual-tolerant species"
                .to_string(),
        ));
    }
    issues
}

pub fn flow(ctx: &RuleContext<'_>) -> Vec<Issue> {
    let water = ctx.water.flow;
    ctx.combined
        .iter()
        .filter_map(|member| {
            let wanted = member.record.flow;
            let (severity, message) = match wanted.rank().abs_diff(water.rank()) {
                0 => return None,
                1 => (
                    Severity::Warn,
                    format!(
                        "{}: adjust flow pattern (prefers {}, tank is {})",
                        member.name(),
                        wanted,
                        water
                    ),
                ),
                _ => (
                    Severity::Bad,
                    format!(
                        "{}: flow rate unsuitable (prefers {}, tank is {})",
                        member.name(),
                        wanted,
                        water
                    ),
                ),
            };
            Some(Issue::new(IssueCategory::Flow, severity, "flow", message).about([member.id()]))
        })
        .collect()
}

pub fn blackwater(ctx: &RuleContext<'_>) -> Vec<Issue> {
    if ctx.water.blackwater {
        return Vec::new();
    }
    ctx.combined
        .iter()
        .filter_map(|member| {
            let (severity, message) = match member.record.blackwater {
                BlackwaterNeed::Requires => (
                    Severity::Bad,
                    format!("{} requires tannins / blackwater", member.name()),
                ),
                BlackwaterNeed::Prefers => (
                    Severity::Warn,
                    format!("{} prefers tannin-rich water", member.name()),
                ),
                BlackwaterNeed::Neutral => return None,
            };
            let issue = Issue::new(IssueCategory::Blackwater, severity, "blackwater", message);
            Some(issue.about([member.id()]))
        })
        .collect()
}
