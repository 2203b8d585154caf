use super::{Issue, IssueCategory, Member, RuleContext};
use crate::severity::Severity;
use aquaforge_schemas::species::{GroupRule, HaremRatio};

/// Females needed for `males` under `ratio`, rounded up.
pub fn females_needed(males: u32, ratio: HaremRatio) -> u32 {
    if ratio.m == 0 {
        return 0;
    }
    let need = (u64::from(males) * u64::from(ratio.f)).div_ceil(u64::from(ratio.m));
    u32::try_from(need).unwrap_or(u32::MAX)
}

fn harem_issues(
    ctx: &RuleContext<'_>,
    member: &Member<'_>,
    min: u32,
    ratio: Option<HaremRatio>,
    female_id: Option<&str>,
) -> Vec<Issue> {
    let female_id = female_id
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}_female", member.id()));
    let males = member.quantity;
    let females = ctx.quantity_of(&female_id);
    let need = females_needed(males, ratio.unwrap_or_default());
    let mut issues = Vec::new();

    if females == 0 {
        issues.push(
            Issue::new(
                IssueCategory::Group,
                Severity::Warn,
                "harem_ratio",
                format!("Plan {} females to balance the {} harem", female_id, member.name()),
            )
            .about([member.id()]),
        );
    } else if females < need {
        issues.push(
            Issue::new(
                IssueCategory::Group,
                Severity::Bad,
                "harem_ratio",
                format!("Harem: {}♂ need ≥{}♀ (have {})", males, need, females),
            )
            .about([member.id(), female_id.as_str()]),
        );
    }

    let planned = males.saturating_add(females);
    if planned < min {
        issues.push(
            Issue::new(
                IssueCategory::Group,
                Severity::Warn,
                "group_minimum",
                format!("{} harem needs {}+ fish (planned {})", member.name(), min, planned),
            )
            .about([member.id()]),
        );
    }
    issues
}

/// Shoal, colony and harem minimums over the planned headcounts.
pub fn group_minimums(ctx: &RuleContext<'_>) -> Vec<Issue> {
    let mut issues = Vec::new();
    for member in &ctx.combined {
        let Some(group) = &member.record.group else {
            continue;
        };
        match group {
            GroupRule::Shoal { min } if member.quantity < *min => issues.push(
                Issue::new(
                    IssueCategory::Group,
                    Severity::Warn,
                    "group_minimum",
                    format!("{} needs {}+ group (planned {})", member.name(), min, member.quantity),
                )
                .about([member.id()]),
            ),
            GroupRule::Colony { min } if member.quantity < *min => issues.push(
                Issue::new(
                    IssueCategory::Group,
                    Severity::Warn,
                    "group_minimum",
                    format!(
                        "{} colony thrives at {}+ (planned {})",
                        member.name(),
                        min,
                        member.quantity
                    ),
                )
                .about([member.id()]),
            ),
            GroupRule::Harem { min, ratio, female_id } => {
                issues.extend(harem_issues(ctx, member, *min, *ratio, female_id.as_deref()))
            }
            _ => {}
        }
    }
    issues
}
