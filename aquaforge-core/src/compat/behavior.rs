use super::{Issue, IssueCategory, RuleContext};
use crate::{constants, severity::Severity};
use aquaforge_schemas::species::Category;

/// Two or more male bettas anywhere in the plan will fight.
pub fn male_betta_limit(ctx: &RuleContext<'_>) -> Vec<Issue> {
    let males = ctx.quantity_tagged("betta_male");
    if males < 2 {
        return Vec::new();
    }
    let subjects = ctx
        .combined
        .iter()
        .filter(|m| m.record.has_tag("betta_male"))
        .map(|m| m.id());
    vec![Issue::new(
        IssueCategory::Aggression,
        Severity::Bad,
        "male_betta_limit",
        format!(
            "Male bettas must be housed individually; {} males planned will fight",
            males
        ),
    )
    .about(subjects)
    .fatal()]
}

pub fn female_betta_sorority(ctx: &RuleContext<'_>) -> Vec<Issue> {
    let females = ctx.quantity_tagged("betta_female");
    let message = if (2..constants::SORORITY_MIN).contains(&females) {
        format!(
            concat!(
                "Female betta groups of 2-4 are unstable ({} planned); ",
                "keep a single female or {}+ in at least {} gallons"
            ),
            females,
            constants::SORORITY_MIN,
            constants::SORORITY_MIN_GALLONS
        )
    } else if females >= constants::SORORITY_MIN
        && ctx.water_gallons < constants::SORORITY_MIN_GALLONS
    {
        format!(
            "A sorority of {} female bettas needs at least {} gallons",
            females,
            constants::SORORITY_MIN_GALLONS
        )
    } else {
        return Vec::new();
    };
    vec![Issue::new(IssueCategory::Aggression, Severity::Warn, "female_betta_sorority", message)
        .about(["betta_female"])]
}

/// Fin-nippers already stocked alongside a betta. Candidate pairings are
/// reported by the pairwise rule instead.
pub fn stocked_fin_nippers_with_betta(ctx: &RuleContext<'_>) -> Vec<Issue> {
    let has_betta = ctx.incumbents.iter().any(|m| m.record.has_tag("betta"));
    if !has_betta {
        return Vec::new();
    }
    ctx.incumbents
        .iter()
        .filter(|m| m.record.has_tag("fin_nipper"))
        .map(|nipper| {
            Issue::new(
                IssueCategory::Aggression,
                Severity::Bad,
                "betta_fin_nippers",
                format!("{} will nip betta fins", nipper.name()),
            )
            .about([nipper.id()])
        })
        .collect()
}

/// Fish that are not invert-safe and whose mouths fit the invertebrates present.
pub fn invert_safety(ctx: &RuleContext<'_>) -> Vec<Issue> {
    let mut issues = Vec::new();
    for predator in ctx.combined.iter().filter(|m| !m.record.invert_safe) {
        let Some(mouth) = predator.record.mouth_size_in else {
            continue;
        };
        for prey in &ctx.combined {
            let threshold = match prey.record.category {
                Category::Shrimp => constants::SHRIMP_MOUTH_THRESHOLD_IN,
                Category::Snail => constants::SNAIL_MOUTH_THRESHOLD_IN,
                Category::Fish => continue,
            };
            if prey.id() == predator.id() || mouth < threshold {
                continue;
            }
            issues.push(
                Issue::new(
                    IssueCategory::Aggression,
                    Severity::Bad,
                    "invert_safety",
                    format!(
                        "{} is not invert-safe and can eat {} (mouth {:.2} in)",
                        predator.name(),
                        prey.name(),
                        mouth
                    ),
                )
                .about([predator.id(), prey.id()])
                .blocking_for_beginners(),
            );
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::test_support::Fixture;
    use aquaforge_schemas::tank::TankContext;

    #[test]
    fn test_two_male_bettas_is_fatal() {
        let fixture = Fixture::new(&[("betta_male", 2)], None, TankContext::new(40.0));
        let issues = male_betta_limit(&fixture.context());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Bad);
        assert!(issues[0].fatal);

        let single = Fixture::new(&[("betta_male", 1)], None, TankContext::new(40.0));
        assert!(male_betta_limit(&single.context()).is_empty());

        let via_candidate =
            Fixture::new(&[("betta_male", 1)], Some(("betta_male", 1)), TankContext::new(40.0));
        assert_eq!(male_betta_limit(&via_candidate.context()).len(), 1);
    }

    #[test]
    fn test_sorority_bands() {
        let unstable = Fixture::new(&[("betta_female", 3)], None, TankContext::new(29.0));
        assert_eq!(female_betta_sorority(&unstable.context()).len(), 1);

        let cramped = Fixture::new(&[("betta_female", 5)], None, TankContext::new(10.0));
        let issues = female_betta_sorority(&cramped.context());
        assert!(issues[0].message.contains("at least 20 gallons"));

        let stable = Fixture::new(&[("betta_female", 5)], None, TankContext::new(20.0));
        assert!(female_betta_sorority(&stable.context()).is_empty());

        let solo = Fixture::new(&[("betta_female", 1)], None, TankContext::new(5.0));
        assert!(female_betta_sorority(&solo.context()).is_empty());
    }

    #[test]
    fn test_stocked_fin_nippers_with_betta() {
        let stock = [("betta_female", 1), ("zebra", 6)];
        let fixture = Fixture::new(&stock, None, TankContext::new(29.0));
        let issues = stocked_fin_nippers_with_betta(&fixture.context());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].subjects, vec!["zebra".to_string()]);
    }

    #[test]
    fn test_invert_safety_flags_large_mouths_only() {
        let fixture = Fixture::new(
            &[("neocaridina", 10), ("nerite", 2), ("chili", 8)],
            Some(("betta_male", 1)),
            TankContext::new(10.0),
        );
        let issues = invert_safety(&fixture.context());
        // Betta (0.3 in) reaches shrimp but not snails; chili rasboras are invert-safe.
        assert_eq!(issues.len(), 1);
        assert!(issues[0].beginner_block);
        assert_eq!(issues[0].subjects, vec!["betta_male".to_string(), "neocaridina".to_string()]);

        let gourami = Fixture::new(&[("nerite", 2)], Some(("pgourami", 2)), TankContext::new(40.0));
        assert_eq!(invert_safety(&gourami.context()).len(), 1);
    }
}
