use super::{Issue, IssueCategory, RuleContext};
use crate::{constants, severity::Severity};
use aquaforge_schemas::species::{Category, SpeciesRecord};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PairVerdict {
    pub severity: Severity,
    pub reasons: Vec<String>,
}

impl PairVerdict {
    fn flag(&mut self, severity: Severity, reason: &str) {
        self.severity = self.severity.max(severity);
        self.reasons.push(reason.to_string());
    }
}

fn is_hard_conflict(a: &str, b: &str) -> bool {
    let key = if a <= b { (a, b) } else { (b, a) };
    constants::HARD_CONFLICTS.iter().any(|&pair| pair == key)
}

fn nips_fins(nipper: &SpeciesRecord, target: &SpeciesRecord) -> bool {
    nipper.has_tag("fin_nipper")
        && ["fin_sensitive", "long_fins", "betta"]
            .iter()
            .any(|tag| target.has_tag(tag))
}

fn preys_on(predator: &SpeciesRecord, prey: &SpeciesRecord) -> Option<&'static str> {
    let shrimp = prey.category == Category::Shrimp || prey.has_tag("shrimp");
    let snail = prey.category == Category::Snail || prey.has_tag("snail");
    if predator.has_tag("predator_shrimp") && shrimp {
        Some("Predation risk (shrimp)")
    } else if predator.has_tag("predator_snail") && snail {
        Some("Predation risk (snail)")
    } else {
        None
    }
}

/// Evaluates two species sharing a tank. `tank_length_in` eases friction when
/// the tank is comfortably longer than the smaller of the two minimum lengths.
pub fn evaluate_pair(
    a: &SpeciesRecord,
    b: &SpeciesRecord,
    tank_length_in: Option<f64>,
) -> PairVerdict {
    let mut verdict = PairVerdict::default();

    if is_hard_conflict(&a.id, &b.id) {
        verdict.flag(Severity::Bad, "Known conflict pairing");
    }

    let gap = (a.aggression - b.aggression).abs();
    if gap > constants::AGGRESSION_BAD_GAP {
        verdict.flag(Severity::Bad, "High aggression mismatch");
    } else if gap > constants::AGGRESSION_WARN_GAP {
        verdict.flag(Severity::Warn, "Temperament gap");
    }

    if nips_fins(a, b) || nips_fins(b, a) {
        verdict.flag(Severity::Bad, "Fin-nipping risk");
    }

    if a.has_tag("territorial") || b.has_tag("territorial") {
        verdict.flag(Severity::Warn, "Territorial overlap");
    }

    for reason in [preys_on(a, b), preys_on(b, a)].into_iter().flatten() {
        verdict.flag(Severity::Bad, reason);
    }

    if verdict.severity > Severity::Ok {
        let shorter = match (a.min_tank_length_in, b.min_tank_length_in) {
            (Some(x), Some(y)) => x.min(y),
            _ => 0.0,
        };
        let threshold = shorter * constants::LENGTH_BUFFER;
        if let Some(length) = tank_length_in {
            if threshold > 0.0 && length >= threshold {
                verdict.severity = verdict.severity.downgrade();
                verdict.reasons.push("Extra swim length eases tension".to_string());
            }
        }
    }

    verdict
}

/// Candidate against each stocked species.
pub fn candidate_pairs(ctx: &RuleContext<'_>) -> Vec<Issue> {
    let Some(candidate) = ctx.candidate else {
        return Vec::new();
    };
    ctx.incumbents
        .iter()
        .filter_map(|incumbent| {
            let verdict = evaluate_pair(candidate.record, incumbent.record, ctx.tank_length_in);
            if verdict.severity == Severity::Ok {
                return None;
            }
            Some(
                Issue::new(
                    IssueCategory::Aggression,
                    verdict.severity,
                    "pairwise",
                    format!(
                        "{} + {}: {}",
                        candidate.name(),
                        incumbent.name(),
                        verdict.reasons.join("; ")
                    ),
                )
                .about([candidate.id(), incumbent.id()]),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SpeciesCatalog;
    use crate::compat::test_support::Fixture;
    use aquaforge_schemas::tank::TankContext;

    fn species(id: &str) -> &'static SpeciesRecord {
        SpeciesCatalog::builtin().get(id).unwrap()
    }

    #[test]
    fn test_hard_conflict_is_symmetric() {
        let forward = evaluate_pair(species("tiger_barb"), species("betta_male"), None);
        let backward = evaluate_pair(species("betta_male"), species("tiger_barb"), None);
        assert_eq!(forward.severity, Severity::Bad);
        assert_eq!(backward.severity, Severity::Bad);
        assert!(forward.reasons.contains(&"Known conflict pairing".to_string()));
    }

    #[test]
    fn test_aggression_gap_thresholds() {
        // 65 vs 10
        let wide = evaluate_pair(species("betta_male"), species("neon"), None);
        assert!(wide.reasons.contains(&"High aggression mismatch".to_string()));
        // 35 vs 10
        let narrow = evaluate_pair(species("zebra"), species("neon"), None);
        assert!(narrow.reasons.contains(&"Temperament gap".to_string()));
        // 10 vs 10
        let calm = evaluate_pair(species("cardinal"), species("neon"), None);
        assert_eq!(calm.severity, Severity::Ok);
        assert!(calm.reasons.is_empty());
    }

    #[test]
    fn test_fin_nipping_either_direction() {
        for betta in ["betta_male", "betta_female"] {
            let verdict = evaluate_pair(species(betta), species("tiger_barb"), None);
            assert_eq!(verdict.severity, Severity::Bad, "{}", betta);
            assert!(verdict.reasons.contains(&"Fin-nipping risk".to_string()));
        }
    }

    #[test]
    fn test_shrimp_predation() {
        let verdict = evaluate_pair(species("neocaridina"), species("betta_male"), None);
        assert_eq!(verdict.severity, Severity::Bad);
        assert!(verdict.reasons.contains(&"Predation risk (shrimp)".to_string()));
    }

    #[test]
    fn test_long_tank_downgrades_one_level() {
        // Dwarf gourami + cardinal: territorial + temperament gap (45 vs 10 = 35) → warn.
        let cramped = evaluate_pair(species("dgourami"), species("cardinal"), Some(30.0));
        assert_eq!(cramped.severity, Severity::Warn);
        // min(24, 24) × 1.5 = 36
        let roomy = evaluate_pair(species("dgourami"), species("cardinal"), Some(36.0));
        assert_eq!(roomy.severity, Severity::Ok);
        assert_eq!(
            roomy.reasons.last().map(String::as_str),
            Some("Extra swim length eases tension")
        );

        let bad_but_roomy =
            evaluate_pair(species("betta_male"), species("neocaridina"), Some(48.0));
        assert_eq!(bad_but_roomy.severity, Severity::Warn);
    }

    #[test]
    fn test_candidate_pairs_only_compare_candidate() {
        let fixture = Fixture::new(
            &[("betta_male", 1), ("tiger_barb", 6)],
            Some(("cardinal", 8)),
            TankContext::new(40.0),
        );
        let issues = candidate_pairs(&fixture.context());
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.subjects[0] == "cardinal"));

        let stock = [("betta_male", 1), ("tiger_barb", 6)];
        let no_candidate = Fixture::new(&stock, None, TankContext::new(40.0));
        assert!(candidate_pairs(&no_candidate.context()).is_empty());
    }
}
