use aquaforge_core::{planner::StockingEngine, severity::Severity};
use aquaforge_schemas::{
    plan::{PlanOverrides, StockingPlan},
    stock::StockEntry,
};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

/// A catalog species that could be added to the plan without being blocked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub species_id: String,
    pub common_name: String,
    pub quantity: i32,
    pub severity: Severity,
    pub percent: f64,
    pub headline: String,
}

/// Tries every catalog species not already stocked as the plan's candidate,
/// at its group minimum (or one), and ranks the unblocked ones by severity
/// and then by the resulting bioload percent.
pub fn suggest_candidates(
    engine: &StockingEngine<'_>,
    base: &StockingPlan,
    limit: usize,
) -> Vec<Suggestion> {
    println!("\n--- [Suggest] Ranking Candidates ---");
    let mut suggestions: Vec<Suggestion> = engine
        .catalog()
        .species()
        .iter()
        .filter(|record| !base.stock.iter().any(|entry| entry.species_id == record.id))
        .filter_map(|record| {
            let quantity = record.group.as_ref().map_or(1, |g| g.min().max(1)) as i32;
            let overrides = PlanOverrides {
                candidate: Some(StockEntry::new(&record.id, quantity)),
                ..PlanOverrides::default()
            };
            let state = engine.what_if(base, &overrides);
            if state.is_blocked() {
                debug!(species = %record.id, "candidate blocked");
                return None;
            }
            Some(Suggestion {
                species_id: record.id.clone(),
                common_name: record.common_name.clone(),
                quantity,
                severity: state.status.severity,
                percent: state.percent(),
                headline: state.status.headline,
            })
        })
        .collect();

    suggestions.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then(a.percent.partial_cmp(&b.percent).unwrap_or(Ordering::Equal))
            .then_with(|| a.species_id.cmp(&b.species_id))
    });
    suggestions.truncate(limit);

    for suggestion in &suggestions {
        println!(
            "  - {:<24} x{:<3} | {:>7.2}% | {:<4} | {}",
            suggestion.common_name,
            suggestion.quantity,
            suggestion.percent,
            suggestion.severity.as_str(),
            suggestion.headline
        );
    }
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquaforge_core::planner::PlanBuilder;
    use aquaforge_schemas::{tank::TankContext, water::WaterProfile};

    fn betta_tank() -> StockingPlan {
        PlanBuilder::new()
            .with_tank(TankContext::new(20.0))
            .with_water(WaterProfile::default())
            .add_stock(StockEntry::new("betta_male", 1))
            .build()
            .unwrap()
    }

    #[test]
    fn test_blocked_and_stocked_species_are_skipped() {
        let engine = StockingEngine::builtin();
        let suggestions = suggest_candidates(&engine, &betta_tank(), usize::MAX);
        assert!(!suggestions.is_empty());
        assert!(suggestions.iter().all(|s| s.species_id != "betta_male"));
    }

    #[test]
    fn test_ranked_by_severity_then_percent() {
        let engine = StockingEngine::builtin();
        let suggestions = suggest_candidates(&engine, &betta_tank(), usize::MAX);
        for pair in suggestions.windows(2) {
            assert!(pair[0].severity <= pair[1].severity);
            if pair[0].severity == pair[1].severity {
                assert!(pair[0].percent <= pair[1].percent);
            }
        }
    }

    #[test]
    fn test_group_minimum_sets_quantity() {
        let engine = StockingEngine::builtin();
        let suggestions = suggest_candidates(&engine, &betta_tank(), usize::MAX);
        let cardinal = suggestions.iter().find(|s| s.species_id == "cardinal").unwrap();
        assert_eq!(cardinal.quantity, 6);
        assert!(suggestions.len() <= engine.catalog().len());
        assert_eq!(suggest_candidates(&engine, &betta_tank(), 2).len(), 2.min(suggestions.len()));
    }
}
