//! Compatibility rules. Each rule is an independent function from a
//! `RuleContext` to zero or more issues; `evaluate` runs them in a fixed order.

pub mod behavior;
pub mod conditions;
pub mod environment;
pub mod groups;
pub mod pairwise;

use crate::{
    bioload::{ResolvedEntry, TankDerivation},
    catalog::SpeciesCatalog,
    severity::Severity,
};
use aquaforge_schemas::{species::SpeciesRecord, water::WaterProfile};
use serde::Serialize;

/// Issue families, in status tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Bioload,
    Aggression,
    Condition,
    Group,
    Salinity,
    Flow,
    Blackwater,
}

impl IssueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCategory::Bioload => "bioload",
            IssueCategory::Aggression => "aggression",
            IssueCategory::Condition => "condition",
            IssueCategory::Group => "group",
            IssueCategory::Salinity => "salinity",
            IssueCategory::Flow => "flow",
            IssueCategory::Blackwater => "blackwater",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub category: IssueCategory,
    pub severity: Severity,
    pub rule: &'static str,
    pub message: String,
    pub subjects: Vec<String>,
    /// Becomes an add-blocking reason when beginner mode is on.
    pub beginner_block: bool,
    /// Always add-blocking.
    pub fatal: bool,
}

impl Issue {
    pub fn new(
        category: IssueCategory,
        severity: Severity,
        rule: &'static str,
        message: String,
    ) -> Self {
        Self {
            category,
            severity,
            rule,
            message,
            subjects: Vec::new(),
            beginner_block: false,
            fatal: false,
        }
    }

    pub fn about<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subjects.extend(subjects.into_iter().map(Into::into));
        self
    }

    pub fn blocking_for_beginners(mut self) -> Self {
        self.beginner_block = true;
        self
    }

    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }
}

/// One species in the plan with its planned headcount.
#[derive(Debug, Clone, Copy)]
pub struct Member<'a> {
    pub record: &'a SpeciesRecord,
    pub quantity: u32,
}

impl<'a> Member<'a> {
    pub fn id(&self) -> &'a str {
        &self.record.id
    }

    pub fn name(&self) -> &'a str {
        &self.record.common_name
    }
}

pub struct RuleContext<'a> {
    /// Current stock, one member per species.
    pub incumbents: Vec<Member<'a>>,
    pub candidate: Option<Member<'a>>,
    /// Stock plus candidate, one member per species.
    pub combined: Vec<Member<'a>>,
    pub water: &'a WaterProfile,
    pub water_gallons: f64,
    pub tank_length_in: Option<f64>,
}

fn merge_into<'a>(members: &mut Vec<Member<'a>>, record: &'a SpeciesRecord, quantity: u32) {
    if quantity == 0 {
        return;
    }
    match members.iter_mut().find(|m| m.record.id == record.id) {
        Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
        None => members.push(Member { record, quantity }),
    }
}

impl<'a> RuleContext<'a> {
    pub fn new(
        catalog: &'a SpeciesCatalog,
        stock: &[ResolvedEntry],
        candidate: Option<&ResolvedEntry>,
        water: &'a WaterProfile,
        tank: &TankDerivation,
    ) -> Self {
        let mut incumbents = Vec::new();
        for entry in stock {
            if let Some(record) = catalog.get(&entry.species_id) {
                merge_into(&mut incumbents, record, entry.quantity);
            }
        }
        let candidate = candidate
            .filter(|entry| entry.quantity > 0)
            .and_then(|entry| {
                catalog.get(&entry.species_id).map(|record| Member {
                    record,
                    quantity: entry.quantity,
                })
            });
        let mut combined = incumbents.clone();
        if let Some(member) = candidate {
            merge_into(&mut combined, member.record, member.quantity);
        }
        Self {
            incumbents,
            candidate,
            combined,
            water,
            water_gallons: tank.water_gallons,
            tank_length_in: tank.length_in,
        }
    }

    /// Planned headcount of a species across stock and candidate.
    pub fn quantity_of(&self, id: &str) -> u32 {
        self.combined
            .iter()
            .filter(|m| m.record.id == id)
            .fold(0, |total, m| total.saturating_add(m.quantity))
    }

    /// Planned headcount of every member carrying `tag`.
    pub fn quantity_tagged(&self, tag: &str) -> u32 {
        self.combined
            .iter()
            .filter(|m| m.record.has_tag(tag))
            .fold(0, |total, m| total.saturating_add(m.quantity))
    }
}

pub type Rule = fn(&RuleContext<'_>) -> Vec<Issue>;

/// Every rule, grouped by category in tie-break order.
pub const RULES: &[Rule] = &[
    pairwise::candidate_pairs,
    behavior::male_betta_limit,
    behavior::female_betta_sorority,
    behavior::stocked_fin_nippers_with_betta,
    behavior::invert_safety,
    conditions::water_conditions,
    conditions::shell_health,
    groups::group_minimums,
    environment::salinity,
    environment::flow,
    environment::blackwater,
];

/// Runs all rules and returns the non-ok issues in category order,
/// keeping evaluation order within a category.
pub fn evaluate(ctx: &RuleContext<'_>) -> Vec<Issue> {
    let mut issues: Vec<Issue> = RULES
        .iter()
        .flat_map(|rule| rule(ctx))
        .filter(|issue| issue.severity > Severity::Ok)
        .collect();
    issues.sort_by_key(|issue| issue.category);
    issues
}


#[cfg(test)]
mod tests {
    use super::test_support::Fixture;
    use super::*;
    use aquaforge_schemas::tank::TankContext;

    #[test]
    fn test_context_merges_duplicate_species() {
        let fixture = Fixture::new(
            &[("neon", 4), ("neon", 3), ("cardinal", 0)],
            Some(("neon", 2)),
            TankContext::new(20.0),
        );
        let ctx = fixture.context();
        assert_eq!(ctx.incumbents.len(), 1);
        assert_eq!(ctx.incumbents[0].quantity, 7);
        assert_eq!(ctx.quantity_of("neon"), 9);
        assert_eq!(ctx.quantity_of("cardinal"), 0);
    }

    #[test]
    fn test_headcounts_saturate_instead_of_wrapping() {
        let fixture = Fixture::new(
            &[("neon", i32::MAX), ("neon", i32::MAX), ("neon", i32::MAX)],
            Some(("neon", i32::MAX)),
            TankContext::new(20.0),
        );
        let ctx = fixture.context();
        assert_eq!(ctx.incumbents[0].quantity, u32::MAX);
        assert_eq!(ctx.quantity_of("neon"), u32::MAX);
        assert_eq!(ctx.quantity_tagged("shoaler"), u32::MAX);
        assert!(groups::group_minimums(&ctx).is_empty());
    }

    #[test]
    fn test_issues_are_sorted_by_category() {
        let fixture =
            Fixture::new(&[("rummynose", 3)], Some(("tiger_barb", 2)), TankContext::new(20.0));
        let issues = evaluate(&fixture.context());
        assert!(!issues.is_empty());
        assert!(issues.windows(2).all(|w| w[0].category <= w[1].category));
        assert!(issues.iter().all(|i| i.severity > Severity::Ok));
    }
}
