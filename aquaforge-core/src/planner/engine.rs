use super::{
    builder::apply_overrides,
    state::{Chip, ComputedState, Status},
};
use crate::{
    bioload::{self, BioloadSummary, Utilization},
    catalog::SpeciesCatalog,
    compat::{self, Issue, IssueCategory, RuleContext},
    config::EngineConfig,
    constants,
    filtration::{self, FiltrationSummary},
    recommend,
    sanitize::{self, Diagnostics},
    severity::Severity,
};
use aquaforge_schemas::{
    plan::{PlanOverrides, StockingPlan},
    water::WaterProfile,
};
use tracing::debug;

/// Evaluates stocking plans against a species catalog. Every call is a pure
/// function of the plan; the engine keeps no state between calls.
pub struct StockingEngine<'c> {
    catalog: &'c SpeciesCatalog,
    config: EngineConfig,
}

impl<'c> StockingEngine<'c> {
    pub fn new(catalog: &'c SpeciesCatalog, config: EngineConfig) -> Self {
        Self { catalog, config }
    }

    /// Engine over the built-in catalog with the canonical constants.
    pub fn builtin() -> StockingEngine<'static> {
        StockingEngine::new(SpeciesCatalog::builtin(), EngineConfig::default())
    }

    pub fn catalog(&self) -> &'c SpeciesCatalog {
        self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn compute(&self, plan: &StockingPlan) -> ComputedState {
        let mut diagnostics = Diagnostics::new();

        let tank = bioload::derive_tank(&plan.tank, &self.config, &mut diagnostics);
        let resolved = filtration::resolve_filters(&plan.filters, &mut diagnostics);
        let filtration = filtration::summarize(
            &resolved,
            tank.water_gallons,
            tank.turnover_override,
            &self.config,
        );

        let entries =
            bioload::resolve_entries(&plan.stock, self.catalog, &self.config, &mut diagnostics);
        let candidate = plan
            .candidate
            .as_ref()
            .and_then(|entry| {
                bioload::resolve_entry(entry, self.catalog, &self.config, &mut diagnostics)
            });

        let current_total = bioload::total_bioload(&entries);
        let proposed_total = current_total + candidate.as_ref().map_or(0.0, |c| c.bioload);
        let relief = filtration.relief.combined;
        let bioload = BioloadSummary {
            current: bioload::utilization(current_total, tank.effective_gallons, relief),
            proposed: bioload::utilization(proposed_total, tank.effective_gallons, relief),
        };

        let water = sanitize_water(&plan.water, &mut diagnostics);
        let ctx = RuleContext::new(self.catalog, &entries, candidate.as_ref(), &water, &tank);
        let mut issues = capacity_issues(&bioload.proposed, &filtration, !ctx.combined.is_empty());
        issues.extend(compat::evaluate(&ctx));
        issues.sort_by_key(|issue| issue.category);

        let recommendation = recommend::environment(
            &ctx.combined,
            &tank,
            bioload.proposed.total_bioload,
            &self.config,
        );
        let chips = issues
            .iter()
            .map(|issue| Chip {
                tone: issue.severity,
                text: issue.message.clone(),
                category: issue.category,
            })
            .collect();
        let status = Status::from_issues(&issues);
        let block_reasons = block_reasons(&issues, plan.beginner_mode);

        debug!(
            percent = bioload.proposed.percent,
            relief,
            turnover = filtration.turnover,
            issues = issues.len(),
            blocked = !block_reasons.is_empty(),
            "computed plan"
        );

        ComputedState {
            tank,
            filtration,
            entries,
            candidate,
            bioload,
            issues,
            chips,
            status,
            block_reasons,
            recommendation,
            diagnostics: diagnostics.into_entries(),
        }
    }

    /// Re-runs `compute` on a copy of `base` with `overrides` applied.
    pub fn what_if(&self, base: &StockingPlan, overrides: &PlanOverrides) -> ComputedState {
        self.compute(&apply_overrides(base, overrides))
    }
}

/// Replaces non-finite readings with the default profile's values.
pub fn sanitize_water(water: &WaterProfile, diagnostics: &mut Diagnostics) -> WaterProfile {
    let fallback = WaterProfile::default();
    let mut clean = water.clone();
    clean.temperature_f = sanitize::finite_or(
        water.temperature_f,
        fallback.temperature_f,
        "water.temperature_f",
        diagnostics,
    );
    clean.ph = sanitize::finite_or(water.ph, fallback.ph, "water.ph", diagnostics);
    clean.gh = sanitize::non_negative(
        sanitize::finite_or(water.gh, fallback.gh, "water.gh", diagnostics),
        "water.gh",
        diagnostics,
    );
    clean.kh = sanitize::non_negative(
        sanitize::finite_or(water.kh, fallback.kh, "water.kh", diagnostics),
        "water.kh",
        diagnostics,
    );
    clean
}

/// Capacity and turnover issues for the proposed stock.
pub fn capacity_issues(
    proposed: &Utilization,
    filtration: &FiltrationSummary,
    has_stock: bool,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    let percent = proposed.percent;
    if percent > constants::BIOLOAD_BAD_PERCENT {
        issues.push(
            Issue::new(
                IssueCategory::Bioload,
                Severity::Bad,
                "bioload",
                format!("Over capacity: {:.0}% of bioload capacity", percent),
            )
            .blocking_for_beginners(),
        );
    } else if percent > constants::BIOLOAD_WARN_PERCENT {
        issues.push(Issue::new(
            IssueCategory::Bioload,
            Severity::Warn,
            "bioload",
            format!("Near capacity: {:.0}% of bioload capacity", percent),
        ));
    }
    if has_stock && filtration.turnover < constants::MIN_TURNOVER {
        issues.push(Issue::new(
            IssueCategory::Bioload,
            Severity::Warn,
            "turnover",
            "Turnover below 2×, upgrade filtration".to_string(),
        ));
    }
    issues
}

/// Fatal issues always block. In beginner mode, bad salinity or water
/// conditions and anything flagged beginner-blocking block as well.
pub fn block_reasons(issues: &[Issue], beginner_mode: bool) -> Vec<String> {
    let mut reasons: Vec<String> = Vec::new();
    for issue in issues {
        let bad_water = issue.severity == Severity::Bad
            && matches!(issue.category, IssueCategory::Salinity | IssueCategory::Condition);
        let beginner_gate = beginner_mode && (issue.beginner_block || bad_water);
        if (issue.fatal || beginner_gate) && !reasons.contains(&issue.message) {
            reasons.push(issue.message.clone());
        }
    }
    reasons
}
