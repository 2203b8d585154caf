//! Batch checks over the kernel: the crosscheck grid and its guardrails, a
//! seeded stress suite, scenario expectations and outcome-log tallies.

use crate::{
    constants,
    error::AquaforgeError,
    logger::OutcomeRecord,
    planner::{apply_overrides, ComputedState, PlanBuilder, StockingEngine},
    severity::Severity,
};
use aquaforge_schemas::{
    file_formats::Expectation,
    filter::{FilterSpec, FilterType},
    plan::{PlanOverrides, StockingPlan},
    stock::{LifeStage, StockEntry},
    tank::TankContext,
    water::WaterProfile,
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Community stock shared by every crosscheck scenario.
pub const FIXTURE_STOCK: &[(&str, i32)] = &[
    ("chili", 12),
    ("neon", 10),
    ("otocinclus", 6),
    ("harlequin", 8),
    ("cory_panda", 6),
    ("pgourami", 2),
    ("betta_male", 1),
    ("dgourami", 1),
    ("amano", 12),
    ("nerite", 6),
];

pub const TANK_SIZES: [f64; 3] = [20.0, 29.0, 40.0];
const PLANTED_OPTIONS: [bool; 2] = [false, true];

/// Each chain only ever adds filters, so utilization must not rise along it.
const SUPERSET_CHAINS: &[&[&str]] = &[
    &["none", "sponge80", "sponge_hob"],
    &["none", "hob200", "hob_hob"],
    &["none", "hob200", "hob_canister"],
    &["none", "canister300", "hob_canister"],
    &["none", "hob200", "product200_custom120"],
    &["none", "custom120", "product200_custom120"],
];

/// Baseline, first filter, then a second filter no stronger than the first.
const DIMINISHING_SEQUENCES: &[[&str; 3]] = &[
    ["none", "hob200", "hob_hob"],
    ["none", "canister300", "hob_canister"],
    ["none", "hob200", "product200_custom120"],
];

const CUSTOM_TOLERANCE: f64 = 0.5;
const PLANTED_MAX_REDUCTION: f64 = 25.0;
const DERATE_TOLERANCE: f64 = 0.1;

pub struct FilterScenario {
    pub id: &'static str,
    pub label: &'static str,
    pub filters: Vec<FilterSpec>,
}

pub fn filter_scenarios() -> Vec<FilterScenario> {
    let scenario = |id, label, filters| FilterScenario { id, label, filters };
    let custom_120 = FilterSpec {
        id: Some("custom-120".to_string()),
        ..FilterSpec::custom(FilterType::Hob, 120.0)
    };
    vec![
        scenario("none", "No filter", vec![]),
        scenario(
            "sponge80",
            "Sponge 80 GPH",
            vec![FilterSpec::product("sponge-80", FilterType::Sponge, 80.0)],
        ),
        scenario(
            "hob200",
            "HOB 200 GPH",
            vec![FilterSpec::product("hob-200", FilterType::Hob, 200.0)],
        ),
        scenario(
            "canister300",
            "Canister 300 GPH",
            vec![FilterSpec::product("canister-300", FilterType::Canister, 300.0)],
        ),
        scenario(
            "sponge_hob",
            "Sponge 80 + HOB 200",
            vec![
                FilterSpec::product("sponge-80", FilterType::Sponge, 80.0),
                FilterSpec::product("hob-200", FilterType::Hob, 200.0),
            ],
        ),
        scenario(
            "hob_hob",
            "Dual HOB 200 + 200",
            vec![
                FilterSpec::product("hob-a", FilterType::Hob, 200.0),
                FilterSpec::product("hob-b", FilterType::Hob, 200.0),
            ],
        ),
        scenario(
            "hob_canister",
            "HOB 200 + Canister 300",
            vec![
                FilterSpec::product("hob-main", FilterType::Hob, 200.0),
                FilterSpec::product("canister-main", FilterType::Canister, 300.0),
            ],
        ),
        scenario("custom60", "Custom HOB 60", vec![FilterSpec::custom(FilterType::Hob, 60.0)]),
        scenario("custom120", "Custom HOB 120", vec![FilterSpec::custom(FilterType::Hob, 120.0)]),
        scenario("custom200", "Custom HOB 200", vec![FilterSpec::custom(FilterType::Hob, 200.0)]),
        scenario(
            "product200_custom120",
            "Product HOB 200 + Custom HOB 120",
            vec![FilterSpec::product("hob-main", FilterType::Hob, 200.0), custom_120],
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub key: String,
    pub gallons: f64,
    pub planted: bool,
    pub filter_id: &'static str,
    pub filter_label: &'static str,
    pub base_load: f64,
    pub total_rated_gph: f64,
    pub total_derated_gph: f64,
    pub turnover: f64,
    pub relief_raw: f64,
    pub relief: f64,
    pub efficiencies: Vec<f64>,
    pub percent: f64,
    pub status: Severity,
}

/// A failed check: what was expected, what came out, and where.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    pub check: String,
    pub scenario: String,
    pub expected: String,
    pub got: String,
    pub message: String,
}

impl Mismatch {
    fn new(check: &str, scenario: &str, expected: String, got: String, message: &str) -> Self {
        Self {
            check: check.to_string(),
            scenario: scenario.to_string(),
            expected,
            got,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GuardrailResult {
    pub name: String,
    pub issues: Vec<Mismatch>,
}

impl GuardrailResult {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CrosscheckReport {
    pub base_load: f64,
    pub planted_bonus: f64,
    pub outcomes: Vec<ScenarioOutcome>,
    pub guardrails: Vec<GuardrailResult>,
}

impl CrosscheckReport {
    pub fn mismatches(&self) -> impl Iterator<Item = &Mismatch> {
        self.guardrails.iter().flat_map(|g| g.issues.iter())
    }

    pub fn scenario_passed(&self, key: &str) -> bool {
        !self.mismatches().any(|m| m.scenario == key)
    }

    pub fn failing_scenarios(&self) -> usize {
        self.outcomes.iter().filter(|o| !self.scenario_passed(&o.key)).count()
    }

    pub fn passed(&self) -> bool {
        self.guardrails.iter().all(GuardrailResult::passed)
    }
}

pub fn scenario_key(gallons: f64, planted: bool, filter_id: &str) -> String {
    format!("{}g-{}-{}", gallons, if planted { "planted" } else { "bare" }, filter_id)
}

fn fixture_entries() -> Vec<StockEntry> {
    FIXTURE_STOCK.iter().map(|(id, qty)| StockEntry::new(id, *qty)).collect()
}

fn empty_plan(gallons: f64, planted: bool) -> Result<StockingPlan, AquaforgeError> {
    PlanBuilder::new()
        .with_tank(TankContext::new(gallons).planted(planted))
        .with_water(WaterProfile::default())
        .build()
}

fn outcome(
    gallons: f64,
    planted: bool,
    scenario: &FilterScenario,
    state: &ComputedState,
) -> ScenarioOutcome {
    ScenarioOutcome {
        key: scenario_key(gallons, planted, scenario.id),
        gallons,
        planted,
        filter_id: scenario.id,
        filter_label: scenario.label,
        base_load: state.bioload.proposed.total_bioload,
        total_rated_gph: state.filtration.total_rated_gph,
        total_derated_gph: state.filtration.total_derated_gph,
        turnover: state.filtration.turnover,
        relief_raw: state.filtration.relief.raw,
        relief: state.filtration.relief.combined,
        efficiencies: state.filtration.filters.iter().map(|f| f.efficiency).collect(),
        percent: state.percent(),
        status: state.status.severity,
    }
}

struct Grid<'a> {
    by_key: HashMap<&'a str, &'a ScenarioOutcome>,
}

impl<'a> Grid<'a> {
    fn new(outcomes: &'a [ScenarioOutcome]) -> Self {
        Self {
            by_key: outcomes.iter().map(|o| (o.key.as_str(), o)).collect(),
        }
    }

    fn get(&self, gallons: f64, planted: bool, filter_id: &str) -> Option<&'a ScenarioOutcome> {
        self.by_key.get(scenario_key(gallons, planted, filter_id).as_str()).copied()
    }
}

fn base_load_invariant(outcomes: &[ScenarioOutcome], base_load: f64) -> Vec<Mismatch> {
    outcomes
        .iter()
        .filter(|o| (o.base_load - base_load).abs() > constants::EPSILON)
        .map(|o| {
            Mismatch::new(
                "production-invariant",
                &o.key,
                format!("{:.6}", base_load),
                format!("{:.6}", o.base_load),
                "Species base load should not change with filtration.",
            )
        })
        .collect()
}

fn utilization_monotonic(grid: &Grid<'_>) -> Vec<Mismatch> {
    let mut issues = Vec::new();
    for gallons in TANK_SIZES {
        for planted in PLANTED_OPTIONS {
            for chain in SUPERSET_CHAINS {
                let steps: Vec<&ScenarioOutcome> =
                    chain.iter().filter_map(|id| grid.get(gallons, planted, id)).collect();
                for pair in steps.windows(2) {
                    if pair[1].percent - pair[0].percent > constants::EPSILON {
                        issues.push(Mismatch::new(
                            "utilization-monotonic",
                            &pair[1].key,
                            format!("<= {:.3}", pair[0].percent),
                            format!("{:.3}", pair[1].percent),
                            "Bioload percent should not increase when adding filtration.",
                        ));
                    }
                }
            }
        }
    }
    issues
}

fn diminishing_returns(grid: &Grid<'_>) -> Vec<Mismatch> {
    let mut issues = Vec::new();
    for gallons in TANK_SIZES {
        for planted in PLANTED_OPTIONS {
            for [baseline, first, second] in DIMINISHING_SEQUENCES {
                let (Some(baseline), Some(first), Some(second)) = (
                    grid.get(gallons, planted, baseline),
                    grid.get(gallons, planted, first),
                    grid.get(gallons, planted, second),
                ) else {
                    continue;
                };
                let improvement_one = baseline.percent - first.percent;
                let improvement_two = first.percent - second.percent;
                if improvement_two - improvement_one > constants::EPSILON {
                    issues.push(Mismatch::new(
                        "diminishing-returns",
                        &second.key,
                        format!("second improvement <= first ({:.3}%)", improvement_one),
                        format!("{:.3}%", improvement_two),
                        "Stacking filters should yield diminishing returns.",
                    ));
                }
            }
        }
    }
    issues
}

fn custom_matches_product(grid: &Grid<'_>) -> Vec<Mismatch> {
    let mut issues = Vec::new();
    for gallons in TANK_SIZES {
        for planted in PLANTED_OPTIONS {
            let (Some(product), Some(custom)) =
                (grid.get(gallons, planted, "hob200"), grid.get(gallons, planted, "custom200"))
            else {
                continue;
            };
            if (product.percent - custom.percent).abs() > CUSTOM_TOLERANCE {
                issues.push(Mismatch::new(
                    "custom-pipeline",
                    &custom.key,
                    format!("within {} of {:.3}", CUSTOM_TOLERANCE, product.percent),
                    format!("{:.3}", custom.percent),
                    "Custom filter percent diverged from catalog filter.",
                ));
            }
        }
    }
    issues
}

fn planted_relief(grid: &Grid<'_>, scenarios: &[FilterScenario]) -> Vec<Mismatch> {
    let mut issues = Vec::new();
    for gallons in TANK_SIZES {
        for scenario in scenarios {
            let (Some(bare), Some(planted)) =
                (grid.get(gallons, false, scenario.id), grid.get(gallons, true, scenario.id))
            else {
                continue;
            };
            if planted.percent >= bare.percent {
                issues.push(Mismatch::new(
                    "planted-relief",
                    &planted.key,
                    format!("< {:.3}", bare.percent),
                    format!("{:.3}", planted.percent),
                    "Planted toggle should reduce percent utilization.",
                ));
            }
            let reduction = bare.percent - planted.percent;
            if reduction > PLANTED_MAX_REDUCTION {
                issues.push(Mismatch::new(
                    "planted-relief-excessive",
                    &planted.key,
                    format!("reduction <= {}", PLANTED_MAX_REDUCTION),
                    format!("{:.3}", reduction),
                    "Planted relief should remain modest.",
                ));
            }
        }
    }
    issues
}

fn relief_capped(outcomes: &[ScenarioOutcome], max_relief: f64) -> Vec<Mismatch> {
    let mut issues = Vec::new();
    for o in outcomes {
        if o.relief - max_relief > constants::EPSILON {
            issues.push(Mismatch::new(
                "efficiency-cap",
                &o.key,
                format!("<= {}", max_relief),
                format!("{:.6}", o.relief),
                "Combined relief exceeded the cap.",
            ));
        }
        if let Some(worst) = o
            .efficiencies
            .iter()
            .find(|e| **e - constants::MAX_FILTER_EFFICIENCY > constants::EPSILON)
        {
            issues.push(Mismatch::new(
                "filter-efficiency-cap",
                &o.key,
                format!("<= {}", constants::MAX_FILTER_EFFICIENCY),
                format!("{:.6}", worst),
                "Per-filter efficiency exceeded the cap.",
            ));
        }
    }
    issues
}

fn flow_derated(outcomes: &[ScenarioOutcome], flow_derate: f64) -> Vec<Mismatch> {
    outcomes
        .iter()
        .filter(|o| o.total_rated_gph > 0.0)
        .filter_map(|o| {
            let ratio = o.total_derated_gph / o.total_rated_gph;
            ((ratio - flow_derate).abs() > DERATE_TOLERANCE).then(|| {
                Mismatch::new(
                    "turnover-derate",
                    &o.key,
                    format!("ratio ≈ {}", flow_derate),
                    format!("ratio={:.3}", ratio),
                    "Rated GPH is not derated before efficiency.",
                )
            })
        })
        .collect()
}

fn multiplicative_aggregation(outcomes: &[ScenarioOutcome]) -> Vec<Mismatch> {
    outcomes
        .iter()
        .filter(|o| o.efficiencies.len() > 1)
        .filter_map(|o| {
            let expected = 1.0 - o.efficiencies.iter().map(|e| 1.0 - e).product::<f64>();
            ((o.relief_raw - expected).abs() > constants::EPSILON).then(|| {
                Mismatch::new(
                    "aggregation-multiplicative",
                    &o.key,
                    format!("{:.6}", expected),
                    format!("{:.6}", o.relief_raw),
                    "Combined relief should use multiplicative aggregation.",
                )
            })
        })
        .collect()
}

/// Runs the tank × planted × filter grid and every guardrail over it.
pub fn run_crosscheck(engine: &StockingEngine<'_>) -> Result<CrosscheckReport, AquaforgeError> {
    let scenarios = filter_scenarios();
    let mut outcomes = Vec::new();
    let mut order_issues = Vec::new();
    let mut idempotence_issues = Vec::new();

    let stock_overrides = PlanOverrides {
        add_stock: fixture_entries(),
        ..PlanOverrides::default()
    };

    for gallons in TANK_SIZES {
        for planted in PLANTED_OPTIONS {
            let empty = empty_plan(gallons, planted)?;
            for scenario in &scenarios {
                let filter_overrides = PlanOverrides {
                    add_filters: scenario.filters.clone(),
                    ..PlanOverrides::default()
                };
                let stock_first =
                    apply_overrides(&apply_overrides(&empty, &stock_overrides), &filter_overrides);
                let filters_first =
                    apply_overrides(&apply_overrides(&empty, &filter_overrides), &stock_overrides);

                let state = engine.compute(&stock_first);
                let row = outcome(gallons, planted, scenario, &state);
                debug!(
                    scenario = %row.key,
                    percent = row.percent,
                    relief = row.relief,
                    "crosscheck row"
                );

                let mut reversed = stock_first.clone();
                reversed.filters.reverse();
                reversed.stock.reverse();
                let variants = [("filters-first", &filters_first), ("reversed", &reversed)];
                for (label, variant) in variants {
                    let percent = engine.compute(variant).percent();
                    if (percent - row.percent).abs() > constants::EPSILON {
                        order_issues.push(Mismatch::new(
                            "order-independence",
                            &row.key,
                            format!("{:.6}", row.percent),
                            format!("{:.6} ({})", percent, label),
                            "Final percent should not depend on the order plans were assembled in.",
                        ));
                    }
                }

                if engine.compute(&stock_first) != state {
                    idempotence_issues.push(Mismatch::new(
                        "idempotence",
                        &row.key,
                        "identical state".to_string(),
                        "state changed between calls".to_string(),
                        "Repeated computation should return the same state.",
                    ));
                }
                outcomes.push(row);
            }
        }
    }

    let base_load = outcomes.first().map_or(0.0, |o| o.base_load);
    let grid = Grid::new(&outcomes);
    let config = engine.config();
    let guardrail = |name: &str, issues: Vec<Mismatch>| GuardrailResult {
        name: name.to_string(),
        issues,
    };
    let guardrails = vec![
        guardrail(
            "Base bioload independent of filtration",
            base_load_invariant(&outcomes, base_load),
        ),
        guardrail(
            "Utilization decreases with additional filtration",
            utilization_monotonic(&grid),
        ),
        guardrail("Diminishing returns from stacking filters", diminishing_returns(&grid)),
        guardrail("Custom filters follow same pipeline", custom_matches_product(&grid)),
        guardrail("Planted tanks provide modest relief", planted_relief(&grid, &scenarios)),
        guardrail("Filtration relief capped", relief_capped(&outcomes, config.max_relief)),
        guardrail(
            "Turnover derated to delivered flow",
            flow_derated(&outcomes, config.flow_derate),
        ),
        guardrail(
            "Combined relief uses multiplicative aggregation",
            multiplicative_aggregation(&outcomes),
        ),
        guardrail("Order independence", order_issues),
        guardrail("Idempotent computation", idempotence_issues),
    ];

    let report = CrosscheckReport {
        base_load,
        planted_bonus: config.planted_bonus,
        outcomes,
        guardrails,
    };
    info!(
        scenarios = report.outcomes.len(),
        failing = report.failing_scenarios(),
        "crosscheck complete"
    );
    Ok(report)
}

#[derive(Debug, Clone, Serialize)]
pub struct StressReport {
    pub seed: u64,
    pub iterations: usize,
    pub checks: usize,
    pub failures: Vec<Mismatch>,
}

impl StressReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

const STRESS_FILTER_TYPES: [FilterType; 5] = [
    FilterType::Canister,
    FilterType::Hob,
    FilterType::Internal,
    FilterType::Ugf,
    FilterType::Sponge,
];

fn random_filter(rng: &mut ChaCha8Rng) -> FilterSpec {
    let rated_gph = if rng.gen_bool(0.05) {
        -10.0
    } else {
        rng.gen_range(0.0..600.0)
    };
    match rng.gen_range(0..4) {
        0 => FilterSpec::named("Mystery Pump", rated_gph),
        1 => FilterSpec::named("AquaClear 50 Power Filter", rated_gph),
        2 => FilterSpec::custom(STRESS_FILTER_TYPES[rng.gen_range(0..5)], rated_gph),
        _ => {
            let kind = STRESS_FILTER_TYPES[rng.gen_range(0..5)];
            let id = format!("{}-{}", kind.as_str(), rng.gen_range(0..1000));
            FilterSpec::product(&id, kind, rated_gph)
        }
    }
}

fn random_entry(rng: &mut ChaCha8Rng, species: &[&str]) -> StockEntry {
    let id = species.choose(rng).copied().unwrap_or("neon");
    StockEntry {
        species_id: id.to_string(),
        quantity: match rng.gen_range(0..25) {
            0 => i32::MAX,
            1 => rng.gen_range(i32::MAX / 2..=i32::MAX),
            _ => rng.gen_range(-2..=24),
        },
        stage: if rng.gen_bool(0.2) { LifeStage::Juvenile } else { LifeStage::Adult },
    }
}

fn random_plan(rng: &mut ChaCha8Rng, species: &[&str]) -> StockingPlan {
    let gallons = match rng.gen_range(0..20) {
        0 => 0.0,
        1 => -5.0,
        2 => f64::NAN,
        _ => rng.gen_range(2.0..150.0),
    };
    let mut tank = TankContext::new(gallons).planted(rng.gen_bool(0.5));
    if rng.gen_bool(0.2) {
        tank.sump_gallons = rng.gen_range(0.0..30.0);
    }
    let stock = (0..rng.gen_range(0..=6)).map(|_| random_entry(rng, species)).collect();
    let filters = (0..rng.gen_range(0..=3)).map(|_| random_filter(rng)).collect();
    let candidate = rng.gen_bool(0.5).then(|| random_entry(rng, species));
    StockingPlan {
        tank,
        water: WaterProfile::default(),
        stock,
        filters,
        candidate,
        beginner_mode: rng.gen_bool(0.3),
    }
}

/// Generates `iterations` random plans from `seed` and checks the bounds,
/// monotonicity, order-independence and idempotence properties on each.
pub fn run_stress(engine: &StockingEngine<'_>, seed: u64, iterations: usize) -> StressReport {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let species: Vec<&str> = engine.catalog().species().iter().map(|s| s.id.as_str()).collect();
    let max_relief = engine.config().max_relief;
    let efficiency_cap = constants::MAX_FILTER_EFFICIENCY + constants::EPSILON;
    let mut failures = Vec::new();
    let mut checks = 0;

    for i in 0..iterations {
        let plan = random_plan(&mut rng, &species);
        let label = format!("seed-{}#{}", seed, i);
        let state = engine.compute(&plan);
        let percent = state.percent();
        let mut check = |ok: bool, name: &str, expected: String, got: String, message: &str| {
            checks += 1;
            if !ok {
                failures.push(Mismatch::new(name, &label, expected, got, message));
            }
        };

        let in_bounds = |p: f64| p.is_finite() && (0.0..=constants::PERCENT_CEILING).contains(&p);
        check(
            in_bounds(percent) && in_bounds(state.bioload.current.percent),
            "percent-bounds",
            "0 ≤ percent ≤ 200".to_string(),
            format!("{}", percent),
            "Percent must stay finite and within the clamp.",
        );
        let relief = state.filtration.relief.combined;
        check(
            (0.0..=max_relief + constants::EPSILON).contains(&relief),
            "relief-bounds",
            format!("0 ≤ relief ≤ {}", max_relief),
            format!("{}", relief),
            "Combined relief must stay within the cap.",
        );
        check(
            state
                .filtration
                .filters
                .iter()
                .all(|f| (0.0..=efficiency_cap).contains(&f.efficiency)),
            "filter-efficiency-bounds",
            format!("0 ≤ efficiency ≤ {}", constants::MAX_FILTER_EFFICIENCY),
            "out of range".to_string(),
            "Per-filter efficiency must stay within the cap.",
        );

        check(
            engine.compute(&plan) == state,
            "idempotence",
            "identical state".to_string(),
            "state changed".to_string(),
            "Repeated computation should return the same state.",
        );

        let extra_filter = apply_overrides(
            &plan,
            &PlanOverrides {
                add_filters: vec![random_filter(&mut rng)],
                ..PlanOverrides::default()
            },
        );
        let filtered = engine.compute(&extra_filter).percent();
        check(
            filtered <= percent + constants::EPSILON,
            "filtration-monotonic",
            format!("<= {:.6}", percent),
            format!("{:.6}", filtered),
            "Adding a filter must never raise percent.",
        );

        let extra_stock = apply_overrides(
            &plan,
            &PlanOverrides {
                add_stock: vec![StockEntry::new(
                    species.choose(&mut rng).copied().unwrap_or("neon"),
                    1,
                )],
                ..PlanOverrides::default()
            },
        );
        let stocked = engine.compute(&extra_stock).percent();
        check(
            stocked + constants::EPSILON >= percent,
            "stock-monotonic",
            format!(">= {:.6}", percent),
            format!("{:.6}", stocked),
            "Adding stock must never lower percent.",
        );

        let mut bare = plan.clone();
        bare.tank.planted = false;
        let mut planted = plan.clone();
        planted.tank.planted = true;
        let bare_percent = engine.compute(&bare).percent();
        let planted_percent = engine.compute(&planted).percent();
        check(
            planted_percent <= bare_percent + constants::EPSILON,
            "planted-relief",
            format!("<= {:.6}", bare_percent),
            format!("{:.6}", planted_percent),
            "Planting must never raise percent.",
        );

        let mut shuffled = plan.clone();
        shuffled.stock.shuffle(&mut rng);
        shuffled.filters.shuffle(&mut rng);
        let reordered = engine.compute(&shuffled).percent();
        check(
            (reordered - percent).abs() <= constants::EPSILON,
            "order-independence",
            format!("{:.6}", percent),
            format!("{:.6}", reordered),
            "Percent must not depend on entry order.",
        );
    }

    info!(seed, iterations, checks, failures = failures.len(), "stress suite complete");
    StressReport {
        seed,
        iterations,
        checks,
        failures,
    }
}

/// Compares a computed state with a scenario's expectations.
pub fn check_expectation(
    scenario: &str,
    state: &ComputedState,
    expect: &Expectation,
) -> Vec<Mismatch> {
    let mut issues = Vec::new();

    if let Some(percent) = expect.percent {
        if (state.percent() - percent).abs() > expect.tolerance {
            issues.push(Mismatch::new(
                "expected-percent",
                scenario,
                format!("{:.3} ± {}", percent, expect.tolerance),
                format!("{:.3}", state.percent()),
                "Bioload percent differs from the expected value.",
            ));
        }
    }

    if let Some(status) = &expect.status {
        match status.parse::<Severity>() {
            Ok(severity) if severity == state.status.severity => {}
            Ok(severity) => issues.push(Mismatch::new(
                "expected-status",
                scenario,
                severity.to_string(),
                state.status.severity.to_string(),
                "Headline severity differs from the expected value.",
            )),
            Err(reason) => issues.push(Mismatch::new(
                "expected-status",
                scenario,
                status.clone(),
                reason,
                "Expected status is not a known severity.",
            )),
        }
    }

    for needle in &expect.chips_contain {
        if !state.has_chip(needle) {
            issues.push(Mismatch::new(
                "expected-chip",
                scenario,
                format!("chip containing '{}'", needle),
                state.chips.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" | "),
                "Expected chip is missing.",
            ));
        }
    }

    if let Some(blocked) = expect.blocked {
        if blocked != state.is_blocked() {
            issues.push(Mismatch::new(
                "expected-blocked",
                scenario,
                blocked.to_string(),
                state.is_blocked().to_string(),
                "Block state differs from the expected value.",
            ));
        }
    }
    issues
}

#[derive(Debug, Default, Clone)]
pub struct OutcomeTally {
    pub rows: usize,
    pub filters_logged: usize,
    pub by_status: BTreeMap<String, usize>,
    pub max_percent: f64,
}

/// Reads an outcome log written by `OutcomeLogger` back into a summary.
pub fn tally_outcome_log(log_path: &str) -> Result<OutcomeTally, AquaforgeError> {
    let csv_error = |e: csv::Error| AquaforgeError::CsvError(log_path.to_string(), e);
    let mut reader = csv::Reader::from_path(log_path).map_err(csv_error)?;
    let mut tally = OutcomeTally::default();

    for result in reader.deserialize() {
        let record: OutcomeRecord = result.map_err(csv_error)?;
        let efficiencies: Vec<f64> = serde_json::from_str(&record.efficiencies_json)?;
        tally.rows += 1;
        tally.filters_logged += efficiencies.len();
        *tally.by_status.entry(record.status).or_insert(0) += 1;
        tally.max_percent = tally.max_percent.max(record.percent);
    }
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::OutcomeLogger;
    use approx::assert_relative_eq;

    #[test]
    fn test_crosscheck_grid_passes_every_guardrail() {
        let engine = StockingEngine::builtin();
        let report = run_crosscheck(&engine).unwrap();
        assert_eq!(report.outcomes.len(), TANK_SIZES.len() * 2 * filter_scenarios().len());
        let failures: Vec<&Mismatch> = report.mismatches().collect();
        assert!(failures.is_empty(), "{:#?}", failures);
        assert_eq!(report.failing_scenarios(), 0);
        assert_relative_eq!(report.base_load, 9.78, epsilon = 1e-9);
    }

    fn bare_twenty(percents: &[(&str, f64)]) -> Vec<ScenarioOutcome> {
        percents
            .iter()
            .map(|&(id, percent)| ScenarioOutcome {
                key: scenario_key(20.0, false, id),
                gallons: 20.0,
                planted: false,
                filter_id: "x",
                filter_label: "x",
                base_load: 1.0,
                total_rated_gph: 0.0,
                total_derated_gph: 0.0,
                turnover: 0.0,
                relief_raw: 0.0,
                relief: 0.0,
                efficiencies: vec![],
                percent,
                status: Severity::Ok,
            })
            .collect()
    }

    #[test]
    fn test_guardrail_flags_rising_utilization() {
        let outcomes = bare_twenty(&[("none", 50.0), ("hob200", 60.0), ("hob_hob", 40.0)]);
        let grid = Grid::new(&outcomes);
        let issues = utilization_monotonic(&grid);
        // Three chains step from none to hob200.
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|m| m.scenario == "20g-bare-hob200"));
    }

    #[test]
    fn test_second_filter_must_help_less_than_the_first() {
        let growing = bare_twenty(&[("none", 50.0), ("hob200", 45.0), ("hob_hob", 39.9)]);
        let issues = diminishing_returns(&Grid::new(&growing));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].scenario, "20g-bare-hob_hob");

        let shrinking = bare_twenty(&[("none", 50.0), ("hob200", 45.0), ("hob_hob", 41.0)]);
        assert!(diminishing_returns(&Grid::new(&shrinking)).is_empty());
    }

    #[test]
    fn test_stress_suite_is_reproducible() {
        let engine = StockingEngine::builtin();
        let first = run_stress(&engine, 42, 60);
        let second = run_stress(&engine, 42, 60);
        assert!(first.passed(), "{:#?}", first.failures);
        assert_eq!(first.checks, second.checks);
        assert_eq!(first.checks, 60 * 8);
    }

    #[test]
    fn test_expectations() {
        let engine = StockingEngine::builtin();
        let plan = PlanBuilder::new()
            .with_tank(TankContext::new(10.0))
            .with_water(WaterProfile::default())
            .add_stock(StockEntry::new("neocaridina", 10))
            .with_candidate(StockEntry::new("betta_male", 1))
            .build()
            .unwrap();
        let state = engine.compute(&plan);
        let expect = Expectation {
            percent: Some(state.percent()),
            tolerance: 0.01,
            status: Some("bad".to_string()),
            chips_contain: vec!["Predation risk (shrimp)".to_string()],
            blocked: Some(false),
        };
        assert!(check_expectation("shrimp", &state, &expect).is_empty());

        let wrong = Expectation {
            percent: Some(state.percent() + 5.0),
            status: Some("sideways".to_string()),
            chips_contain: vec!["Nope".to_string()],
            blocked: Some(true),
            ..expect
        };
        let issues = check_expectation("shrimp", &state, &wrong);
        let checks: Vec<&str> = issues.iter().map(|m| m.check.as_str()).collect();
        assert_eq!(
            checks,
            vec!["expected-percent", "expected-status", "expected-chip", "expected-blocked"]
        );
    }

    #[test]
    fn test_outcome_log_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outcomes.csv");
        let path = path.to_str().unwrap();

        let report = run_crosscheck(&StockingEngine::builtin()).unwrap();
        let mut logger = OutcomeLogger::new(path).unwrap();
        logger.log_all(&report.outcomes).unwrap();

        let tally = tally_outcome_log(path).unwrap();
        assert_eq!(tally.rows, report.outcomes.len());
        let expected_filters: usize = report.outcomes.iter().map(|o| o.efficiencies.len()).sum();
        assert_eq!(tally.filters_logged, expected_filters);
        assert_eq!(tally.by_status.values().sum::<usize>(), tally.rows);
    }

    #[test]
    fn test_missing_log_is_a_csv_error() {
        let result = tally_outcome_log("/definitely/not/here.csv");
        assert!(matches!(result, Err(AquaforgeError::CsvError(_, _))));
    }
}
