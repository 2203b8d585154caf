use approx::{assert_abs_diff_eq, assert_relative_eq};
use aquaforge_core::{
    bioload,
    config::EngineConfig,
    filtration::{self, combine_relief},
    planner::{apply_overrides, PlanBuilder, StockingEngine},
    sanitize::Diagnostics,
};
use aquaforge_schemas::{
    filter::{FilterSpec, FilterType},
    plan::PlanOverrides,
    stock::StockEntry,
    tank::TankContext,
    water::WaterProfile,
};

const EPS: f64 = 1e-6;

fn percent_with(filters: &[FilterSpec], gallons: f64, load: f64, capacity: f64) -> f64 {
    let config = EngineConfig::default();
    let resolved = filtration::resolve_filters(filters, &mut Diagnostics::new());
    let summary = filtration::summarize(&resolved, gallons, None, &config);
    bioload::utilization(load, capacity, summary.relief.combined).percent
}

#[test]
fn zero_filter_baseline_is_plain_ratio() {
    assert_relative_eq!(percent_with(&[], 29.0, 100.0, 100.0), 100.0);
    assert_relative_eq!(percent_with(&[], 29.0, 37.0, 80.0), 37.0 / 80.0 * 100.0);
}

#[test]
fn each_hob_lowers_percent_by_less_than_the_last() {
    let hob = |id: &str| FilterSpec::product(id, FilterType::Hob, 200.0);
    let baseline = percent_with(&[], 29.0, 100.0, 100.0);
    let one = percent_with(&[hob("a")], 29.0, 100.0, 100.0);
    let two = percent_with(&[hob("a"), hob("b")], 29.0, 100.0, 100.0);

    assert!(one < baseline);
    assert!(two < one);
    assert!(one - two < baseline - one);
}

#[test]
fn relief_is_multiplicative_and_capped() {
    let config = EngineConfig::default();
    for effs in [vec![0.3, 0.2], vec![0.6, 0.6, 0.6], vec![0.1, 0.1, 0.1, 0.1]] {
        let relief = combine_relief(&effs, &config);
        let expected = 1.0 - effs.iter().map(|e| 1.0 - e).product::<f64>();
        assert_abs_diff_eq!(relief.raw, expected, epsilon = EPS);
        assert!(relief.combined <= 0.6 + EPS);
        assert!(relief.combined <= relief.raw + EPS);
    }
}

#[test]
fn single_type_sets_derate_to_sixty_five_percent() {
    let config = EngineConfig::default();
    for kind in [FilterType::Sponge, FilterType::Canister, FilterType::Internal] {
        let specs = vec![FilterSpec::custom(kind, 90.0), FilterSpec::custom(kind, 310.0)];
        let resolved = filtration::resolve_filters(&specs, &mut Diagnostics::new());
        let summary = filtration::summarize(&resolved, 40.0, None, &config);
        let ratio = summary.total_derated_gph / summary.total_rated_gph;
        assert_abs_diff_eq!(ratio, 0.65, epsilon = 0.1);
        assert!(summary.filters.iter().all(|f| (0.0..=0.6).contains(&f.efficiency)));
    }
}

#[test]
fn stock_then_filter_equals_filter_then_stock() {
    let engine = StockingEngine::builtin();
    let empty = PlanBuilder::new()
        .with_tank(TankContext::new(29.0))
        .with_water(WaterProfile::default())
        .build()
        .unwrap();
    let add_stock = PlanOverrides {
        add_stock: vec![StockEntry::new("harlequin", 8), StockEntry::new("cory_panda", 6)],
        ..PlanOverrides::default()
    };
    let add_filter = PlanOverrides {
        add_filters: vec![FilterSpec::product("hob", FilterType::Hob, 200.0)],
        ..PlanOverrides::default()
    };

    let a = engine.compute(&apply_overrides(&apply_overrides(&empty, &add_stock), &add_filter));
    let b = engine.compute(&apply_overrides(&apply_overrides(&empty, &add_filter), &add_stock));
    assert_abs_diff_eq!(a.percent(), b.percent(), epsilon = EPS);
}

#[test]
fn planted_lowers_percent_by_at_most_25_points() {
    let engine = StockingEngine::builtin();
    for gallons in [5.0, 10.0, 20.0, 55.0] {
        let plan = |planted: bool| {
            PlanBuilder::new()
                .with_tank(TankContext::new(gallons).planted(planted))
                .with_water(WaterProfile::default())
                .add_stock(StockEntry::new("neon", 10))
                .add_stock(StockEntry::new("cory_panda", 6))
                .add_filter(FilterSpec::custom(FilterType::Sponge, 60.0))
                .build()
                .unwrap()
        };
        let bare = engine.compute(&plan(false)).percent();
        let planted = engine.compute(&plan(true)).percent();
        if bare < 200.0 {
            assert!(planted < bare, "{} gal", gallons);
        }
        assert!(bare - planted <= 25.0, "{} gal", gallons);
    }
}

#[test]
fn percent_stays_in_bounds_for_hostile_input() {
    let engine = StockingEngine::builtin();
    for gallons in [0.0, -10.0, f64::NAN, f64::INFINITY, 1e-9] {
        let plan = PlanBuilder::new()
            .with_tank(TankContext::new(gallons))
            .with_water(WaterProfile::default())
            .add_stock(StockEntry::new("pgourami", 3))
            .add_stock(StockEntry::new("neon", -4))
            .add_filter(FilterSpec::named("Mystery Pump", f64::NAN))
            .build()
            .unwrap();
        let state = engine.compute(&plan);
        let percent = state.percent();
        assert!(percent.is_finite(), "{}", gallons);
        assert!((0.0..=200.0).contains(&percent), "{}", gallons);
        assert!(!state.diagnostics.is_empty());
    }
}

#[test]
fn vanishing_capacity_saturates_at_ceiling() {
    let engine = StockingEngine::builtin();
    let plan = PlanBuilder::new()
        .with_tank(TankContext::new(0.0))
        .with_water(WaterProfile::default())
        .add_stock(StockEntry::new("neon", 1))
        .build()
        .unwrap();
    assert_relative_eq!(engine.compute(&plan).percent(), 200.0);
}
