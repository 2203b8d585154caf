//! Canonical tuning constants shared by every computation path.

/// Fraction of a filter's rated flow that survives media, head height and clogging.
pub const FLOW_DERATE: f64 = 0.65;
/// Ceiling on combined filtration relief across any number of filters.
pub const MAX_RELIEF: f64 = 0.6;
/// Ceiling on a single filter's efficiency.
pub const MAX_FILTER_EFFICIENCY: f64 = 0.6;
/// Turnover (×/hr) at which a filter reaches its nominal efficiency.
pub const TURNOVER_PIVOT: f64 = 5.0;
pub const TURNOVER_FACTOR_MIN: f64 = 0.4;
pub const TURNOVER_FACTOR_MAX: f64 = 1.3;

pub const BASE_EFFICIENCY_CANISTER: f64 = 0.60;
pub const BASE_EFFICIENCY_HOB: f64 = 0.50;
pub const BASE_EFFICIENCY_INTERNAL: f64 = 0.45;
pub const BASE_EFFICIENCY_UGF: f64 = 0.35;
pub const BASE_EFFICIENCY_SPONGE: f64 = 0.25;

/// Share of nominal volume lost to substrate, hardscape and headroom.
pub const DISPLACEMENT: f64 = 0.10;
/// Capacity bonus granted to planted tanks.
pub const PLANTED_BONUS: f64 = 0.10;
pub const JUVENILE_MULTIPLIER: f64 = 0.6;
/// Default density used to derive a bioload unit from adult size (size³ × density).
pub const DEFAULT_DENSITY: f64 = 0.01;

pub const PERCENT_CEILING: f64 = 200.0;
pub const CAPACITY_FLOOR: f64 = 1e-6;
pub const EPSILON: f64 = 1e-6;

pub const BIOLOAD_WARN_PERCENT: f64 = 90.0;
pub const BIOLOAD_BAD_PERCENT: f64 = 110.0;
pub const MIN_TURNOVER: f64 = 2.0;

pub const AGGRESSION_WARN_GAP: f64 = 20.0;
pub const AGGRESSION_BAD_GAP: f64 = 40.0;
/// Tank length, as a multiple of the smaller minimum length, that eases pair friction.
pub const LENGTH_BUFFER: f64 = 1.5;

pub const TEMPERATURE_BAD_MARGIN_F: f64 = 2.0;
pub const GH_BAD_MARGIN: f64 = 3.0;
pub const KH_BAD_MARGIN: f64 = 2.0;
pub const PH_BAD_MARGIN: f64 = 0.5;
pub const PH_SENSITIVE_BAD_MARGIN: f64 = 0.2;
pub const PH_BUFFERED_EXTRA_MARGIN: f64 = 0.2;
pub const PH_BUFFERED_KH: f64 = 3.0;

pub const SHRIMP_MOUTH_THRESHOLD_IN: f64 = 0.25;
pub const SNAIL_MOUTH_THRESHOLD_IN: f64 = 0.5;
pub const SNAIL_MIN_GH: f64 = 6.0;

pub const SORORITY_MIN: u32 = 5;
pub const SORORITY_MIN_GALLONS: f64 = 20.0;

/// Pairs that never work regardless of other scores, keyed alphabetically.
pub const HARD_CONFLICTS: &[(&str, &str)] = &[
    ("betta_male", "betta_male"),
    ("betta_male", "guppy_male"),
    ("betta_male", "tiger_barb"),
];
