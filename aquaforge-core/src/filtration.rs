//! Filtration math: rated flow → derated flow → turnover → per-filter
//! efficiency → combined relief.

use crate::{
    config::EngineConfig,
    constants,
    sanitize::{self, Diagnostics},
};
use aquaforge_schemas::filter::{FilterSource, FilterSpec, FilterType};
use serde::Serialize;

/// How a filter's type was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeResolution {
    Explicit,
    InferredFromName,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFilter {
    pub id: Option<String>,
    pub label: String,
    pub filter_type: FilterType,
    pub resolution: TypeResolution,
    pub rated_gph: f64,
    pub source: FilterSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterBreakdown {
    pub label: String,
    pub filter_type: FilterType,
    pub resolution: TypeResolution,
    pub source: FilterSource,
    pub rated_gph: f64,
    pub derated_gph: f64,
    pub base_efficiency: f64,
    pub turnover_factor: f64,
    pub efficiency: f64,
}

/// Combined relief. `raw` is `1 − Π(1 − effᵢ)` before the cap is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Relief {
    pub raw: f64,
    pub combined: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FiltrationSummary {
    pub filters: Vec<FilterBreakdown>,
    pub total_rated_gph: f64,
    pub total_derated_gph: f64,
    pub turnover: f64,
    pub relief: Relief,
}

/// Parses a free-text type label ("HOB", "hang-on-back", "Canister", ...).
pub fn parse_filter_type(raw: &str) -> Option<FilterType> {
    let normalized: String = raw
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();
    let words: Vec<&str> = normalized.split_whitespace().collect();
    match words.as_slice() {
        ["canister"] => Some(FilterType::Canister),
        ["hob"] | ["power"] | ["hang", "on", "back"] | ["hangonback"] => Some(FilterType::Hob),
        ["internal"] | ["powerhead"] => Some(FilterType::Internal),
        ["ugf"] | ["undergravel"] | ["under", "gravel"] => Some(FilterType::Ugf),
        ["sponge"] => Some(FilterType::Sponge),
        _ => None,
    }
}

/// Looks for a type keyword anywhere in a product name.
pub fn infer_from_name(name: &str) -> Option<FilterType> {
    let normalized: String = name
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();
    let words: Vec<&str> = normalized.split_whitespace().collect();
    let has = |word: &str| words.iter().any(|w| *w == word);
    let has_phrase = |phrase: &[&str]| words.windows(phrase.len()).any(|w| w == phrase);

    if has("canister") {
        Some(FilterType::Canister)
    } else if has("sponge") {
        Some(FilterType::Sponge)
    } else if has("ugf") || has("undergravel") || has_phrase(&["under", "gravel"][..]) {
        Some(FilterType::Ugf)
    } else if has("internal") {
        Some(FilterType::Internal)
    } else if has("hob")
        || has_phrase(&["hang", "on", "back"][..])
        || has_phrase(&["power", "filter"][..])
    {
        Some(FilterType::Hob)
    } else {
        None
    }
}

fn identity(spec: &FilterSpec) -> String {
    spec.id
        .clone()
        .or_else(|| spec.name.clone())
        .unwrap_or_else(|| format!("custom:{}", spec.rated_gph))
}

/// Resolves a filter's type: explicit label, then name keywords, then HOB.
/// A fallback is reported once per unique filter identity within `diagnostics`.
pub fn resolve_type(
    spec: &FilterSpec,
    diagnostics: &mut Diagnostics,
) -> (FilterType, TypeResolution) {
    if let Some(found) = spec.kind.as_deref().and_then(parse_filter_type) {
        return (found, TypeResolution::Explicit);
    }
    if let Some(found) = spec.name.as_deref().and_then(infer_from_name) {
        return (found, TypeResolution::InferredFromName);
    }
    let subject = identity(spec);
    diagnostics.record(
        sanitize::FILTER_TYPE_FALLBACK,
        &subject,
        format!(
            "filter '{}' has no recognizable type ({}); treating it as HOB",
            subject,
            spec.kind.as_deref().unwrap_or("unspecified")
        ),
    );
    (FilterType::Hob, TypeResolution::Fallback)
}

/// Normalizes a batch of caller-supplied filters.
pub fn resolve_filters(specs: &[FilterSpec], diagnostics: &mut Diagnostics) -> Vec<ResolvedFilter> {
    specs
        .iter()
        .map(|spec| {
            let (filter_type, resolution) = resolve_type(spec, diagnostics);
            let label = identity(spec);
            let subject = format!("filter '{}' rated_gph", label);
            let rated_gph = sanitize::non_negative(spec.rated_gph, &subject, diagnostics);
            ResolvedFilter {
                id: spec.id.clone(),
                label,
                filter_type,
                resolution,
                rated_gph,
                source: spec.source,
            }
        })
        .collect()
}

pub fn derated_flow(rated_gph: f64, config: &EngineConfig) -> f64 {
    rated_gph * config.flow_derate
}

/// Tank volumes per hour. Volumes below one gallon are treated as one.
pub fn turnover(total_derated_gph: f64, gallons: f64) -> f64 {
    total_derated_gph / gallons.max(1.0)
}

pub fn base_efficiency(filter_type: FilterType) -> f64 {
    match filter_type {
        FilterType::Canister => constants::BASE_EFFICIENCY_CANISTER,
        FilterType::Hob => constants::BASE_EFFICIENCY_HOB,
        FilterType::Internal => constants::BASE_EFFICIENCY_INTERNAL,
        FilterType::Ugf => constants::BASE_EFFICIENCY_UGF,
        FilterType::Sponge => constants::BASE_EFFICIENCY_SPONGE,
    }
}

pub fn turnover_factor(turnover: f64) -> f64 {
    (turnover / constants::TURNOVER_PIVOT)
        .clamp(constants::TURNOVER_FACTOR_MIN, constants::TURNOVER_FACTOR_MAX)
}

pub fn filter_efficiency(filter_type: FilterType, turnover: f64) -> f64 {
    (base_efficiency(filter_type) * turnover_factor(turnover))
        .clamp(0.0, constants::MAX_FILTER_EFFICIENCY)
}

/// Multiplicative aggregation: each filter removes a share of what is left.
pub fn combine_relief(efficiencies: &[f64], config: &EngineConfig) -> Relief {
    if efficiencies.is_empty() {
        return Relief::default();
    }
    let remaining: f64 = efficiencies.iter().map(|eff| 1.0 - eff).product();
    let raw = 1.0 - remaining;
    Relief {
        raw,
        combined: raw.clamp(0.0, config.max_relief),
    }
}

/// Full breakdown for a set of resolved filters on `gallons` of water.
/// A valid `turnover_override` replaces the derived turnover when filters exist.
pub fn summarize(
    filters: &[ResolvedFilter],
    gallons: f64,
    turnover_override: Option<f64>,
    config: &EngineConfig,
) -> FiltrationSummary {
    if filters.is_empty() {
        return FiltrationSummary::default();
    }
    let total_rated_gph: f64 = filters.iter().map(|f| f.rated_gph).sum();
    let total_derated_gph: f64 = filters.iter().map(|f| derated_flow(f.rated_gph, config)).sum();
    let rate = turnover_override.unwrap_or_else(|| turnover(total_derated_gph, gallons));
    let factor = turnover_factor(rate);

    let breakdown: Vec<FilterBreakdown> = filters
        .iter()
        .map(|f| FilterBreakdown {
            label: f.label.clone(),
            filter_type: f.filter_type,
            resolution: f.resolution,
            source: f.source,
            rated_gph: f.rated_gph,
            derated_gph: derated_flow(f.rated_gph, config),
            base_efficiency: base_efficiency(f.filter_type),
            turnover_factor: factor,
            efficiency: filter_efficiency(f.filter_type, rate),
        })
        .collect();
    let efficiencies: Vec<f64> = breakdown.iter().map(|b| b.efficiency).collect();

    FiltrationSummary {
        relief: combine_relief(&efficiencies, config),
        filters: breakdown,
        total_rated_gph,
        total_derated_gph,
        turnover: rate,
    }
}
