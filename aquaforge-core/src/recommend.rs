//! Recommended water targets for the planned species.

use crate::{
    bioload::TankDerivation,
    compat::{
        conditions::{intersect, Band, Parameter},
        Member,
    },
    config::EngineConfig,
};
use aquaforge_schemas::species::{BlackwaterNeed, Flow, Salinity, ToleranceRange};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMode {
    /// Every species shares the band.
    Shared,
    /// pH band with a pH-sensitive species present.
    Strict,
    /// pH band trimmed from the union of tolerant species.
    Soft,
    /// Median of the species ranges when they do not overlap.
    Median,
    /// Nothing planned yet.
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterTarget {
    pub parameter: Parameter,
    /// `None` when no workable band exists; see `mismatches`.
    pub band: Option<ToleranceRange<f64>>,
    pub mode: TargetMode,
    /// Heater setpoint, temperature only.
    pub setpoint: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnoverTarget {
    pub min_turnover: f64,
    pub max_turnover: f64,
    /// Rated flow needed to reach the band once derated.
    pub min_rated_gph: f64,
    pub max_rated_gph: f64,
}

/// A parameter the planned species cannot share at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HardMismatch {
    pub parameter: Parameter,
    pub title: String,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentRecommendation {
    pub targets: Vec<ParameterTarget>,
    pub salinity: Salinity,
    pub flow: Flow,
    pub blackwater: BlackwaterNeed,
    pub turnover: TurnoverTarget,
    pub advisories: Vec<String>,
    pub mismatches: Vec<HardMismatch>,
}

/// Turnover band in tank volumes per hour for a plan's total bioload.
pub fn turnover_band(total_bioload: f64, planted: bool) -> (f64, f64) {
    let (lo, hi) = if total_bioload > 7.0 {
        (9.0, 10.0)
    } else if total_bioload >= 3.0 {
        (7.0, 8.0)
    } else {
        (6.0, 7.0)
    };
    if planted {
        (lo - 1.0, hi - 1.0)
    } else {
        (lo, hi)
    }
}

pub fn turnover_target(
    total_bioload: f64,
    tank: &TankDerivation,
    config: &EngineConfig,
) -> TurnoverTarget {
    let (min_turnover, max_turnover) = turnover_band(total_bioload, tank.planted);
    let rated = |band: f64| band * tank.water_gallons / config.flow_derate;
    TurnoverTarget {
        min_turnover,
        max_turnover,
        min_rated_gph: rated(min_turnover),
        max_rated_gph: rated(max_turnover),
    }
}

fn target(parameter: Parameter, min: f64, max: f64, mode: TargetMode) -> ParameterTarget {
    ParameterTarget {
        parameter,
        band: Some(ToleranceRange::new(min, max)),
        mode,
        setpoint: None,
    }
}

fn defaults(turnover: TurnoverTarget) -> EnvironmentRecommendation {
    let mut temperature = target(Parameter::Temperature, 74.0, 78.0, TargetMode::Default);
    temperature.setpoint = Some(76.0);
    EnvironmentRecommendation {
        targets: vec![
            temperature,
            target(Parameter::Ph, 6.5, 7.5, TargetMode::Default),
            target(Parameter::Gh, 4.0, 12.0, TargetMode::Default),
            target(Parameter::Kh, 2.0, 8.0, TargetMode::Default),
        ],
        salinity: Salinity::Fresh,
        flow: Flow::Moderate,
        blackwater: BlackwaterNeed::Neutral,
        turnover,
        advisories: vec!["Defaults shown. Add species to refine.".to_string()],
        mismatches: Vec::new(),
    }
}

fn median_band(ranges: &[ToleranceRange<f64>]) -> (f64, f64) {
    let mut mins: Vec<f64> = ranges.iter().map(|r| r.min).collect();
    let mut maxs: Vec<f64> = ranges.iter().map(|r| r.max).collect();
    mins.sort_by(f64::total_cmp);
    maxs.sort_by(f64::total_cmp);
    let lo = mins[mins.len() / 2].round();
    let hi = (lo + 1.0).max(maxs[maxs.len() / 2]).round();
    (lo, hi)
}

fn describe(members: &[Member<'_>], parameter: Parameter) -> Vec<String> {
    members
        .iter()
        .map(|m| {
            let range = parameter.range_of(m.record);
            format!("{} ({:.1}–{:.1}{})", m.name(), range.min, range.max, parameter.unit())
        })
        .collect()
}

fn temperature_target(
    members: &[Member<'_>],
    mismatches: &mut Vec<HardMismatch>,
) -> ParameterTarget {
    let parameter = Parameter::Temperature;
    match intersect(members.iter().map(|m| parameter.range_of(m.record))) {
        Some(Band::Shared { min, max }) => ParameterTarget {
            setpoint: Some(((min + max) / 2.0).round()),
            ..target(parameter, min, max, TargetMode::Shared)
        },
        _ => {
            mismatches.push(HardMismatch {
                parameter,
                title: "Not compatible: no shared temperature range".to_string(),
                details: describe(members, parameter),
            });
            ParameterTarget {
                parameter,
                band: None,
                mode: TargetMode::Shared,
                setpoint: None,
            }
        }
    }
}

fn ph_target(members: &[Member<'_>], mismatches: &mut Vec<HardMismatch>) -> ParameterTarget {
    let parameter = Parameter::Ph;
    let sensitive = members.iter().any(|m| m.record.ph_sensitive);
    let mode = if sensitive { TargetMode::Strict } else { TargetMode::Soft };
    let ranges: Vec<ToleranceRange<f64>> =
        members.iter().map(|m| parameter.range_of(m.record)).collect();
    match intersect(ranges.iter().copied()) {
        Some(Band::Shared { min, max }) => target(parameter, min, max, mode),
        _ if sensitive => {
            mismatches.push(HardMismatch {
                parameter,
                title: "Not compatible: a pH-sensitive species needs an overlapping pH range"
                    .to_string(),
                details: describe(members, parameter),
            });
            ParameterTarget {
                parameter,
                band: None,
                mode,
                setpoint: None,
            }
        }
        _ => {
            let lo = ranges.iter().map(|r| r.min).fold(f64::INFINITY, f64::min);
            let hi = ranges.iter().map(|r| r.max).fold(f64::NEG_INFINITY, f64::max);
            let trim = (hi - lo) * 0.25;
            target(parameter, lo + trim, hi - trim, mode)
        }
    }
}

fn hardness_target(members: &[Member<'_>], parameter: Parameter) -> ParameterTarget {
    let ranges: Vec<ToleranceRange<f64>> =
        members.iter().map(|m| parameter.range_of(m.record)).collect();
    match intersect(ranges.iter().copied()) {
        Some(Band::Shared { min, max }) => target(parameter, min, max, TargetMode::Shared),
        _ => {
            let (lo, hi) = median_band(&ranges);
            target(parameter, lo, hi, TargetMode::Median)
        }
    }
}

/// Salinity that satisfies the most brackish-leaning species; dual-tolerant
/// species accept whatever the rest need.
fn recommended_salinity(members: &[Member<'_>]) -> Salinity {
    let dual_only = members.iter().all(|m| m.record.salinity == Salinity::Dual);
    if dual_only {
        return Salinity::Dual;
    }
    members
        .iter()
        .map(|m| match m.record.salinity {
            Salinity::Fresh | Salinity::Dual => Salinity::Fresh,
            other => other,
        })
        .max_by_key(|s| match s {
            Salinity::Fresh | Salinity::Dual => 0,
            Salinity::BrackishLow => 1,
            Salinity::BrackishHigh => 2,
            Salinity::Marine => 3,
        })
        .unwrap_or(Salinity::Fresh)
}

/// Targets for `members` in `tank`, with turnover sized to `total_bioload`.
pub fn environment(
    members: &[Member<'_>],
    tank: &TankDerivation,
    total_bioload: f64,
    config: &EngineConfig,
) -> EnvironmentRecommendation {
    let turnover = turnover_target(total_bioload, tank, config);
    if members.is_empty() {
        return defaults(turnover);
    }

    let mut mismatches = Vec::new();
    let mut advisories = Vec::new();
    let targets = vec![
        temperature_target(members, &mut mismatches),
        ph_target(members, &mut mismatches),
        hardness_target(members, Parameter::Gh),
        hardness_target(members, Parameter::Kh),
    ];

    let has_fresh = members.iter().any(|m| m.record.salinity == Salinity::Fresh);
    let has_brackish = members
        .iter()
        .any(|m| matches!(m.record.salinity, Salinity::BrackishLow | Salinity::BrackishHigh));
    if has_fresh && has_brackish {
        advisories.push(
            "Mixed freshwater/brackish stock; target brackish-low or use dual-tolerant species."
                .to_string(),
        );
    }

    let shared_min = |parameter: Parameter| {
        targets
            .iter()
            .find(|t| t.parameter == parameter && t.mode == TargetMode::Shared)
            .and_then(|t| t.band)
            .map(|b| b.min)
    };
    if let (Some(gh), Some(kh)) = (shared_min(Parameter::Gh), shared_min(Parameter::Kh)) {
        if gh < 3.0 && kh < 2.0 {
            advisories.push("Very soft water; avoid large, rapid pH changes.".to_string());
        }
    }

    let flow = members.iter().map(|m| m.record.flow).max().unwrap_or(Flow::Moderate);
    if flow == Flow::High && members.iter().any(|m| m.record.has_tag("fin_sensitive")) {
        advisories.push(
            "High flow recommended; provide calm eddies for long or fragile fins.".to_string(),
        );
    }

    let blackwater = if members.iter().any(|m| m.record.blackwater == BlackwaterNeed::Requires) {
        BlackwaterNeed::Requires
    } else if members.iter().any(|m| m.record.blackwater == BlackwaterNeed::Prefers) {
        BlackwaterNeed::Prefers
    } else {
        BlackwaterNeed::Neutral
    };

    EnvironmentRecommendation {
        targets,
        salinity: recommended_salinity(members),
        flow,
        blackwater,
        turnover,
        advisories,
        mismatches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::test_support::Fixture;
    use approx::assert_relative_eq;
    use aquaforge_schemas::tank::TankContext;

    fn recommend(fixture: &Fixture, total_bioload: f64) -> EnvironmentRecommendation {
        let ctx = fixture.context();
        environment(&ctx.combined, &fixture.tank, total_bioload, &EngineConfig::default())
    }

    #[test]
    fn test_turnover_bands() {
        assert_eq!(turnover_band(1.0, false), (6.0, 7.0));
        assert_eq!(turnover_band(3.0, false), (7.0, 8.0));
        assert_eq!(turnover_band(7.5, false), (9.0, 10.0));
        assert_eq!(turnover_band(7.5, true), (8.0, 9.0));
    }

    #[test]
    fn test_rated_flow_accounts_for_derate() {
        let fixture = Fixture::new(&[], None, TankContext::new(20.0));
        let target = turnover_target(2.9, &fixture.tank, &EngineConfig::default());
        assert_relative_eq!(target.min_rated_gph, 6.0 * 20.0 / 0.65, epsilon = 1e-9);
        assert_relative_eq!(target.max_rated_gph, 7.0 * 20.0 / 0.65, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_plan_gets_defaults() {
        let fixture = Fixture::new(&[], None, TankContext::new(20.0));
        let rec = recommend(&fixture, 0.0);
        assert_eq!(rec.targets[0].setpoint, Some(76.0));
        assert!(rec.targets.iter().all(|t| t.mode == TargetMode::Default));
        assert_eq!(rec.advisories.len(), 1);
    }

    #[test]
    fn test_shared_bands_and_setpoint() {
        let stock = [("cardinal", 12), ("betta_male", 1)];
        let fixture = Fixture::new(&stock, None, TankContext::new(20.0));
        let rec = recommend(&fixture, 2.9);
        let temperature = &rec.targets[0];
        let band = temperature.band.unwrap();
        assert_eq!(temperature.mode, TargetMode::Shared);
        assert!(band.min <= band.max);
        assert_eq!(temperature.setpoint, Some(((band.min + band.max) / 2.0).round()));
        assert_eq!(rec.targets[1].mode, TargetMode::Strict);
        assert_eq!(rec.blackwater, BlackwaterNeed::Prefers);
        assert_eq!(rec.flow, Flow::Low);
        assert!(rec.mismatches.is_empty());
    }

    #[test]
    fn test_temperature_conflict_is_a_hard_mismatch() {
        let fixture = Fixture::new(&[("zebra", 6), ("pgourami", 2)], None, TankContext::new(40.0));
        let rec = recommend(&fixture, 3.0);
        assert!(rec.targets[0].band.is_none());
        assert_eq!(rec.mismatches.len(), 1);
        assert_eq!(rec.mismatches[0].details.len(), 2);
    }

    #[test]
    fn test_brackish_target_and_mixed_advisory() {
        let stock = [("bumblebee_goby", 6), ("nerite", 2), ("guppy_male", 3)];
        let fixture = Fixture::new(&stock, None, TankContext::new(20.0));
        let rec = recommend(&fixture, 1.0);
        assert_eq!(rec.salinity, Salinity::BrackishLow);
        assert!(rec.advisories.iter().any(|a| a.starts_with("Mixed freshwater/brackish")));

        let snails = Fixture::new(&[("nerite", 2)], None, TankContext::new(10.0));
        assert_eq!(recommend(&snails, 0.2).salinity, Salinity::Dual);
    }

    #[test]
    fn test_high_flow_with_fin_sensitive_species() {
        let stock = [("zebra", 6), ("betta_female", 1)];
        let fixture = Fixture::new(&stock, None, TankContext::new(29.0));
        let rec = recommend(&fixture, 2.0);
        assert_eq!(rec.flow, Flow::High);
        assert!(rec.advisories.iter().any(|a| a.starts_with("High flow recommended")));
    }

    #[test]
    fn test_median_band_never_inverts() {
        let ranges = [
            ToleranceRange::new(2.0, 4.0),
            ToleranceRange::new(10.0, 15.0),
            ToleranceRange::new(12.0, 20.0),
        ];
        let (lo, hi) = median_band(&ranges);
        assert_eq!(lo, 10.0);
        assert_eq!(hi, 15.0);
        let (lo, hi) = median_band(&[ToleranceRange::new(8.0, 6.0)]);
        assert!(hi > lo);
    }
}
