//! Bioload versus capacity.

use crate::{
    catalog::SpeciesCatalog,
    config::EngineConfig,
    constants,
    sanitize::{self, Diagnostics},
};
use aquaforge_schemas::{
    stock::{LifeStage, StockEntry},
    tank::TankContext,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TankDerivation {
    pub gallons: f64,
    pub sump_gallons: f64,
    /// Display volume plus sump; the volume filters have to turn over.
    pub water_gallons: f64,
    pub planted: bool,
    pub effective_gallons: f64,
    pub length_in: Option<f64>,
    pub turnover_override: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEntry {
    pub species_id: String,
    pub common_name: String,
    pub quantity: u32,
    pub stage: LifeStage,
    pub unit: f64,
    pub bioload: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Utilization {
    pub total_bioload: f64,
    pub relief: f64,
    pub adjusted_bioload: f64,
    pub capacity: f64,
    pub percent: f64,
}

/// Utilization before (`current`) and after (`proposed`) adding the candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BioloadSummary {
    pub current: Utilization,
    pub proposed: Utilization,
}

/// Capacity in gallon-equivalents after displacement and the planted bonus.
pub fn effective_gallons(gallons: f64, planted: bool, config: &EngineConfig) -> f64 {
    let wet = (gallons * (1.0 - config.displacement)).max(0.0);
    if planted {
        wet * (1.0 + config.planted_bonus)
    } else {
        wet
    }
}

pub fn derive_tank(
    tank: &TankContext,
    config: &EngineConfig,
    diagnostics: &mut Diagnostics,
) -> TankDerivation {
    let gallons = sanitize::non_negative(tank.gallons, "tank.gallons", diagnostics);
    let sump_gallons = sanitize::non_negative(tank.sump_gallons, "tank.sump_gallons", diagnostics);
    let water_gallons = gallons + sump_gallons;
    TankDerivation {
        gallons,
        sump_gallons,
        water_gallons,
        planted: tank.planted,
        effective_gallons: effective_gallons(water_gallons, tank.planted, config),
        length_in: sanitize::optional_non_negative(tank.length_in, "tank.length_in", diagnostics),
        turnover_override: sanitize::optional_non_negative(
            tank.turnover_override,
            "tank.turnover_override",
            diagnostics,
        ),
    }
}

pub fn stage_multiplier(stage: LifeStage, config: &EngineConfig) -> f64 {
    match stage {
        LifeStage::Adult => 1.0,
        LifeStage::Juvenile => config.juvenile_multiplier,
    }
}

pub fn entry_bioload(unit: f64, quantity: u32, stage: LifeStage, config: &EngineConfig) -> f64 {
    unit * f64::from(quantity) * stage_multiplier(stage, config)
}

/// Looks up one entry. Unknown species are skipped with a diagnostic.
pub fn resolve_entry(
    entry: &StockEntry,
    catalog: &SpeciesCatalog,
    config: &EngineConfig,
    diagnostics: &mut Diagnostics,
) -> Option<ResolvedEntry> {
    let Some(record) = catalog.get(&entry.species_id) else {
        diagnostics.record(
            sanitize::UNKNOWN_SPECIES,
            &entry.species_id,
            format!("species '{}' is not in the active catalog; ignoring it", entry.species_id),
        );
        return None;
    };
    let quantity = sanitize::quantity(entry.quantity, &entry.species_id, diagnostics);
    Some(ResolvedEntry {
        species_id: record.id.clone(),
        common_name: record.common_name.clone(),
        quantity,
        stage: entry.stage,
        unit: record.bioload_unit,
        bioload: entry_bioload(record.bioload_unit, quantity, entry.stage, config),
    })
}

pub fn resolve_entries(
    entries: &[StockEntry],
    catalog: &SpeciesCatalog,
    config: &EngineConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<ResolvedEntry> {
    entries
        .iter()
        .filter_map(|entry| resolve_entry(entry, catalog, config, diagnostics))
        .collect()
}

pub fn total_bioload<'a, I: IntoIterator<Item = &'a ResolvedEntry>>(entries: I) -> f64 {
    entries.into_iter().map(|e| e.bioload).sum()
}

/// `(adjusted / capacity) × 100`, clamped to [0, 200]. A vanishing capacity
/// saturates at the ceiling instead of dividing by zero.
pub fn percent_of_capacity(adjusted_bioload: f64, capacity: f64) -> f64 {
    if !adjusted_bioload.is_finite() || adjusted_bioload <= 0.0 {
        return 0.0;
    }
    let capacity = if capacity.is_nan() {
        constants::CAPACITY_FLOOR
    } else {
        capacity.max(constants::CAPACITY_FLOOR)
    };
    ((adjusted_bioload / capacity) * 100.0).clamp(0.0, constants::PERCENT_CEILING)
}

pub fn utilization(total_bioload: f64, capacity: f64, relief: f64) -> Utilization {
    let adjusted_bioload = total_bioload * (1.0 - relief);
    Utilization {
        total_bioload,
        relief,
        adjusted_bioload,
        capacity,
        percent: percent_of_capacity(adjusted_bioload, capacity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_effective_gallons_applies_displacement_and_bonus() {
        let config = EngineConfig::default();
        assert_relative_eq!(effective_gallons(20.0, false, &config), 18.0, epsilon = 1e-9);
        assert_relative_eq!(effective_gallons(20.0, true, &config), 19.8, epsilon = 1e-9);
        assert_eq!(effective_gallons(-5.0, true, &config), 0.0);
    }

    #[test]
    fn test_sump_adds_to_water_volume() {
        let mut diagnostics = Diagnostics::new();
        let mut tank = TankContext::new(40.0);
        tank.sump_gallons = 10.0;
        let derived = derive_tank(&tank, &EngineConfig::default(), &mut diagnostics);
        assert_eq!(derived.water_gallons, 50.0);
        assert_relative_eq!(derived.effective_gallons, 45.0, epsilon = 1e-9);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_invalid_tank_values_are_coerced() {
        let mut diagnostics = Diagnostics::new();
        let mut tank = TankContext::new(f64::NAN);
        tank.sump_gallons = -3.0;
        let derived = derive_tank(&tank, &EngineConfig::default(), &mut diagnostics);
        assert_eq!(derived.gallons, 0.0);
        assert_eq!(derived.sump_gallons, 0.0);
        assert_eq!(derived.effective_gallons, 0.0);
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_juvenile_entries_count_less() {
        let config = EngineConfig::default();
        assert_relative_eq!(entry_bioload(0.5, 4, LifeStage::Adult, &config), 2.0);
        assert_relative_eq!(
            entry_bioload(0.5, 4, LifeStage::Juvenile, &config),
            1.2,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_unknown_species_is_skipped() {
        let mut diagnostics = Diagnostics::new();
        let entries = vec![StockEntry::new("cardinal", 6), StockEntry::new("goldfish", 2)];
        let resolved = resolve_entries(
            &entries,
            SpeciesCatalog::builtin(),
            &EngineConfig::default(),
            &mut diagnostics,
        );
        assert_eq!(resolved.len(), 1);
        assert_relative_eq!(total_bioload(&resolved), 1.2, epsilon = 1e-9);
        assert_eq!(diagnostics.entries()[0].code, sanitize::UNKNOWN_SPECIES);
    }

    #[test]
    fn test_percent_without_relief_is_plain_ratio() {
        let usage = utilization(100.0, 100.0, 0.0);
        assert_eq!(usage.percent, 100.0);
        assert_eq!(usage.adjusted_bioload, 100.0);
    }

    #[test]
    fn test_percent_is_clamped() {
        assert_eq!(percent_of_capacity(500.0, 10.0), 200.0);
        assert_eq!(percent_of_capacity(3.0, 0.0), 200.0);
        assert_eq!(percent_of_capacity(0.0, 0.0), 0.0);
        assert_eq!(percent_of_capacity(f64::NAN, 10.0), 0.0);
        assert_eq!(percent_of_capacity(1.0, f64::NAN), 200.0);
        assert_eq!(percent_of_capacity(1.0, f64::INFINITY), 0.0);
    }
}
