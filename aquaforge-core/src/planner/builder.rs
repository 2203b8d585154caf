use crate::error::AquaforgeError;
use aquaforge_schemas::{
    filter::FilterSpec,
    plan::{PlanOverrides, StockingPlan},
    stock::StockEntry,
    tank::TankContext,
    water::WaterProfile,
};

/// A fluent builder for constructing a `StockingPlan`.
///
/// Tank and water are required; stock, filters and the candidate start empty.
#[derive(Default)]
pub struct PlanBuilder {
    tank: Option<TankContext>,
    water: Option<WaterProfile>,
    stock: Vec<StockEntry>,
    filters: Vec<FilterSpec>,
    candidate: Option<StockEntry>,
    beginner_mode: bool,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing plan so individual fields can be replaced.
    pub fn from_plan(plan: StockingPlan) -> Self {
        Self {
            tank: Some(plan.tank),
            water: Some(plan.water),
            stock: plan.stock,
            filters: plan.filters,
            candidate: plan.candidate,
            beginner_mode: plan.beginner_mode,
        }
    }

    pub fn with_tank(mut self, tank: TankContext) -> Self {
        self.tank = Some(tank);
        self
    }

    pub fn with_water(mut self, water: WaterProfile) -> Self {
        self.water = Some(water);
        self
    }

    pub fn with_stock(mut self, stock: Vec<StockEntry>) -> Self {
        self.stock = stock;
        self
    }

    pub fn add_stock(mut self, entry: StockEntry) -> Self {
        self.stock.push(entry);
        self
    }

    pub fn with_filters(mut self, filters: Vec<FilterSpec>) -> Self {
        self.filters = filters;
        self
    }

    pub fn add_filter(mut self, filter: FilterSpec) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_candidate(mut self, candidate: StockEntry) -> Self {
        self.candidate = Some(candidate);
        self
    }

    pub fn without_candidate(mut self) -> Self {
        self.candidate = None;
        self
    }

    pub fn beginner_mode(mut self, enabled: bool) -> Self {
        self.beginner_mode = enabled;
        self
    }

    /// # Errors
    ///
    /// Returns an `AquaforgeError` if the tank or the water profile was never set.
    pub fn build(self) -> Result<StockingPlan, AquaforgeError> {
        Ok(StockingPlan {
            tank: self.tank.ok_or(AquaforgeError::TankNotDefined)?,
            water: self.water.ok_or(AquaforgeError::WaterNotDefined)?,
            stock: self.stock,
            filters: self.filters,
            candidate: self.candidate,
            beginner_mode: self.beginner_mode,
        })
    }
}

/// Copies `base` and applies `overrides`: field replacements first, then the
/// `add_*` lists. The base plan is left untouched.
pub fn apply_overrides(base: &StockingPlan, overrides: &PlanOverrides) -> StockingPlan {
    let mut plan = base.clone();

    if let Some(gallons) = overrides.gallons {
        plan.tank.gallons = gallons;
    }
    if let Some(planted) = overrides.planted {
        plan.tank.planted = planted;
    }
    if let Some(sump) = overrides.sump_gallons {
        plan.tank.sump_gallons = sump;
    }
    if overrides.turnover_override.is_some() {
        plan.tank.turnover_override = overrides.turnover_override;
    }
    if overrides.length_in.is_some() {
        plan.tank.length_in = overrides.length_in;
    }
    if let Some(water) = &overrides.water {
        plan.water = water.clone();
    }
    if let Some(stock) = &overrides.stock {
        plan.stock = stock.clone();
    }
    if let Some(filters) = &overrides.filters {
        plan.filters = filters.clone();
    }
    if overrides.clear_candidate {
        plan.candidate = None;
    }
    if let Some(candidate) = &overrides.candidate {
        plan.candidate = Some(candidate.clone());
    }
    if let Some(beginner_mode) = overrides.beginner_mode {
        plan.beginner_mode = beginner_mode;
    }

    plan.stock.extend(overrides.add_stock.iter().cloned());
    plan.filters.extend(overrides.add_filters.iter().cloned());
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquaforge_schemas::filter::FilterType;

    fn base() -> StockingPlan {
        PlanBuilder::new()
            .with_tank(TankContext::new(20.0))
            .with_water(WaterProfile::default())
            .add_stock(StockEntry::new("cardinal", 12))
            .with_candidate(StockEntry::new("betta_male", 1))
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_requires_tank_and_water() {
        let missing_tank = PlanBuilder::new().with_water(WaterProfile::default()).build();
        assert!(matches!(missing_tank, Err(AquaforgeError::TankNotDefined)));

        let missing_water = PlanBuilder::new().with_tank(TankContext::new(10.0)).build();
        assert!(matches!(missing_water, Err(AquaforgeError::WaterNotDefined)));
    }

    #[test]
    fn test_overrides_replace_then_append() {
        let plan = base();
        let overrides = PlanOverrides {
            gallons: Some(29.0),
            planted: Some(true),
            stock: Some(vec![StockEntry::new("neon", 8)]),
            add_stock: vec![StockEntry::new("cory_panda", 6)],
            add_filters: vec![FilterSpec::product("hob-200", FilterType::Hob, 200.0)],
            clear_candidate: true,
            ..PlanOverrides::default()
        };
        let varied = apply_overrides(&plan, &overrides);

        assert_eq!(varied.tank.gallons, 29.0);
        assert!(varied.tank.planted);
        let ids: Vec<&str> = varied.stock.iter().map(|e| e.species_id.as_str()).collect();
        assert_eq!(ids, vec!["neon", "cory_panda"]);
        assert_eq!(varied.filters.len(), 1);
        assert!(varied.candidate.is_none());

        // Base is unchanged.
        assert_eq!(plan.tank.gallons, 20.0);
        assert_eq!(plan.stock.len(), 1);
        assert!(plan.candidate.is_some());
    }

    #[test]
    fn test_from_plan_round_trips_fields() {
        let plan = base();
        let rebuilt = PlanBuilder::from_plan(plan.clone()).beginner_mode(true).build().unwrap();
        assert_eq!(rebuilt.stock, plan.stock);
        assert!(rebuilt.beginner_mode);
    }
}
