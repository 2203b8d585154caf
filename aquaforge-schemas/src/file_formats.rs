use crate::{
    plan::{PlanOverrides, StockingPlan},
    species::SpeciesDraft,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SpeciesFile {
    pub schema_version: String,
    pub species: Vec<SpeciesDraft>,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioFile {
    pub schema_version: String,
    pub scenarios: Vec<Scenario>,
}

/// A named plan, optionally varied by overrides and checked against expectations.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub plan: StockingPlan,
    #[serde(default)]
    pub overrides: Option<PlanOverrides>,
    #[serde(default)]
    pub expect: Option<Expectation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Expectation {
    /// Expected proposed bioload percent.
    pub percent: Option<f64>,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Expected headline severity: "ok", "warn" or "bad".
    pub status: Option<String>,
    #[serde(default)]
    pub chips_contain: Vec<String>,
    pub blocked: Option<bool>,
}

fn default_tolerance() -> f64 {
    0.01
}
