use crate::{filter::FilterSpec, stock::StockEntry, tank::TankContext, water::WaterProfile};
use serde::{Deserialize, Serialize};

/// Everything the advisor needs to evaluate one tank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockingPlan {
    pub tank: TankContext,
    #[serde(default)]
    pub water: WaterProfile,
    #[serde(default)]
    pub stock: Vec<StockEntry>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    /// An entry being considered for addition, evaluated against `stock`.
    #[serde(default)]
    pub candidate: Option<StockEntry>,
    #[serde(default)]
    pub beginner_mode: bool,
}

/// Field overrides applied on top of a base plan for what-if evaluation.
/// Replacements are applied first, then the `add_*` lists are appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanOverrides {
    pub gallons: Option<f64>,
    pub planted: Option<bool>,
    pub sump_gallons: Option<f64>,
    pub turnover_override: Option<f64>,
    pub length_in: Option<f64>,
    pub water: Option<WaterProfile>,
    pub stock: Option<Vec<StockEntry>>,
    pub filters: Option<Vec<FilterSpec>>,
    pub candidate: Option<StockEntry>,
    pub clear_candidate: bool,
    pub beginner_mode: Option<bool>,
    pub add_stock: Vec<StockEntry>,
    pub add_filters: Vec<FilterSpec>,
}
