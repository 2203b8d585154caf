use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifeStage {
    #[default]
    Adult,
    Juvenile,
}

/// A planned group of one species. Quantity is signed so that bad input from
/// a caller can be observed and coerced rather than rejected at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEntry {
    pub species_id: String,
    pub quantity: i32,
    #[serde(default)]
    pub stage: LifeStage,
}

impl StockEntry {
    pub fn new(species_id: &str, quantity: i32) -> Self {
        Self {
            species_id: species_id.to_string(),
            quantity,
            stage: LifeStage::Adult,
        }
    }

    pub fn juvenile(species_id: &str, quantity: i32) -> Self {
        Self {
            stage: LifeStage::Juvenile,
            ..Self::new(species_id, quantity)
        }
    }
}
