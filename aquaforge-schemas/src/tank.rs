use serde::{Deserialize, Serialize};

/// Physical description of the display tank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankContext {
    pub gallons: f64,
    #[serde(default)]
    pub planted: bool,
    #[serde(default)]
    pub sump_gallons: f64,
    /// Caller-measured turnover (tank volumes per hour), used instead of the derived one.
    #[serde(default)]
    pub turnover_override: Option<f64>,
    /// Inside length of the tank in inches, used to ease territorial friction.
    #[serde(default)]
    pub length_in: Option<f64>,
}

impl TankContext {
    pub fn new(gallons: f64) -> Self {
        Self {
            gallons,
            planted: false,
            sump_gallons: 0.0,
            turnover_override: None,
            length_in: None,
        }
    }

    pub fn planted(mut self, planted: bool) -> Self {
        self.planted = planted;
        self
    }

    pub fn with_length(mut self, length_in: f64) -> Self {
        self.length_in = Some(length_in);
        self
    }
}
