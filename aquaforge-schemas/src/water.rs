use crate::species::{Flow, Salinity};
use serde::{Deserialize, Serialize};

/// Measured (or targeted) water chemistry of a tank. Temperature is in °F,
/// hardness in degrees (dGH / dKH).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterProfile {
    pub temperature_f: f64,
    pub ph: f64,
    pub gh: f64,
    pub kh: f64,
    pub salinity: Salinity,
    pub flow: Flow,
    #[serde(default)]
    pub blackwater: bool,
}

impl Default for WaterProfile {
    fn default() -> Self {
        Self {
            temperature_f: 76.0,
            ph: 7.0,
            gh: 8.0,
            kh: 4.0,
            salinity: Salinity::Fresh,
            flow: Flow::Moderate,
            blackwater: false,
        }
    }
}
