use crate::{constants, error::AquaforgeError};
use serde::{Deserialize, Serialize};

/// Tunable constants for one engine instance. `Default` yields the canonical set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub flow_derate: f64,
    pub max_relief: f64,
    pub displacement: f64,
    pub planted_bonus: f64,
    pub juvenile_multiplier: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            flow_derate: constants::FLOW_DERATE,
            max_relief: constants::MAX_RELIEF,
            displacement: constants::DISPLACEMENT,
            planted_bonus: constants::PLANTED_BONUS,
            juvenile_multiplier: constants::JUVENILE_MULTIPLIER,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(source: &str, yaml: &str) -> Result<Self, AquaforgeError> {
        let config: EngineConfig = serde_yaml::from_str(yaml)
            .map_err(|e| AquaforgeError::YamlParsing(source.to_string(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AquaforgeError> {
        let checks = [
            ("flow_derate", self.flow_derate, f64::MIN_POSITIVE, 1.0),
            ("max_relief", self.max_relief, 0.0, 0.95),
            ("displacement", self.displacement, 0.0, 0.9),
            ("planted_bonus", self.planted_bonus, 0.0, 0.5),
            ("juvenile_multiplier", self.juvenile_multiplier, 0.0, 1.0),
        ];
        for (name, value, lo, hi) in checks {
            if !value.is_finite() || value < lo || value > hi {
                return Err(AquaforgeError::ConfigError(format!(
                    "{} must be within [{}, {}], got {}",
                    name, lo, hi, value
                )));
            }
        }
        Ok(())
    }
}
