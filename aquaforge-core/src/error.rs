use thiserror::Error;

#[derive(Debug, Error)]
pub enum AquaforgeError {
    #[error("Species '{0}' not found in the active catalog")]
    SpeciesNotFound(String),

    #[error("Scenario '{0}' not found")]
    ScenarioNotFound(String),

    #[error("Tank context is missing")]
    TankNotDefined,

    #[error("Water profile is missing")]
    WaterNotDefined,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse YAML from '{0}': {1}")]
    YamlParsing(String, #[source] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),
}
