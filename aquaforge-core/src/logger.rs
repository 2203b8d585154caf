use crate::analysis::ScenarioOutcome;
use crate::error::AquaforgeError;
use csv::Writer;
use serde::{Deserialize, Serialize};
use std::fs;

/// One row of the outcome log. Per-filter efficiencies are embedded as JSON.
#[derive(Debug, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub scenario: String,
    pub gallons: f64,
    pub planted: bool,
    pub filter_id: String,
    pub base_load: f64,
    pub total_rated_gph: f64,
    pub total_derated_gph: f64,
    pub turnover: f64,
    pub relief: f64,
    pub percent: f64,
    pub status: String,
    pub efficiencies_json: String,
}

pub struct OutcomeLogger {
    path: String,
    writer: Writer<fs::File>,
}

impl OutcomeLogger {
    pub fn new(path: &str) -> Result<Self, AquaforgeError> {
        let file = fs::File::create(path).map_err(|e| AquaforgeError::FileIO(path.to_string(), e))?;
        Ok(Self {
            path: path.to_string(),
            writer: Writer::from_writer(file),
        })
    }

    pub fn log_outcome(&mut self, outcome: &ScenarioOutcome) -> Result<(), AquaforgeError> {
        let efficiencies_json = serde_json::to_string(&outcome.efficiencies)?;

        let record = OutcomeRecord {
            scenario: outcome.key.clone(),
            gallons: outcome.gallons,
            planted: outcome.planted,
            filter_id: outcome.filter_id.to_string(),
            base_load: outcome.base_load,
            total_rated_gph: outcome.total_rated_gph,
            total_derated_gph: outcome.total_derated_gph,
            turnover: outcome.turnover,
            relief: outcome.relief,
            percent: outcome.percent,
            status: outcome.status.as_str().to_string(),
            efficiencies_json,
        };

        self.writer
            .serialize(record)
            .map_err(|e| AquaforgeError::CsvError(self.path.clone(), e))?;
        self.writer
            .flush()
            .map_err(|e| AquaforgeError::FileIO(self.path.clone(), e))?;
        Ok(())
    }

    pub fn log_all<'a, I>(&mut self, outcomes: I) -> Result<(), AquaforgeError>
    where
        I: IntoIterator<Item = &'a ScenarioOutcome>,
    {
        for outcome in outcomes {
            self.log_outcome(outcome)?;
        }
        Ok(())
    }
}
