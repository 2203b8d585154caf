//! The active species catalog: raw drafts in, validated records out.
//! A draft is accepted whole or excluded whole with a reason.

use crate::{constants, error::AquaforgeError};
use aquaforge_schemas::{
    file_formats::SpeciesFile,
    species::{
        BlackwaterNeed, Category, Flow, GroupRule, Salinity, SpeciesDraft, SpeciesRecord,
        ToleranceRange,
    },
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, error, warn};

const BUILTIN_SPECIES: &str = include_str!("../data/species.yaml");

/// A catalog row that failed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogReject {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct SpeciesCatalog {
    species: Vec<SpeciesRecord>,
    index: HashMap<String, usize>,
    rejects: Vec<CatalogReject>,
}

impl SpeciesCatalog {
    /// Validates every draft. Duplicate ids within one batch keep the first record.
    pub fn from_drafts<I: IntoIterator<Item = SpeciesDraft>>(drafts: I) -> Self {
        let mut catalog = Self::default();
        for (row, draft) in drafts.into_iter().enumerate() {
            match validate_draft(&draft, row) {
                Ok(record) if catalog.index.contains_key(&record.id) => {
                    catalog.reject(CatalogReject {
                        id: record.id,
                        reason: "duplicate id".to_string(),
                    });
                }
                Ok(record) => catalog.insert(record),
                Err(reject) => catalog.reject(reject),
            }
        }
        debug!(
            active = catalog.species.len(),
            rejected = catalog.rejects.len(),
            "species catalog validated"
        );
        catalog
    }

    pub fn from_yaml_str(source: &str, yaml: &str) -> Result<Self, AquaforgeError> {
        let file: SpeciesFile = serde_yaml::from_str(yaml)
            .map_err(|e| AquaforgeError::YamlParsing(source.to_string(), e))?;
        Ok(Self::from_drafts(file.species))
    }

    /// The catalog shipped with the crate, parsed once per process.
    pub fn builtin() -> &'static SpeciesCatalog {
        static BUILTIN: OnceLock<SpeciesCatalog> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            Self::from_yaml_str("builtin species.yaml", BUILTIN_SPECIES).unwrap_or_else(|e| {
                error!("built-in species table is unreadable: {}", e);
                let mut catalog = Self::default();
                catalog.reject(CatalogReject {
                    id: "<builtin>".to_string(),
                    reason: e.to_string(),
                });
                catalog
            })
        })
    }

    /// Layers additional drafts on top of this catalog. Valid records replace
    /// existing ones with the same id; invalid ones are added to the reject list.
    pub fn extended_with<I: IntoIterator<Item = SpeciesDraft>>(&self, drafts: I) -> Self {
        let mut catalog = self.clone();
        let layer = Self::from_drafts(drafts);
        for record in layer.species {
            if let Some(&slot) = catalog.index.get(&record.id) {
                debug!(id = %record.id, "species record overridden");
                catalog.species[slot] = record;
            } else {
                catalog.insert(record);
            }
        }
        catalog.rejects.extend(layer.rejects);
        catalog
    }

    pub fn get(&self, id: &str) -> Option<&SpeciesRecord> {
        self.index.get(id).map(|&slot| &self.species[slot])
    }

    pub fn require(&self, id: &str) -> Result<&SpeciesRecord, AquaforgeError> {
        self.get(id)
            .ok_or_else(|| AquaforgeError::SpeciesNotFound(id.to_string()))
    }

    pub fn species(&self) -> &[SpeciesRecord] {
        &self.species
    }

    pub fn rejects(&self) -> &[CatalogReject] {
        &self.rejects
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    fn insert(&mut self, record: SpeciesRecord) {
        self.index.insert(record.id.clone(), self.species.len());
        self.species.push(record);
    }

    fn reject(&mut self, reject: CatalogReject) {
        warn!(id = %reject.id, reason = %reject.reason, "species record excluded");
        self.rejects.push(reject);
    }
}

fn valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn required_range(
    range: Option<ToleranceRange<f64>>,
    field: &str,
) -> Result<ToleranceRange<f64>, String> {
    let range = range.ok_or_else(|| format!("missing {}", field))?;
    if !range.min.is_finite() || !range.max.is_finite() {
        return Err(format!("{} range is not finite", field));
    }
    if range.min >= range.max {
        return Err(format!(
            "{} range is out of order ({} ≥ {})",
            field, range.min, range.max
        ));
    }
    Ok(range)
}

fn optional_length(value: Option<f64>, field: &str) -> Result<Option<f64>, String> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => {
            Err(format!("{} must be a non-negative number", field))
        }
        other => Ok(other),
    }
}

fn parse_field<T>(value: &Option<String>, field: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = value.as_deref().ok_or_else(|| format!("missing {}", field))?;
    raw.parse::<T>().map_err(|e| e.to_string())
}

fn bioload_unit(draft: &SpeciesDraft) -> Result<f64, String> {
    if let Some(unit) = draft.bioload_unit {
        if unit.is_finite() && unit > 0.0 {
            return Ok(unit);
        }
        return Err(format!("bioload_unit must be positive, got {}", unit));
    }
    let size = draft
        .adult_size_in
        .ok_or_else(|| "missing bioload_unit and adult_size_in".to_string())?;
    if !size.is_finite() || size <= 0.0 {
        return Err(format!("adult_size_in must be positive, got {}", size));
    }
    let density = draft.density.unwrap_or(constants::DEFAULT_DENSITY);
    if !density.is_finite() || density <= 0.0 {
        return Err(format!("density must be positive, got {}", density));
    }
    Ok(size.powi(3) * density)
}

fn validate_group(group: &Option<GroupRule>) -> Result<(), String> {
    match group {
        Some(rule) if rule.min() == 0 => Err("group minimum must be at least 1".to_string()),
        Some(GroupRule::Harem { ratio: Some(ratio), .. }) if ratio.m == 0 || ratio.f == 0 => {
            Err("harem ratio terms must be positive".to_string())
        }
        _ => Ok(()),
    }
}

/// Validates one draft. `row` names anonymous drafts in the reject list.
/// Lowercases a tag, joins words with `_`, and folds spelling variants.
fn canonical_tag(raw: &str) -> String {
    let tag = raw
        .trim()
        .to_ascii_lowercase()
        .replace(['-', ' '], "_");
    match tag.as_str() {
        "longfin" | "long_fin" | "longfins" | "long_finned" => "long_fins".to_string(),
        "finnipper" | "fin_nipping" => "fin_nipper".to_string(),
        "finsensitive" => "fin_sensitive".to_string(),
        _ => tag,
    }
}

pub fn validate_draft(draft: &SpeciesDraft, row: usize) -> Result<SpeciesRecord, CatalogReject> {
    let label = draft
        .id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| format!("<row {}>", row));
    build_record(draft).map_err(|reason| CatalogReject { id: label, reason })
}

fn build_record(draft: &SpeciesDraft) -> Result<SpeciesRecord, String> {
    let id = draft.id.clone().ok_or_else(|| "missing id".to_string())?;
    if !valid_id(&id) {
        return Err(format!("id '{}' must match [a-z0-9_]+", id));
    }
    let common_name = draft
        .common_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| "missing common_name".to_string())?;

    let category: Category = parse_field(&draft.category, "category")?;
    let salinity: Salinity = parse_field(&draft.salinity, "salinity")?;
    if salinity == Salinity::Marine {
        return Err("marine species are not supported".to_string());
    }
    let flow: Flow = parse_field(&draft.flow, "flow")?;
    let blackwater: BlackwaterNeed = parse_field(&draft.blackwater, "blackwater")?;

    let aggression = draft.aggression.ok_or_else(|| "missing aggression".to_string())?;
    if !aggression.is_finite() || !(0.0..=100.0).contains(&aggression) {
        return Err(format!("aggression must be within 0–100, got {}", aggression));
    }

    validate_group(&draft.group)?;

    Ok(SpeciesRecord {
        temperature_f: required_range(draft.temperature_f, "temperature_f")?,
        ph: required_range(draft.ph, "ph")?,
        gh: required_range(draft.gh, "gh")?,
        kh: required_range(draft.kh, "kh")?,
        bioload_unit: bioload_unit(draft)?,
        min_tank_length_in: optional_length(draft.min_tank_length_in, "min_tank_length_in")?,
        mouth_size_in: optional_length(draft.mouth_size_in, "mouth_size_in")?,
        tags: draft
            .tags
            .iter()
            .map(|t| canonical_tag(t))
            .filter(|t| !t.is_empty())
            .collect(),
        invert_safe: draft.invert_safe.unwrap_or(false),
        ph_sensitive: draft.ph_sensitive.unwrap_or(false),
        group: draft.group.clone(),
        scientific_name: draft.scientific_name.clone(),
        id,
        common_name,
        category,
        salinity,
        flow,
        blackwater,
        aggression,
    })
}
