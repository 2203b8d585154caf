use anyhow::{Context, Result};
use aquaforge_core::{catalog::SpeciesCatalog, config::EngineConfig};
use aquaforge_schemas::{
    file_formats::{Scenario, ScenarioFile, SpeciesFile},
    species::SpeciesDraft,
};
use std::{collections::BTreeMap, fs, path::Path};
use tracing::{info, warn};

/// Everything loaded from disk for one run.
pub struct Workspace {
    pub catalog: SpeciesCatalog,
    pub engine_config: EngineConfig,
    pub scenarios: BTreeMap<String, Scenario>,
}

impl Workspace {
    /// Built-in catalog layered with any species files in `species_dir`, plus
    /// the scenarios found in `scenario_dir`.
    pub fn load(
        species_dir: Option<&Path>,
        scenario_dir: Option<&Path>,
        config_path: Option<&Path>,
    ) -> Result<Self> {
        let catalog = load_catalog(species_dir)?;
        let engine_config = load_engine_config(config_path)?;
        let scenarios = match scenario_dir {
            Some(dir) => load_scenarios(dir)?,
            None => BTreeMap::new(),
        };
        info!(
            species = catalog.len(),
            rejected = catalog.rejects().len(),
            scenarios = scenarios.len(),
            "workspace loaded"
        );
        Ok(Self {
            catalog,
            engine_config,
            scenarios,
        })
    }
}

pub fn load_catalog(species_dir: Option<&Path>) -> Result<SpeciesCatalog> {
    let builtin = SpeciesCatalog::builtin();
    let Some(dir) = species_dir else {
        return Ok(builtin.clone());
    };
    println!("Loading species files from '{}'...", dir.display());
    let drafts: Vec<SpeciesDraft> = load_yaml_files(dir, |file: SpeciesFile| file.species)?
        .into_iter()
        .map(|(_, draft)| draft)
        .collect();
    Ok(builtin.extended_with(drafts))
}

pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read engine config: {:?}", path))?;
    let config = EngineConfig::from_yaml_str(&path.display().to_string(), &content)?;
    Ok(config)
}

/// Scenarios keyed by name. A later file replaces an earlier scenario of the same name.
pub fn load_scenarios(dir: &Path) -> Result<BTreeMap<String, Scenario>> {
    println!("Loading scenarios from '{}'...", dir.display());
    let mut map = BTreeMap::new();
    for (source, scenario) in load_yaml_files(dir, |file: ScenarioFile| file.scenarios)? {
        let name = scenario.name.clone();
        if map.insert(name.clone(), scenario).is_some() {
            warn!(scenario = %name, file = %source, "scenario redefined; keeping the later one");
        }
    }
    Ok(map)
}

/// Reads every YAML file in a directory, in file-name order, and flattens
/// the items each file wrapper holds. Items are tagged with their source file.
fn load_yaml_files<P, F, E, T>(dir_path: P, extract_vec: E) -> Result<Vec<(String, T)>>
where
    P: AsRef<Path>,
    F: for<'de> serde::Deserialize<'de>, // The file wrapper struct (e.g., ScenarioFile)
    E: Fn(F) -> Vec<T>,                  // A closure to extract the Vec<T> from the wrapper
{
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir_path.as_ref())
        .with_context(|| format!("Failed to read directory: {:?}", dir_path.as_ref()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |s| s == "yaml" || s == "yml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut items = Vec::new();
    for path in paths {
        let content = fs::read_to_string(&path)?;
        let file_wrapper: F = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {:?}", path))?;
        let source = path.display().to_string();
        items.extend(extract_vec(file_wrapper).into_iter().map(|item| (source.clone(), item)));
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SCENARIOS: &str = r#"
schema_version: "1.0"
scenarios:
  - name: starter
    plan:
      tank: { gallons: 20 }
      stock:
        - { species_id: cardinal, quantity: 12 }
"#;

    #[test]
    fn test_scenarios_load_from_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.yaml"), SCENARIOS).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let scenarios = load_scenarios(dir.path()).unwrap();
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios["starter"].plan.stock.len(), 1);
    }

    #[test]
    fn test_species_dir_extends_builtin_catalog() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("extra.yml"),
            r#"
schema_version: "1.0"
species:
  - id: glowlight
    common_name: Glowlight Tetra
    category: fish
    temperature_f: { min: 74, max: 82 }
    ph: { min: 5.8, max: 7.5 }
    gh: { min: 2, max: 15 }
    kh: { min: 1, max: 8 }
    salinity: fresh
    flow: low
    blackwater: neutral
    aggression: 10
    bioload_unit: 0.15
  - id: Broken Row
    common_name: Nope
"#,
        )
        .unwrap();

        let catalog = load_catalog(Some(dir.path())).unwrap();
        assert!(catalog.get("glowlight").is_some());
        assert!(catalog.get("cardinal").is_some());
        assert_eq!(catalog.len(), SpeciesCatalog::builtin().len() + 1);
        assert!(catalog.rejects().len() > SpeciesCatalog::builtin().rejects().len());
    }

    #[test]
    fn test_bad_yaml_names_the_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.yaml"), "scenarios: [").unwrap();
        let err = load_scenarios(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.yaml"));
    }

    #[test]
    fn test_missing_config_path_uses_defaults() {
        assert_eq!(load_engine_config(None).unwrap(), EngineConfig::default());

        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.yaml");
        fs::write(&path, "planted_bonus: 0.2\n").unwrap();
        assert_eq!(load_engine_config(Some(&path)).unwrap().planted_bonus, 0.2);
    }
}
