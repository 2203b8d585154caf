use anyhow::{bail, Context, Result};
use aquaforge_core::{error::AquaforgeError, planner::StockingEngine};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod config;
mod report;
mod suggest;
mod workflow;

#[derive(Parser)]
#[command(name = "aquaforge")]
#[command(about = "Aquarium stocking advisor: bioload, filtration and compatibility checks")]
struct Cli {
    /// Directory of extra species YAML files layered over the built-in catalog
    #[arg(long, global = true)]
    species_dir: Option<PathBuf>,

    /// Engine constants YAML
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Parent directory for timestamped run folders
    #[arg(long, global = true, default_value = "./data/runs")]
    output_dir: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate scenario files and check their expectations
    Evaluate {
        #[arg(long, default_value = "aquaforge-app/data/scenarios")]
        scenarios: PathBuf,
        /// Run a single scenario by name
        #[arg(long)]
        name: Option<String>,
    },
    /// Run the filtration crosscheck grid and guardrails
    Crosscheck,
    /// Run the seeded randomized property suite
    Stress {
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 500)]
        iterations: usize,
    },
    /// Rank catalog species that could join a scenario's plan
    Suggest {
        #[arg(long, default_value = "aquaforge-app/data/scenarios")]
        scenarios: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// List the active species catalog and rejected rows
    Catalog,
}

impl Command {
    fn label(&self) -> &'static str {
        match self {
            Command::Evaluate { .. } => "evaluate",
            Command::Crosscheck => "crosscheck",
            Command::Stress { .. } => "stress",
            Command::Suggest { .. } => "suggest",
            Command::Catalog => "catalog",
        }
    }

    fn scenario_dir(&self) -> Option<&Path> {
        match self {
            Command::Evaluate { scenarios, .. } | Command::Suggest { scenarios, .. } => {
                Some(scenarios)
            }
            _ => None,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    println!("--- Aquaforge Stocking Advisor ---");

    let workspace = config::Workspace::load(
        cli.species_dir.as_deref(),
        cli.command.scenario_dir(),
        cli.config.as_deref(),
    )?;
    let engine = StockingEngine::new(&workspace.catalog, workspace.engine_config.clone());

    let output_dir = cli.output_dir.join(format!(
        "{}_{}",
        cli.command.label(),
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    ));
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    match &cli.command {
        Command::Evaluate { name, .. } => {
            let runs = workflow::run_evaluations(
                &engine,
                &workspace.scenarios,
                name.as_deref(),
                &output_dir,
            )?;
            let failing = runs.iter().filter(|r| !r.case.passed()).count();
            if failing > 0 {
                bail!("{} scenario(s) did not meet expectations; see {:?}", failing, output_dir);
            }
        }
        Command::Crosscheck => {
            let report = workflow::run_crosscheck(&engine, &output_dir)?;
            if !report.passed() {
                bail!(
                    "{} scenario(s) failed guardrails; see {:?}",
                    report.failing_scenarios(),
                    output_dir
                );
            }
        }
        Command::Stress { seed, iterations } => {
            let report = workflow::run_stress(&engine, *seed, *iterations, &output_dir)?;
            if !report.passed() {
                bail!("{} stress check(s) failed; see {:?}", report.failures.len(), output_dir);
            }
        }
        Command::Suggest { name, limit, .. } => {
            let scenario = workspace
                .scenarios
                .get(name)
                .ok_or_else(|| AquaforgeError::ScenarioNotFound(name.clone()))?;
            let suggestions = suggest::suggest_candidates(&engine, &scenario.plan, *limit);
            report::write_json(&output_dir.join("suggestions.json"), &suggestions)?;
        }
        Command::Catalog => {
            println!("\nActive species ({}):", workspace.catalog.len());
            for record in workspace.catalog.species() {
                println!(
                    "  - {:<18} {:<28} {:<8} {:>5.3} GE",
                    record.id,
                    record.common_name,
                    record.category.as_str(),
                    record.bioload_unit
                );
            }
            if !workspace.catalog.rejects().is_empty() {
                println!("\nRejected rows ({}):", workspace.catalog.rejects().len());
                for reject in workspace.catalog.rejects() {
                    println!("  - {}: {}", reject.id, reject.reason);
                }
            }
            report::write_json(&output_dir.join("rejects.json"), workspace.catalog.rejects())?;
        }
    }

    println!("\nRun complete. Results are in '{}'", output_dir.display());
    Ok(())
}
