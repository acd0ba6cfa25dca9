use anyhow::{bail, Context};
use bioturbation::config::load_scenarios;
use bioturbation::orchestrator::{ExportOptions, Orchestrator};
use bioturbation::soil::{ProfileId, SoilProfile};
use bioturbation::store::{MemoryProfileStore, MemoryResultStore};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bioturbation")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Earthworm bioturbation of contaminants through soil layers.")]
struct CommandLine {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate every scenario in a JSON file and export the series
    #[command(alias = "r")]
    Run {
        config: PathBuf,
        /// Directory the CSV/JSON series are written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Also write each series as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check a scenario file without running anything
    #[command(alias = "v")]
    Validate { config: PathBuf },
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse();
    init_logging();

    match commands.command {
        Commands::Run {
            config,
            out_dir,
            json,
        } => run(config, out_dir, json),
        Commands::Validate { config } => validate(config),
    }
}

fn run(config: PathBuf, out_dir: PathBuf, json: bool) -> anyhow::Result<()> {
    let profiles = MemoryProfileStore::new();
    let results = MemoryResultStore::new();
    let orchestrator = Orchestrator::new(&profiles, &results, ExportOptions { out_dir, json });

    let reports = orchestrator
        .process_file(&config)
        .with_context(|| format!("loading {}", config.display()))?;
    let total = reports.len();

    let mut failed = 0;
    for (index, result) in reports.into_iter().enumerate() {
        let label = format!("scenario {}", index + 1);
        match result {
            Ok(report) => {
                let status = if report.outcome.converged {
                    "converged".green()
                } else {
                    "budget exhausted".yellow()
                };
                println!(
                    "{} {} {} after {} iterations (simulation {})",
                    "ok".green().bold(),
                    label,
                    status,
                    report.outcome.iterations,
                    report.outcome.simulation_id
                );
                for file in &report.files {
                    println!("   {}", file.display().to_string().dimmed());
                }
            }
            Err(err) => {
                failed += 1;
                println!("{} {} {}", "failed".red().bold(), label, err);
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {total} scenarios failed");
    }
    Ok(())
}

fn validate(config: PathBuf) -> anyhow::Result<()> {
    let scenarios = load_scenarios(&config)
        .with_context(|| format!("loading {}", config.display()))?;

    let mut failed = 0;
    for (index, scenario) in scenarios.iter().enumerate() {
        match SoilProfile::from_input(ProfileId(0), &scenario.profile) {
            Ok(profile) => println!(
                "{} scenario {} {} with {} layers",
                "valid".green().bold(),
                index + 1,
                profile.model,
                profile.layers.len()
            ),
            Err(err) => {
                failed += 1;
                println!("{} scenario {} {}", "invalid".red().bold(), index + 1, err);
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} scenarios are invalid", scenarios.len());
    }
    Ok(())
}
