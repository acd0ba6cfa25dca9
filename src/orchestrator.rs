//! Batch driver: create, simulate, store and export one scenario after another.

use crate::config::{load_scenarios, ScenarioConfig};
use crate::engine::{create_profile, run_simulation, SimulationOutcome};
use crate::error::Result;
use crate::store::{ProfileStore, ResultStore};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Where and how finished series are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub out_dir: PathBuf,
    /// Also write the JSON record next to the CSV table.
    pub json: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            json: false,
        }
    }
}

/// Outcome of one scenario plus the files written for it.
#[derive(Debug)]
pub struct ScenarioReport {
    pub outcome: SimulationOutcome,
    pub files: Vec<PathBuf>,
}

pub struct Orchestrator<'a> {
    profiles: &'a dyn ProfileStore,
    results: &'a dyn ResultStore,
    export: ExportOptions,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        profiles: &'a dyn ProfileStore,
        results: &'a dyn ResultStore,
        export: ExportOptions,
    ) -> Self {
        Self {
            profiles,
            results,
            export,
        }
    }

    pub fn process(&self, scenario: &ScenarioConfig) -> Result<ScenarioReport> {
        let profile_id = create_profile(self.profiles, &scenario.profile)?;
        let outcome = run_simulation(self.profiles, self.results, &scenario.request(profile_id))?;
        let files = self.export(&outcome)?;
        Ok(ScenarioReport { outcome, files })
    }

    /// Run every scenario in order; a failure is logged and the rest still run.
    pub fn process_all(&self, scenarios: &[ScenarioConfig]) -> Vec<Result<ScenarioReport>> {
        scenarios
            .iter()
            .enumerate()
            .map(|(index, scenario)| {
                let result = self.process(scenario);
                if let Err(err) = &result {
                    error!(scenario = index + 1, error = %err, "scenario failed");
                }
                result
            })
            .collect()
    }

    /// Load a scenario file and process every scenario in it.
    ///
    /// Only an unreadable or malformed file fails as a whole.
    pub fn process_file(&self, path: &Path) -> Result<Vec<Result<ScenarioReport>>> {
        let scenarios = load_scenarios(path)?;
        info!(path = %path.display(), scenarios = scenarios.len(), "scenario file loaded");
        Ok(self.process_all(&scenarios))
    }

    fn export(&self, outcome: &SimulationOutcome) -> Result<Vec<PathBuf>> {
        let series = self.results.get(outcome.simulation_id)?;
        fs::create_dir_all(&self.export.out_dir)?;

        let stem = series.file_stem();
        let csv = self.export.out_dir.join(format!("{stem}.csv"));
        series.write_csv_file(&csv)?;
        let mut files = vec![csv];

        if self.export.json {
            let json = self.export.out_dir.join(format!("{stem}.json"));
            series.write_json_file(&json)?;
            files.push(json);
        }

        info!(
            simulation_id = %outcome.simulation_id,
            out_dir = %self.export.out_dir.display(),
            files = files.len(),
            "series exported"
        );
        Ok(files)
    }
}
