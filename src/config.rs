//! Scenario files for batch runs.
//!
//! A file holds either one scenario object or `{"inputs": [...]}` with many.
//! Each scenario is a profile definition plus optional run settings; absent
//! settings fall back to the defaults in [`crate::constants`].

use crate::engine::SimulationRequest;
use crate::soil::{ProfileId, ProfileInput};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur when loading scenario files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the scenario file from disk.
    #[error("failed to read scenario file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The content is not valid JSON or does not match the scenario shape.
    #[error("failed to parse scenario JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// A batch file with an empty `inputs` list.
    #[error("scenario batch has no inputs")]
    NoInputs,
}

/// One profile definition plus how to run it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(flatten)]
    pub profile: ProfileInput,
    #[serde(default = "crate::engine::default_dt")]
    pub dt: f64,
    #[serde(default = "crate::engine::default_tol")]
    pub steady_state_tol: f64,
    #[serde(default = "crate::engine::default_max_iter")]
    pub max_iter: usize,
}

impl ScenarioConfig {
    /// Run request for the profile once it has been stored under `profile_id`.
    pub fn request(&self, profile_id: ProfileId) -> SimulationRequest {
        SimulationRequest {
            profile_id,
            dt: self.dt,
            steady_state_tol: self.steady_state_tol,
            max_iter: self.max_iter,
        }
    }
}

/// Read and parse a scenario file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, otherwise whatever
/// [`parse_scenarios`] reports.
pub fn load_scenarios(path: &Path) -> Result<Vec<ScenarioConfig>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scenarios(&text)
}

/// Parse either a single scenario or an `inputs` batch.
pub fn parse_scenarios(json: &str) -> Result<Vec<ScenarioConfig>, ConfigError> {
    let mut value: Value = serde_json::from_str(json)?;
    match value.get_mut("inputs").map(Value::take) {
        Some(inputs) => {
            let scenarios: Vec<ScenarioConfig> = serde_json::from_value(inputs)?;
            if scenarios.is_empty() {
                return Err(ConfigError::NoInputs);
            }
            Ok(scenarios)
        }
        None => Ok(vec![serde_json::from_value(value)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soil::ModelKind;

    #[test]
    fn single_scenario_takes_defaults() {
        let scenarios = parse_scenarios(
            r#"{
                "model": "Model1",
                "layers": [
                    {"depth": 10.0, "initial_conc": 5.0, "earthworm_density": 50.0, "beta": 1e-8}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(scenarios.len(), 1);
        let scenario = &scenarios[0];
        assert_eq!(scenario.profile.model, ModelKind::Model1);
        assert_eq!(scenario.profile.h, None);
        assert_eq!(scenario.dt, 86_400.0);
        assert_eq!(scenario.steady_state_tol, 1e-12);
        assert_eq!(scenario.max_iter, 10_000);

        let request = scenario.request(ProfileId(4));
        assert_eq!(request.profile_id, ProfileId(4));
        assert_eq!(request.max_iter, 10_000);
    }

    #[test]
    fn batch_keeps_order_and_overrides() {
        let scenarios = parse_scenarios(
            r#"{"inputs": [
                {"model": "model2", "h": 0.5, "max_iter": 20,
                 "layers": [{"depth": 1.0, "initial_conc": 1.0, "earthworm_density": 1.0, "beta": 1.0}]},
                {"model": "model1", "dt": 3600.0,
                 "layers": [{"depth": 1.0, "initial_conc": 1.0, "earthworm_density": 1.0, "beta": 1.0}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[0].profile.model, ModelKind::Model2);
        assert_eq!(scenarios[0].profile.h, Some(0.5));
        assert_eq!(scenarios[0].max_iter, 20);
        assert_eq!(scenarios[1].dt, 3600.0);
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert!(matches!(
            parse_scenarios(r#"{"inputs": []}"#),
            Err(ConfigError::NoInputs)
        ));
    }

    #[test]
    fn unknown_model_is_a_parse_error() {
        let err = parse_scenarios(r#"{"model": "model3", "layers": []}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
    }

    #[test]
    fn missing_file_names_the_path() {
        let path = Path::new("/nonexistent/scenario.json");
        let err = load_scenarios(path).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/scenario.json"));
    }
}
