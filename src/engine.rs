//! Profile lifecycle and simulation entry points.
//!
//! Everything here goes through the store traits handed in by the caller, so
//! the same functions serve the CLI, tests, or any other front end.

use crate::constants::{DEFAULT_DT_SECONDS, DEFAULT_MAX_ITER, DEFAULT_STEADY_STATE_TOL};
use crate::error::Result;
use crate::series::{ConcentrationSeries, SimulationId};
use crate::sim::sim_op::{MassBalanceOp, ProgressReportingOp, SimOpHandle};
use crate::sim::{integrator_for, RunReport, RunSettings, SimProps, Simulation};
use crate::soil::{ModelKind, ProfileId, ProfileInput, ProfileUpdate, SoilProfile};
use crate::store::{ProfileStore, ResultStore};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub(crate) fn default_dt() -> f64 {
    DEFAULT_DT_SECONDS
}

pub(crate) fn default_tol() -> f64 {
    DEFAULT_STEADY_STATE_TOL
}

pub(crate) fn default_max_iter() -> usize {
    DEFAULT_MAX_ITER
}

/// Which stored profile to simulate and with what settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub profile_id: ProfileId,
    /// Model 1: step per iteration. Model 2: total span split over `max_iter`.
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default = "default_tol")]
    pub steady_state_tol: f64,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
}

impl SimulationRequest {
    /// Request with default run settings.
    pub fn new(profile_id: ProfileId) -> Self {
        Self {
            profile_id,
            dt: DEFAULT_DT_SECONDS,
            steady_state_tol: DEFAULT_STEADY_STATE_TOL,
            max_iter: DEFAULT_MAX_ITER,
        }
    }

    pub fn settings(&self) -> RunSettings {
        RunSettings {
            dt: self.dt,
            tol: self.steady_state_tol,
            max_iter: self.max_iter,
        }
    }
}

/// Summary of a stored run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub profile_id: ProfileId,
    pub simulation_id: SimulationId,
    pub model: ModelKind,
    /// Integration steps actually applied.
    pub iterations: usize,
    /// Always true for Model 1; Model 2 reports whether the tolerance was met.
    pub converged: bool,
}

/// Validate `input`, derive transport parameters and store the profile.
///
/// Nothing is stored, and no id is consumed, when validation fails.
pub fn create_profile(store: &dyn ProfileStore, input: &ProfileInput) -> Result<ProfileId> {
    let profile = SoilProfile::from_input(ProfileId(0), input)?;
    let layers = profile.layers.len();
    let id = store.insert(profile)?;
    info!(profile_id = %id, model = %input.model, layers, "profile created");
    Ok(id)
}

pub fn get_profile(store: &dyn ProfileStore, id: ProfileId) -> Result<SoilProfile> {
    store.get(id)
}

/// Apply a partial update; the stored profile is untouched if it fails.
pub fn update_profile(
    store: &dyn ProfileStore,
    id: ProfileId,
    update: &ProfileUpdate,
) -> Result<SoilProfile> {
    let updated = store.update(id, &|current| current.with_update(update))?;
    info!(profile_id = %id, model = %updated.model, h = updated.h, "profile updated");
    Ok(updated)
}

pub fn delete_profile(store: &dyn ProfileStore, id: ProfileId) -> Result<()> {
    store.remove(id)?;
    info!(profile_id = %id, "profile deleted");
    Ok(())
}

/// Run the profile's model with the given observers attached.
pub fn simulate(
    profile: &SoilProfile,
    request: &SimulationRequest,
    ops: Vec<SimOpHandle>,
) -> Result<RunReport> {
    let sim = Simulation::new(SimProps {
        name: format!("profile-{}", profile.id),
        integrator: integrator_for(profile),
        ops,
        settings: request.settings(),
    });
    sim.run()
}

/// Load the profile, run it, and store the resulting series.
///
/// A Model 1 run that exhausts its budget fails and stores nothing.
pub fn run_simulation(
    profiles: &dyn ProfileStore,
    results: &dyn ResultStore,
    request: &SimulationRequest,
) -> Result<SimulationOutcome> {
    let profile = profiles.get(request.profile_id)?;
    let ops = vec![ProgressReportingOp::handle(), MassBalanceOp::handle()];

    let report = match simulate(&profile, request, ops) {
        Ok(report) => report,
        Err(err) => {
            warn!(profile_id = %profile.id, error = %err, "simulation failed");
            return Err(err);
        }
    };

    let simulation_id = results.allocate_id();
    let iterations = report.iterations;
    let converged = report.converged;
    let series = ConcentrationSeries::assemble(simulation_id, &profile, report.history);
    let samples = series.len();
    results.insert(series)?;

    info!(
        simulation_id = %simulation_id,
        profile_id = %profile.id,
        model = %profile.model,
        iterations,
        converged,
        samples,
        "simulation stored"
    );

    Ok(SimulationOutcome {
        profile_id: profile.id,
        simulation_id,
        model: profile.model,
        iterations,
        converged,
    })
}
