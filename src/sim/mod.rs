pub mod compartment_mixing;
pub mod continuum_diffusion;
pub mod sim_op;
pub mod simulation;
pub mod steady_state;

pub use compartment_mixing::CompartmentMixing;
pub use continuum_diffusion::{ContinuumDiffusion, LayerGrid};
pub use simulation::{LayerHistory, RunReport, RunSettings, SimProps, Simulation};
pub use steady_state::is_steady;

use crate::soil::{ModelKind, SoilProfile};

/// What the shared run loop does when the iteration budget runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhaustion {
    /// Abort with `SteadyStateNotReached`.
    Fail,
    /// Hand back everything recorded so far.
    ReturnHistory,
}

/// Per-model choices the run loop has to respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPolicy {
    /// Record the pre-step values as time index 0 and test them for steady state.
    pub record_initial: bool,
    pub on_exhausted: Exhaustion,
}

/// One bioturbation model's state plus its explicit step.
///
/// The run loop, steady-state test and history recording are shared; a model
/// only supplies how to advance its own state and how to summarise it per
/// layer.
pub trait Integrator {
    /// The name of this integrator (for logging)
    fn name(&self) -> &str;

    /// Advance the state by one explicit step of size `dt`
    fn step(&mut self, dt: f64);

    /// One representative concentration per profile layer, in profile order
    fn layer_values(&self) -> Vec<f64>;

    /// The model's conserved quantity, for mass-balance tracking
    fn total_mass(&self) -> f64;

    fn policy(&self) -> RunPolicy;

    /// Step size actually used per iteration for a requested `dt`
    fn effective_dt(&self, requested_dt: f64, _max_iter: usize) -> f64 {
        requested_dt
    }

    fn is_converged(&self, tol: f64) -> bool {
        is_steady(&self.layer_values(), tol)
    }
}

/// Build the integrator matching the profile's model.
pub fn integrator_for(profile: &SoilProfile) -> Box<dyn Integrator> {
    match profile.model {
        ModelKind::Model1 => Box::new(CompartmentMixing::from_profile(profile)),
        ModelKind::Model2 => Box::new(ContinuumDiffusion::from_profile(profile)),
    }
}
