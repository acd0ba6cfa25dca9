use crate::sim::{Exhaustion, Integrator, RunPolicy};
use crate::soil::SoilProfile;

/// Model 1: discrete compartments exchanging mass with their lower neighbour
///
/// Each layer is a well-mixed compartment. Per step, every adjacent pair
/// `(l, l + 1)` trades `rate[l] * dt * (conc[l + 1] - conc[l])`, so mass only
/// moves between neighbours and nothing crosses the top or bottom.
#[derive(Debug, Clone)]
pub struct CompartmentMixing {
    concentrations: Vec<f64>,
    rates: Vec<f64>,
}

impl CompartmentMixing {
    pub fn new(concentrations: Vec<f64>, rates: Vec<f64>) -> Self {
        debug_assert_eq!(concentrations.len(), rates.len());
        Self {
            concentrations,
            rates,
        }
    }

    pub fn from_profile(profile: &SoilProfile) -> Self {
        Self::new(profile.initial_concentrations(), profile.transport_values())
    }

    pub fn concentrations(&self) -> &[f64] {
        &self.concentrations
    }
}

/// Apply one explicit exchange step in place.
///
/// Pairs are processed top to bottom and each exchange is applied before the
/// next pair is computed, so pair `(l, l + 1)` sees the value of `l` already
/// changed by pair `(l - 1, l)`. The bottom layer never initiates a transfer.
pub fn mix_step(concentrations: &mut [f64], rates: &[f64], dt: f64) {
    for l in 0..concentrations.len().saturating_sub(1) {
        let fraction = rates[l] * dt;
        let delta = fraction * (concentrations[l + 1] - concentrations[l]);
        concentrations[l] += delta;
        concentrations[l + 1] -= delta;
    }
}

impl Integrator for CompartmentMixing {
    fn name(&self) -> &str {
        "CompartmentMixing"
    }

    fn step(&mut self, dt: f64) {
        mix_step(&mut self.concentrations, &self.rates, dt);
    }

    fn layer_values(&self) -> Vec<f64> {
        self.concentrations.clone()
    }

    // Conserved quantity is the plain sum: exchanges are zero-sum between neighbours.
    fn total_mass(&self) -> f64 {
        self.concentrations.iter().sum()
    }

    fn policy(&self) -> RunPolicy {
        RunPolicy {
            record_initial: true,
            on_exhausted: Exhaustion::Fail,
        }
    }
}
