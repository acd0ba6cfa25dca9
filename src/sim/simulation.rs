use crate::error::{BioturbationError, Result};
use crate::sim::sim_op::{SimOp, SimOpHandle};
use crate::sim::{Exhaustion, Integrator};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Step size, tolerance and iteration budget of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSettings {
    /// Requested step; the integrator decides how it maps to a per-iteration step.
    pub dt: f64,
    pub tol: f64,
    pub max_iter: usize,
}

/// Per-layer concentration samples, all layers aligned on the same time index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerHistory {
    layers: Vec<Vec<f64>>,
}

impl LayerHistory {
    pub fn new(layer_count: usize) -> Self {
        Self {
            layers: vec![Vec::new(); layer_count],
        }
    }

    /// Append one sample per layer.
    pub fn record(&mut self, values: &[f64]) {
        debug_assert_eq!(values.len(), self.layers.len());
        for (series, value) in self.layers.iter_mut().zip(values) {
            series.push(*value);
        }
    }

    /// Number of recorded time indices.
    pub fn len(&self) -> usize {
        self.layers.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, index: usize) -> &[f64] {
        &self.layers[index]
    }

    pub fn latest(&self) -> Option<Vec<f64>> {
        if self.is_empty() {
            return None;
        }
        Some(self.layers.iter().map(|s| s[s.len() - 1]).collect())
    }

    pub fn into_layers(self) -> Vec<Vec<f64>> {
        self.layers
    }
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub history: LayerHistory,
    /// Integration steps actually applied.
    pub iterations: usize,
    pub converged: bool,
    pub elapsed: Duration,
}

pub struct SimProps {
    pub name: String,
    pub integrator: Box<dyn Integrator>,
    pub ops: Vec<SimOpHandle>,
    pub settings: RunSettings,
}

/// Shared run loop: step, record, test for steady state, repeat.
///
/// A run owns its integrator outright and is consumed by [`Simulation::run`],
/// so a simulation can only execute once.
pub struct Simulation {
    name: String,
    integrator: Box<dyn Integrator>,
    ops: Vec<Box<dyn SimOp>>,
    settings: RunSettings,
    dt: f64,
    step: usize,
    history: LayerHistory,
    converged: bool,
}

impl Simulation {
    pub fn new(props: SimProps) -> Simulation {
        let ops = props.ops.into_iter().map(|handle| handle.op).collect();
        let layer_count = props.integrator.layer_values().len();
        let dt = props
            .integrator
            .effective_dt(props.settings.dt, props.settings.max_iter);
        Simulation {
            name: props.name,
            integrator: props.integrator,
            ops,
            settings: props.settings,
            dt,
            step: 0,
            history: LayerHistory::new(layer_count),
            converged: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Steps applied so far
    pub fn current_step(&self) -> usize {
        self.step
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Per-iteration step after the integrator's interpretation of `dt`
    pub fn effective_dt(&self) -> f64 {
        self.dt
    }

    pub fn integrator(&self) -> &dyn Integrator {
        self.integrator.as_ref()
    }

    pub fn history(&self) -> &LayerHistory {
        &self.history
    }

    pub fn is_converged(&self) -> bool {
        self.converged
    }

    pub fn run(mut self) -> Result<RunReport> {
        let started = Instant::now();
        let policy = self.integrator.policy();
        info!(
            simulation = %self.name,
            integrator = self.integrator.name(),
            dt = self.dt,
            tol = self.settings.tol,
            max_iter = self.settings.max_iter,
            "starting run"
        );

        self.simulate_init();

        if policy.record_initial {
            self.history.record(&self.integrator.layer_values());
            self.converged = self.integrator.is_converged(self.settings.tol);
        }

        while !self.converged && self.step < self.settings.max_iter {
            self.integrator.step(self.dt);
            self.step += 1;

            self.history.record(&self.integrator.layer_values());
            self.converged = self.integrator.is_converged(self.settings.tol);

            self.simulate_step();
        }

        self.simulate_end();

        let elapsed = started.elapsed();
        if !self.converged {
            match policy.on_exhausted {
                Exhaustion::Fail => {
                    warn!(
                        simulation = %self.name,
                        iterations = self.step,
                        "steady state not reached"
                    );
                    return Err(BioturbationError::SteadyStateNotReached {
                        iterations: self.step,
                    });
                }
                Exhaustion::ReturnHistory => {
                    debug!(
                        simulation = %self.name,
                        iterations = self.step,
                        "iteration budget exhausted, keeping full history"
                    );
                }
            }
        }

        info!(
            simulation = %self.name,
            iterations = self.step,
            converged = self.converged,
            samples = self.history.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "run finished"
        );

        Ok(RunReport {
            history: self.history,
            iterations: self.step,
            converged: self.converged,
            elapsed,
        })
    }

    fn simulate_init(&mut self) {
        let mut ops = std::mem::take(&mut self.ops);
        for op in &mut ops {
            op.init_sim(self);
        }
        self.ops = ops;
    }

    fn simulate_step(&mut self) {
        let mut ops = std::mem::take(&mut self.ops);
        for op in &mut ops {
            op.update_sim(self);
        }
        self.ops = ops;
    }

    fn simulate_end(&mut self) {
        let mut ops = std::mem::take(&mut self.ops);
        for op in &mut ops {
            op.after_sim(self);
        }
        self.ops = ops;
    }
}
