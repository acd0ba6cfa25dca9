use crate::constants::PROGRESS_REPORT_PERCENT;
use crate::math_utils::spread;
use crate::sim::sim_op::{SimOp, SimOpHandle};
use crate::sim::Simulation;
use tracing::{debug, info};

/// Logs run progress each time another slice of the iteration budget is used up.
pub struct ProgressReportingOp {
    pub report_frequency_percent: f64,
    last_milestone: i64,
}

impl ProgressReportingOp {
    pub fn new() -> Self {
        Self::with_frequency(PROGRESS_REPORT_PERCENT)
    }

    pub fn with_frequency(report_frequency_percent: f64) -> Self {
        Self {
            report_frequency_percent,
            last_milestone: -1,
        }
    }

    pub fn handle() -> SimOpHandle {
        SimOpHandle::new(Box::new(Self::new()))
    }

    fn milestone(&self, sim: &Simulation) -> Option<i64> {
        let budget = sim.settings().max_iter;
        if budget == 0 || self.report_frequency_percent <= 0.0 {
            return None;
        }
        let progress_percent = sim.current_step() as f64 / budget as f64 * 100.0;
        Some((progress_percent / self.report_frequency_percent).floor() as i64)
    }
}

impl Default for ProgressReportingOp {
    fn default() -> Self {
        Self::new()
    }
}

impl SimOp for ProgressReportingOp {
    fn name(&self) -> &str {
        "ProgressReportingOp"
    }

    fn init_sim(&mut self, sim: &Simulation) {
        self.last_milestone = 0;
        debug!(
            simulation = sim.name(),
            layers = sim.history().layer_count(),
            "progress reporting enabled"
        );
    }

    fn update_sim(&mut self, sim: &Simulation) {
        let Some(milestone) = self.milestone(sim) else {
            return;
        };
        if milestone <= self.last_milestone {
            return;
        }
        self.last_milestone = milestone;

        let layer_spread = sim.history().latest().map_or(f64::NAN, |v| spread(&v));
        info!(
            simulation = sim.name(),
            step = sim.current_step(),
            max_iter = sim.settings().max_iter,
            percent = milestone as f64 * self.report_frequency_percent,
            layer_spread,
            "progress"
        );
    }

    fn after_sim(&mut self, sim: &Simulation) {
        debug!(
            simulation = sim.name(),
            steps = sim.current_step(),
            converged = sim.is_converged(),
            "progress reporting done"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{CompartmentMixing, RunSettings, SimProps};

    #[test]
    fn milestones_advance_with_budget() {
        let model = CompartmentMixing::new(vec![1.0, 0.0], vec![1e-9, 1e-9]);
        let sim = Simulation::new(SimProps {
            name: "milestones".to_string(),
            integrator: Box::new(model),
            ops: vec![],
            settings: RunSettings {
                dt: 1.0,
                tol: 1e-12,
                max_iter: 40,
            },
        });
        let op = ProgressReportingOp::new();
        // no steps taken yet
        assert_eq!(op.milestone(&sim), Some(0));
    }

    #[test]
    fn zero_budget_never_reports() {
        let model = CompartmentMixing::new(vec![1.0], vec![0.0]);
        let sim = Simulation::new(SimProps {
            name: "empty".to_string(),
            integrator: Box::new(model),
            ops: vec![],
            settings: RunSettings {
                dt: 1.0,
                tol: 1e-12,
                max_iter: 0,
            },
        });
        assert_eq!(ProgressReportingOp::new().milestone(&sim), None);
    }
}
