mod mass_balance_op;
mod progress_reporting_op;

pub use mass_balance_op::MassBalanceOp;
pub use progress_reporting_op::ProgressReportingOp;

use crate::sim::Simulation;

/// Observer hooked into the run loop.
///
/// Ops see the simulation read-only: they report on a run, they never
/// change its outcome.
pub trait SimOp {
    /// The name of this operator (for identification and lookup)
    fn name(&self) -> &str;

    /// Called once before the first step
    fn init_sim(&mut self, _sim: &Simulation) {}

    /// Called after every step, once the step's values are recorded
    fn update_sim(&mut self, _sim: &Simulation) {}

    /// Called once after the last step
    fn after_sim(&mut self, _sim: &Simulation) {}
}

pub struct SimOpHandle {
    pub op: Box<dyn SimOp>,
}

impl SimOpHandle {
    pub fn new(op: Box<dyn SimOp>) -> Self {
        SimOpHandle { op }
    }
}
