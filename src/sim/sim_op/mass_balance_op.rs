use crate::constants::MASS_DRIFT_WARN_FRACTION;
use crate::math_utils::relative_drift;
use crate::sim::sim_op::{SimOp, SimOpHandle};
use crate::sim::Simulation;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};

/// Running record of an integrator's conserved quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MassBalance {
    pub initial: f64,
    pub latest: f64,
    pub max_drift: f64,
}

/// Tracks how far the total mass wanders from its starting value.
///
/// Warns once per run when the relative drift first exceeds the threshold.
/// Model 2's fixed end nodes act as reservoirs, so some drift there is
/// expected rather than a fault.
pub struct MassBalanceOp {
    pub warn_fraction: f64,
    balance: Rc<RefCell<MassBalance>>,
    warned: bool,
}

impl MassBalanceOp {
    pub fn new(warn_fraction: f64) -> Self {
        Self {
            warn_fraction,
            balance: Rc::new(RefCell::new(MassBalance::default())),
            warned: false,
        }
    }

    pub fn handle() -> SimOpHandle {
        SimOpHandle::new(Box::new(Self::new(MASS_DRIFT_WARN_FRACTION)))
    }

    /// Handle plus a shared view of the balance, readable after the run.
    pub fn tracked(warn_fraction: f64) -> (SimOpHandle, Rc<RefCell<MassBalance>>) {
        let op = Self::new(warn_fraction);
        let balance = op.balance.clone();
        (SimOpHandle::new(Box::new(op)), balance)
    }
}

impl SimOp for MassBalanceOp {
    fn name(&self) -> &str {
        "MassBalanceOp"
    }

    fn init_sim(&mut self, sim: &Simulation) {
        let mass = sim.integrator().total_mass();
        *self.balance.borrow_mut() = MassBalance {
            initial: mass,
            latest: mass,
            max_drift: 0.0,
        };
        self.warned = false;
    }

    fn update_sim(&mut self, sim: &Simulation) {
        let mut balance = self.balance.borrow_mut();
        balance.latest = sim.integrator().total_mass();
        let drift = relative_drift(balance.initial, balance.latest);
        if drift > balance.max_drift {
            balance.max_drift = drift;
        }

        if !self.warned && drift > self.warn_fraction {
            self.warned = true;
            warn!(
                simulation = sim.name(),
                step = sim.current_step(),
                initial = balance.initial,
                current = balance.latest,
                drift,
                "total mass drifting"
            );
        }
    }

    fn after_sim(&mut self, sim: &Simulation) {
        let balance = self.balance.borrow();
        debug!(
            simulation = sim.name(),
            initial = balance.initial,
            last = balance.latest,
            max_drift = balance.max_drift,
            "mass balance"
        );
    }
}
