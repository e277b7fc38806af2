//! Probabilistic / Priority (spec §4.7): a geometric coin with parameter
//! `p` that favors sticking with the current operation with probability
//! `1 - p`, flipping to a freshly (uniformly) chosen Enabled operation
//! otherwise. `Priority` in the configuration surface (spec §6) is this
//! same strategy at a fixed default `p`.

use rand::rngs::StdRng;
use rand::Rng;

use crate::kernel::operation::OperationId;
use crate::scheduler::strategy::Strategy;

pub struct ProbabilisticStrategy {
    p: f64,
    current: Option<OperationId>,
}

impl ProbabilisticStrategy {
    pub fn new(p: f64) -> Self {
        ProbabilisticStrategy { p, current: None }
    }
}

impl Strategy for ProbabilisticStrategy {
    fn choose(&mut self, enabled: &[OperationId], rng: &mut StdRng) -> OperationId {
        if let Some(cur) = self.current {
            if enabled.contains(&cur) && rng.gen_bool(1.0 - self.p) {
                return cur;
            }
        }
        let idx = rng.gen_range(0..enabled.len());
        let chosen = enabled[idx];
        self.current = Some(chosen);
        chosen
    }

    fn prepare_next_iteration(&mut self) {
        self.current = None;
    }
}
