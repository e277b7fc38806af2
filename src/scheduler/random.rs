//! Uniform choice over Enabled operations (spec §4.7). No fairness
//! guarantee across infinite runs; used for stress testing.

use rand::rngs::StdRng;
use rand::Rng;

use crate::kernel::operation::OperationId;
use crate::scheduler::strategy::Strategy;

#[derive(Default)]
pub struct RandomStrategy;

impl Strategy for RandomStrategy {
    fn choose(&mut self, enabled: &[OperationId], rng: &mut StdRng) -> OperationId {
        let idx = rng.gen_range(0..enabled.len());
        enabled[idx]
    }
}
