//! The pluggable choice function behind `select_next()` (spec §4.7).

use rand::rngs::StdRng;

use crate::errors::RuntimeError;
use crate::kernel::operation::OperationId;

/// A scheduling decision recorded for replay (C11): which operation ran,
/// and any random bits the strategy itself consumed to make the choice
/// (e.g. PCT's priority-change points).
#[derive(Debug, Clone)]
pub struct Choice {
    pub operation: OperationId,
}

pub trait Strategy {
    /// Picks one of `enabled` to run next. `enabled` is never empty when
    /// this is called (the scheduler only calls it while at least one
    /// operation is runnable).
    fn choose(&mut self, enabled: &[OperationId], rng: &mut StdRng) -> OperationId;

    /// Whether this strategy provides fairness (spec G3: every Enabled
    /// operation is eventually selected). Used by the liveness/cycle
    /// checker (C10), which is only sound under fair strategies.
    fn is_fair(&self) -> bool {
        false
    }

    /// `true` once the strategy has exhausted its search space (DFS only);
    /// a scheduler loop may stop iterating without it being a bug.
    fn is_exhausted(&self) -> bool {
        false
    }

    /// Called once the active iteration completes, so stateful strategies
    /// (DFS's choice stack) can advance to the next interleaving.
    fn prepare_next_iteration(&mut self) {}

    /// Set by [`crate::scheduler::replay::ReplayStrategy`] the moment its
    /// last `choose()` or `next_nondet_choice()` call departed from the
    /// recorded trace; every other strategy has nothing to diverge from.
    fn replay_divergence(&self) -> Option<RuntimeError> {
        None
    }

    /// Overridden by [`crate::scheduler::replay::ReplayStrategy`] to hand
    /// back the next recorded `Random`/`RandomBool` value instead of one
    /// freshly drawn from `rng`. `None` means "draw fresh", which is every
    /// strategy but Replay.
    fn next_nondet_choice(&mut self, _rng: &mut StdRng) -> Option<u64> {
        None
    }
}
