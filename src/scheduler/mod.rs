//! C9 — the deterministic scheduler: picks the next runnable operation
//! and implements the pluggable strategies of spec §4.7.

pub mod dfs;
pub mod pct;
pub mod probabilistic;
pub mod random;
pub mod replay;
pub mod strategy;

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::SchedulerStrategy as StrategyConfig;
use crate::kernel::operation::{BlockReason, Operation, OperationId, OperationKind, OperationStatus};
use crate::scheduler::dfs::DfsStrategy;
use crate::scheduler::pct::PctStrategy;
use crate::scheduler::probabilistic::ProbabilisticStrategy;
use crate::scheduler::random::RandomStrategy;
use crate::scheduler::replay::ReplayStrategy;
use crate::scheduler::strategy::Strategy;
use crate::trace::Trace;

/// The wrapping in spec §3: `{ actors, operations, monitors, rng, ... }`
/// keeps `operations` as its own map; `Scheduler` owns it directly since
/// nothing outside this module mutates operation status.
pub struct Scheduler {
    operations: HashMap<OperationId, Operation>,
    next_operation_id: u64,
    strategy: Box<dyn Strategy>,
    rng: StdRng,
    trace: Trace,
    current: Option<OperationId>,
    unfair_steps: u64,
    fair_steps: u64,
    max_unfair_steps: u64,
    max_fair_steps: u64,
}

pub fn build_strategy(cfg: &StrategyConfig, fairness_threshold: u64) -> Box<dyn Strategy> {
    match cfg {
        StrategyConfig::Random => Box::new(RandomStrategy::default()),
        StrategyConfig::Dfs => Box::new(DfsStrategy::default()),
        StrategyConfig::Pct { k } => Box::new(PctStrategy::new(*k, false, fairness_threshold)),
        StrategyConfig::FairPct { k } => Box::new(PctStrategy::new(*k, true, fairness_threshold)),
        StrategyConfig::Probabilistic { p } => Box::new(ProbabilisticStrategy::new(*p)),
        StrategyConfig::Priority => Box::new(ProbabilisticStrategy::new(0.1)),
        StrategyConfig::Replay { path } => {
            let trace = Trace::load(path).unwrap_or_default();
            Box::new(ReplayStrategy::new(trace))
        }
    }
}

impl Scheduler {
    pub fn new(strategy: Box<dyn Strategy>, seed: Option<u64>, max_unfair_steps: u64, max_fair_steps: u64) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Scheduler {
            operations: HashMap::new(),
            next_operation_id: 0,
            strategy,
            rng,
            trace: Trace::new(),
            current: None,
            unfair_steps: 0,
            fair_steps: 0,
            max_unfair_steps,
            max_fair_steps,
        }
    }

    pub fn register_operation(&mut self, kind: OperationKind, owning_actor: Option<crate::actor::actor_ref::ActorId>) -> OperationId {
        let id = OperationId(self.next_operation_id);
        self.next_operation_id += 1;
        self.operations.insert(id, Operation::new(id, kind, owning_actor));
        id
    }

    pub fn set_enabled(&mut self, id: OperationId) {
        if let Some(op) = self.operations.get_mut(&id) {
            op.status = OperationStatus::Enabled;
        }
    }

    pub fn set_blocked(&mut self, id: OperationId, reason: BlockReason) {
        if let Some(op) = self.operations.get_mut(&id) {
            op.status = OperationStatus::Blocked(reason);
        }
    }

    pub fn complete(&mut self, id: OperationId) {
        if let Some(op) = self.operations.get_mut(&id) {
            op.status = OperationStatus::Completed;
        }
    }

    pub fn current(&self) -> Option<OperationId> {
        self.current
    }

    pub fn status(&self, id: OperationId) -> OperationStatus {
        self.operations.get(&id).map_or(OperationStatus::None, |o| o.status)
    }

    fn enabled_ids(&self) -> Vec<OperationId> {
        let mut ids: Vec<OperationId> = self
            .operations
            .values()
            .filter(|o| o.is_enabled())
            .map(|o| o.id)
            .collect();
        ids.sort_by_key(|o| o.0);
        ids
    }

    pub fn all_quiescent(&self) -> bool {
        self.operations
            .values()
            .all(|o| matches!(o.status, OperationStatus::Completed))
    }

    pub fn is_fair(&self) -> bool {
        self.strategy.is_fair()
    }

    pub fn is_exhausted(&self) -> bool {
        self.strategy.is_exhausted()
    }

    /// Picks and wakes the next Enabled operation. Returns `None` when
    /// nothing is runnable (all Completed, or every remaining operation is
    /// Blocked — a deadlock the caller should treat as end-of-iteration).
    pub fn select_next(&mut self) -> Result<Option<OperationId>, crate::errors::RuntimeError> {
        if self.strategy.is_fair() {
            self.fair_steps += 1;
            if self.fair_steps > self.max_fair_steps {
                return Err(crate::errors::RuntimeError::StepBudgetExceeded(self.fair_steps));
            }
        } else {
            self.unfair_steps += 1;
            if self.unfair_steps > self.max_unfair_steps {
                return Err(crate::errors::RuntimeError::StepBudgetExceeded(self.unfair_steps));
            }
        }

        let enabled = self.enabled_ids();
        if enabled.is_empty() {
            self.current = None;
            return Ok(None);
        }

        let chosen = self.strategy.choose(&enabled, &mut self.rng);
        if let Some(err) = self.strategy.replay_divergence() {
            return Err(err);
        }
        self.trace.record_scheduling_choice(chosen);
        self.current = Some(chosen);
        Ok(Some(chosen))
    }

    /// Draws the next `Random(domain)` value (spec §4.2). Under
    /// `Replay`, this reads the next recorded `NondetChoice` instead of
    /// drawing from `rng`, so replaying a trace that called `Random`
    /// reproduces the exact values the original run saw; every other
    /// strategy draws fresh and the draw is recorded for a future replay.
    pub fn random_u64(&mut self, bound: u64) -> Result<u64, crate::errors::RuntimeError> {
        use rand::Rng;
        let value = match self.strategy.next_nondet_choice(&mut self.rng) {
            Some(v) => v,
            None => self.rng.gen_range(0..bound.max(1)),
        };
        if let Some(err) = self.strategy.replay_divergence() {
            return Err(err);
        }
        self.trace.record_nondet_choice(value);
        Ok(value)
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn prepare_next_iteration(&mut self) {
        self.strategy.prepare_next_iteration();
        self.unfair_steps = 0;
        self.fair_steps = 0;
        self.current = None;
        self.trace = Trace::new();
    }
}
