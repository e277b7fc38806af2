//! Replay (spec §4.7, C11): reads a recorded sequence of choice tokens
//! and plays it back exactly; diverging from the recording is a bug
//! (`ReplayDiverged`), not a silent fallback, so replay never picks an
//! operation that isn't in the trace.

use rand::rngs::StdRng;

use crate::errors::RuntimeError;
use crate::kernel::operation::OperationId;
use crate::scheduler::strategy::Strategy;
use crate::trace::Trace;

pub struct ReplayStrategy {
    trace: Trace,
    position: usize,
    nondet_position: usize,
    diverged: Option<RuntimeError>,
}

impl ReplayStrategy {
    pub fn new(trace: Trace) -> Self {
        ReplayStrategy {
            trace,
            position: 0,
            nondet_position: 0,
            diverged: None,
        }
    }

    pub fn diverged(&self) -> Option<&RuntimeError> {
        self.diverged.as_ref()
    }
}

impl Strategy for ReplayStrategy {
    fn choose(&mut self, enabled: &[OperationId], _rng: &mut StdRng) -> OperationId {
        let expected = self.trace.scheduling_choice_at(self.position);
        self.position += 1;

        match expected {
            Some(op) if enabled.contains(&op) => op,
            Some(op) => {
                self.diverged = Some(RuntimeError::ReplayDiverged {
                    step_index: self.position - 1,
                    expected: format!("{:?}", op),
                    actual: format!("{:?}", enabled),
                });
                enabled[0]
            }
            None => {
                self.diverged = Some(RuntimeError::ReplayDiverged {
                    step_index: self.position - 1,
                    expected: "<end of trace>".into(),
                    actual: format!("{:?}", enabled),
                });
                enabled[0]
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        self.position >= self.trace.len()
    }

    fn replay_divergence(&self) -> Option<RuntimeError> {
        self.diverged.clone()
    }

    /// Reads the `n`th recorded `NondetChoice` in order rather than
    /// drawing from `rng`, so a trace that called `Random`/`RandomBool`
    /// replays the exact values the original run saw (spec §6: "Replay
    /// reads these in order").
    fn next_nondet_choice(&mut self, _rng: &mut StdRng) -> Option<u64> {
        let expected = self.trace.nondet_choice_at(self.nondet_position);
        self.nondet_position += 1;
        match expected {
            Some(value) => Some(value),
            None => {
                self.diverged = Some(RuntimeError::ReplayDiverged {
                    step_index: self.nondet_position - 1,
                    expected: "<end of trace>".into(),
                    actual: "a Random/RandomBool draw".into(),
                });
                Some(0)
            }
        }
    }
}
