//! Depth-first systematic enumeration of scheduling choices (spec §4.7).
//!
//! Records a choice stack; each iteration replays the previously decided
//! prefix exactly, then explores a fresh alternative at the first
//! undecided frame. At the end of an iteration the deepest frame with an
//! untried alternative is advanced and everything deeper is discarded;
//! when no such frame exists the search is exhausted.

use rand::rngs::StdRng;

use crate::kernel::operation::OperationId;
use crate::scheduler::strategy::Strategy;

struct Frame {
    chosen_index: usize,
    num_alternatives: usize,
}

#[derive(Default)]
pub struct DfsStrategy {
    stack: Vec<Frame>,
    position: usize,
    exhausted: bool,
}

impl Strategy for DfsStrategy {
    fn choose(&mut self, enabled: &[OperationId], _rng: &mut StdRng) -> OperationId {
        let mut sorted = enabled.to_vec();
        sorted.sort_by_key(|o| o.0);

        if self.position < self.stack.len() {
            // replay the recorded prefix
            let frame = &self.stack[self.position];
            let idx = frame.chosen_index.min(sorted.len() - 1);
            self.position += 1;
            sorted[idx]
        } else {
            self.stack.push(Frame {
                chosen_index: 0,
                num_alternatives: sorted.len(),
            });
            self.position += 1;
            sorted[0]
        }
    }

    fn is_fair(&self) -> bool {
        false
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn prepare_next_iteration(&mut self) {
        self.position = 0;
        while let Some(frame) = self.stack.last_mut() {
            if frame.chosen_index + 1 < frame.num_alternatives {
                frame.chosen_index += 1;
                return;
            }
            self.stack.pop();
        }
        self.exhausted = true;
    }
}
