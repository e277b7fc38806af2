//! PCT / FairPCT (spec §4.7): a random priority order over operations
//! plus `k` priority-change points, the only places a high-priority
//! operation can be demoted. FairPCT additionally forces progress on any
//! operation starved past a fairness threshold.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

use crate::kernel::operation::OperationId;
use crate::scheduler::strategy::Strategy;

pub struct PctStrategy {
    k: u32,
    fair: bool,
    fairness_threshold: u64,
    priority: Vec<OperationId>,
    change_points: Vec<u64>,
    step: u64,
    last_scheduled: HashMap<OperationId, u64>,
}

impl PctStrategy {
    pub fn new(k: u32, fair: bool, fairness_threshold: u64) -> Self {
        PctStrategy {
            k,
            fair,
            fairness_threshold,
            priority: Vec::new(),
            change_points: Vec::new(),
            step: 0,
            last_scheduled: HashMap::new(),
        }
    }

    fn ensure_priority(&mut self, enabled: &[OperationId], rng: &mut StdRng) {
        for op in enabled {
            if !self.priority.contains(op) {
                let idx = rng.gen_range(0..=self.priority.len());
                self.priority.insert(idx, *op);
            }
        }
        if self.change_points.is_empty() && self.k > 0 {
            let mut points: Vec<u64> = (0..self.k as u64 * 10)
                .collect::<Vec<_>>()
                .choose_multiple(rng, self.k as usize)
                .cloned()
                .collect();
            points.sort_unstable();
            self.change_points = points;
        }
    }

    fn highest_priority(&self, enabled: &[OperationId]) -> OperationId {
        *self
            .priority
            .iter()
            .find(|op| enabled.contains(op))
            .unwrap_or(&enabled[0])
    }

    fn demote(&mut self, op: OperationId) {
        if let Some(pos) = self.priority.iter().position(|o| *o == op) {
            let op = self.priority.remove(pos);
            self.priority.push(op);
        }
    }
}

impl Strategy for PctStrategy {
    fn choose(&mut self, enabled: &[OperationId], rng: &mut StdRng) -> OperationId {
        self.ensure_priority(enabled, rng);

        let chosen = if self.fair {
            enabled
                .iter()
                .find(|op| {
                    self.step.saturating_sub(*self.last_scheduled.get(op).unwrap_or(&0))
                        >= self.fairness_threshold
                })
                .copied()
                .unwrap_or_else(|| self.highest_priority(enabled))
        } else {
            self.highest_priority(enabled)
        };

        self.last_scheduled.insert(chosen, self.step);

        if self.change_points.contains(&self.step) {
            self.demote(chosen);
        }
        self.step += 1;
        chosen
    }

    fn is_fair(&self) -> bool {
        self.fair
    }

    fn prepare_next_iteration(&mut self) {
        self.priority.clear();
        self.change_points.clear();
        self.step = 0;
        self.last_scheduled.clear();
    }
}
