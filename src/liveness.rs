//! C10 — liveness / cycle checker. The temperature counter itself lives
//! on [`crate::context::Inner`] (it is simplest right where monitor
//! dispatch happens); this module holds the optional execution-
//! fingerprint cycle detector described in spec §4.8, which is a pure
//! function of a snapshot the context builds once per scheduling step.
//!
//! Grounded on the teacher's dispatcher loop, which already walked every
//! actor's mailbox depth once per tick for its own bookkeeping — the
//! fingerprint here just hashes that same per-tick snapshot instead of
//! discarding it.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// A snapshot of everything the cycle detector is allowed to look at:
/// "actor states, inbox lengths, monitor states, deferred sets", with
/// wall-time-like fields and numeric-id reassignments excluded (spec
/// §4.8). Actor identity is carried by its display name, not its numeric
/// id, so two fingerprints compare equal across id-allocation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ExecutionFingerprint {
    actors: Vec<(String, usize, Vec<String>)>,
    monitors: Vec<(&'static str, &'static str)>,
}

impl ExecutionFingerprint {
    pub fn builder() -> FingerprintBuilder {
        FingerprintBuilder::default()
    }

    fn hash64(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Default)]
pub struct FingerprintBuilder {
    actors: Vec<(String, usize, Vec<String>)>,
    monitors: Vec<(&'static str, &'static str)>,
}

impl FingerprintBuilder {
    pub fn actor(mut self, display_name: String, inbox_len: usize, deferred: Vec<String>) -> Self {
        self.actors.push((display_name, inbox_len, deferred));
        self
    }

    pub fn monitor(mut self, type_tag: &'static str, state: &'static str) -> Self {
        self.monitors.push((type_tag, state));
        self
    }

    pub fn build(mut self) -> ExecutionFingerprint {
        self.actors.sort();
        self.monitors.sort();
        ExecutionFingerprint {
            actors: self.actors,
            monitors: self.monitors,
        }
    }
}

/// Detects a repeated fingerprint within a tail of steps that were all
/// fair-progressing but never saw a monitor go cold — the condition spec
/// §4.8 calls `InfiniteExecutionViolatesLiveness`.
#[derive(Default)]
pub struct CycleDetector {
    seen_at: HashMap<u64, usize>,
    step: usize,
    /// steps (by index) since the last time every monitor was cold.
    since_last_cold: usize,
}

impl CycleDetector {
    pub fn new() -> Self {
        CycleDetector::default()
    }

    pub fn note_all_cold(&mut self) {
        self.since_last_cold = 0;
        self.seen_at.clear();
    }

    /// Records one scheduling step's fingerprint. Returns `true` once a
    /// fingerprint repeats while the tail since the last all-cold point
    /// has seen no cold transition — fair progress cycling without ever
    /// discharging a liveness obligation.
    pub fn record(&mut self, fp: &ExecutionFingerprint) -> bool {
        self.step += 1;
        self.since_last_cold += 1;
        let h = fp.hash64();
        if let Some(&prior_step) = self.seen_at.get(&h) {
            return self.step - prior_step <= self.since_last_cold;
        }
        self.seen_at.insert(h, self.step);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_fingerprint_with_no_cold_transition_fires() {
        let mut detector = CycleDetector::new();
        let fp = ExecutionFingerprint::builder()
            .monitor("demo::Liveness", "Requested")
            .build();
        assert!(!detector.record(&fp));
        assert!(detector.record(&fp));
    }

    #[test]
    fn cold_transition_clears_the_cycle() {
        let mut detector = CycleDetector::new();
        let fp = ExecutionFingerprint::builder()
            .monitor("demo::Liveness", "Requested")
            .build();
        assert!(!detector.record(&fp));
        detector.note_all_cold();
        assert!(!detector.record(&fp));
    }
}
