//! C11 — replay/trace: records and replays scheduling decisions.
//!
//! Grounded on the teacher's `system::persist` (`Evt<Msg>` / `EventStore`
//! append-only log), adapted from arbitrary user messages to the two
//! record kinds spec §6 enumerates: every operation the scheduler selects
//! and every random bit consumed by `Random`/`RandomBool` or by a
//! strategy's own internal coin (PCT's priority-change points included).

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::kernel::operation::OperationId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TraceRecord {
    SchedulingChoice { operation_id: u64 },
    NondetChoice { value: u64 },
}

/// A trace is the minimal witness of a failure (spec §4.9): the sequence
/// of choices that, replayed, reproduces a run bit-for-bit given the same
/// configuration and actor-construction order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    records: Vec<TraceRecord>,
}

impl Trace {
    pub fn new() -> Self {
        Trace::default()
    }

    pub fn record_scheduling_choice(&mut self, op: OperationId) {
        self.records.push(TraceRecord::SchedulingChoice { operation_id: op.0 });
    }

    pub fn record_nondet_choice(&mut self, value: u64) {
        self.records.push(TraceRecord::NondetChoice { value });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The `n`th `SchedulingChoice` record, skipping `NondetChoice`
    /// records encountered along the way so the replay strategy (which
    /// only sees `choose()` calls, not `Random` calls) can index straight
    /// into the choices that matter to it.
    pub fn scheduling_choice_at(&self, n: usize) -> Option<OperationId> {
        self.records
            .iter()
            .filter_map(|r| match r {
                TraceRecord::SchedulingChoice { operation_id } => Some(OperationId(*operation_id)),
                TraceRecord::NondetChoice { .. } => None,
            })
            .nth(n)
    }

    pub fn nondet_choice_at(&self, n: usize) -> Option<u64> {
        self.records
            .iter()
            .filter_map(|r| match r {
                TraceRecord::NondetChoice { value } => Some(*value),
                TraceRecord::SchedulingChoice { .. } => None,
            })
            .nth(n)
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, data)
    }
}
