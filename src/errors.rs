//! Error kinds surfaced to the harness (spec §7).
//!
//! Every failure a test iteration can produce is a variant here. Failures
//! never unwind past a handler: they are recorded on the
//! [`crate::context::ExecutionContext`] and the scheduler drains remaining
//! Enabled operations to quiescence before the iteration's verdict is
//! returned (see `ExecutionContext::record_error`).

use thiserror::Error;

use crate::event::EventKind;

#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    #[error("assertion failed: {0}")]
    AssertionViolation(String),

    #[error("actor {actor} in state {state} has no handler for {kind}")]
    UnhandledEvent {
        actor: String,
        state: String,
        kind: EventKind,
    },

    #[error("uncontrolled task escaped the controlled-task boundary at {0}")]
    UncontrolledTaskDetected(String),

    #[error("receive attempted on a halted actor")]
    ReceiveOnHaltedActor,

    #[error("actor name \"{0}\" is already bound in this context")]
    NameAlreadyBound(String),

    #[error("queue-depth assertion violated: more than {0} instance(s) enqueued")]
    QueueAssertViolated(usize),

    #[error("monitor {monitor} has been hot in state {state} past the liveness threshold")]
    PotentialLivenessBug { monitor: String, state: String },

    #[error("cycle detector found an infinite fair execution with no monitor ever cold")]
    InfiniteExecutionViolatesLiveness,

    #[error("replay diverged at step {step_index}: expected {expected}, got {actual}")]
    ReplayDiverged {
        step_index: usize,
        expected: String,
        actual: String,
    },

    #[error("step budget exceeded ({0} steps) — informational, not a bug")]
    StepBudgetExceeded(u64),

    #[error("monitor {0} was called re-entrantly from inside its own handler")]
    ReentrantMonitorCall(String),

    #[error(transparent)]
    InvalidName(#[from] crate::validate::InvalidName),

    #[error("rewritten artifact signature mismatch: expected {expected}, found {found}")]
    RewrittenArtifactMismatch { expected: String, found: String },
}

impl RuntimeError {
    /// `StepBudgetExceeded` is explicitly not a bug (spec §4.7); every
    /// other variant is a reportable defect in the system under test.
    pub fn is_bug(&self) -> bool {
        !matches!(self, RuntimeError::StepBudgetExceeded(_))
    }
}
