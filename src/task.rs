//! C7 — the controlled-task shim (spec §4.5): `ControlledTask` gives
//! user code (or code rewritten by the out-of-scope binary rewriter, spec
//! §6) a cooperative task primitive whose every scheduling point resolves
//! through the same deterministic scheduler actor handlers use, instead
//! of a real OS/runtime scheduler.
//!
//! The primitives themselves (`Run`, `Delay`, `Yield`, `WhenAll`,
//! `WhenAny`, `Wait`) are implemented as [`crate::context::Context`]
//! methods — the design note's "all user-visible APIs are methods on the
//! context" applies to tasks exactly as it does to Create/Send/Random —
//! this module only owns the public handle type and the rewriter boundary
//! guard.

use crate::errors::RuntimeError;
use crate::kernel::operation::OperationId;

/// A handle to a `ControlledTask` operation registered with the scheduler.
/// Obtained from [`crate::context::Context::run_task`]/`delay`; pass it to
/// `when_all`/`when_any`/`wait` to observe completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlledTask {
    pub(crate) operation: OperationId,
}

impl ControlledTask {
    pub fn operation_id(&self) -> OperationId {
        self.operation
    }
}

/// Stands in for the binary rewriter's `CheckReturnedTaskIsControlled`
/// guard (spec §6's binary-rewriting contract): called with whatever an
/// inter-assembly call returned once the rewriter's boundary is in place.
/// A foreign, non-controlled awaitable reaching this point is exactly the
/// failure mode `UncontrolledTaskDetected` exists to report.
pub fn check_returned_task_is_controlled(is_controlled: bool, method: &str) -> Result<(), RuntimeError> {
    if is_controlled {
        Ok(())
    } else {
        Err(RuntimeError::UncontrolledTaskDetected(method.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncontrolled_task_is_reported() {
        let err = check_returned_task_is_controlled(false, "Foreign::call").unwrap_err();
        assert!(matches!(err, RuntimeError::UncontrolledTaskDetected(_)));
    }

    #[test]
    fn controlled_task_passes() {
        assert!(check_returned_task_is_controlled(true, "Foreign::call").is_ok());
    }
}
