//! C9 data model — the scheduler-visible unit of work (spec §3
//! `Operation`).
//!
//! Grounded on the teacher's `kernel::kernel_ref` (which wrapped every
//! scheduling decision as a message to a kernel actor); here there is no
//! kernel thread, so an `Operation` is a plain record the scheduler
//! selects among. Resumption itself runs over the single `go`/`step_done`
//! baton in `context::Inner`, shared by every operation rather than kept
//! per-operation.

use crate::actor::actor_ref::ActorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    ActorHandler,
    Task,
    Receive,
    Delay,
    SystemTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    OnReceive,
    OnResource,
    OnTask,
    OnDelay,
    /// Yielded after `Create` (spec §4.7 scheduling point); the operation
    /// itself stays Enabled throughout, see `Context::yield_point`.
    OnCreate,
    /// Yielded after `Send`.
    OnSend,
    /// Yielded after `Random`/`RandomBool`.
    OnRandom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    None,
    Enabled,
    Blocked(BlockReason),
    Completed,
}

/// A scheduler-visible unit of work (G2: at most one Running operation at
/// a time).
pub struct Operation {
    pub id: OperationId,
    pub kind: OperationKind,
    pub status: OperationStatus,
    pub owning_actor: Option<ActorId>,
}

impl Operation {
    pub fn new(id: OperationId, kind: OperationKind, owning_actor: Option<ActorId>) -> Self {
        Operation {
            id,
            kind,
            status: OperationStatus::None,
            owning_actor,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.status, OperationStatus::Enabled)
    }
}
