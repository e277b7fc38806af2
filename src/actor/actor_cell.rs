//! C4 (actor bookkeeping) — `ActorCell` is the per-actor state the
//! execution context keeps alongside the boxed `Actor` impl, and
//! `Context` is the narrow handle a running handler uses to reach back
//! into the context (design note: actors hold only their own id; `Context`
//! is constructed fresh for each handler invocation and is never stored
//! by the actor between calls, so there is no actor↔context reference
//! cycle).
//!
//! Grounded on the teacher's `ActorCell`/`ActorCellInner` (status fields,
//! `is_terminating` flag) and `Context<Msg>` (the handle threaded through
//! every `Actor` method), trimmed of the parent/child tree and remote/
//! persistence fields this runtime has no use for.

use crate::actor::actor_ref::{ActorId, BasicActorRef};
use crate::context::Shared;
use crate::event::EventGroupId;

/// Status of an actor's handler loop (spec §3's Actor `status` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorStatus {
    /// Nothing enqueued, nothing running.
    Idle,
    /// Enqueued for the scheduler to run but not yet dispatched.
    Enqueued,
    /// Currently executing a handler (G2: at most one actor system-wide).
    Running,
    /// Suspended inside `Receive`, waiting for a matching event.
    Waiting,
    /// Terminated; no further deliveries (P6).
    Halted,
}

/// Per-actor bookkeeping owned by the `ExecutionContext` (spec §3's
/// `Actor` record minus the boxed behavior itself, which lives alongside
/// it in `ExecutionContextInner::actors`).
pub struct ActorCell {
    pub id: ActorId,
    pub status: ActorStatus,
    pub current_event_group: Option<EventGroupId>,
}

impl ActorCell {
    pub fn new(id: ActorId) -> Self {
        ActorCell {
            id,
            status: ActorStatus::Idle,
            current_event_group: None,
        }
    }

    pub fn basic_ref(&self) -> BasicActorRef {
        BasicActorRef::new(self.id.clone())
    }
}

/// The handle passed to every `Actor`/`StateMachine` method. Exposes the
/// execution context's user-visible primitives (create/send/receive/
/// random/assert/monitor — spec §4.6) scoped to the actor currently
/// running, without giving the actor a stored reference to the context.
#[derive(Clone)]
pub struct Context {
    pub(crate) myself: ActorId,
    pub(crate) shared: Shared,
}

impl Context {
    pub fn new(myself: ActorId, shared: Shared) -> Self {
        Context { myself, shared }
    }

    pub fn myself(&self) -> &ActorId {
        &self.myself
    }

    pub fn basic_ref(&self) -> BasicActorRef {
        BasicActorRef::new(self.myself.clone())
    }
}
