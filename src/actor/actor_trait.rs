//! C4 — actor base: the mailbox-driven reactive object.
//!
//! Grounded on the teacher's `async_trait`-based `Actor` (pre_start /
//! post_start / post_stop / recv / sys_recv), kept nearly as-is: the
//! handler loop in `kernel::mailbox::run_mailbox` still calls exactly
//! these methods at exactly these points. Unlike the teacher, `recv` takes
//! the type-erased [`Event`] rather than an associated `Msg` type — the
//! state-machine interpreter (C5) and the monitor (C6) both dispatch on
//! `EventKind` through an explicit handler table, not on a Rust type, so a
//! single non-generic `Actor` trait lets `ExecutionContext` hold every
//! actor in one `id → Box<dyn Actor>` map (design note: the context is an
//! arena that owns actors by stable id).
//!
//! `supervisor_strategy` / `Strategy::{Stop,Restart,Escalate}` are dropped
//! — this runtime has no parent/child supervision tree — and replaced
//! with `ExceptionPolicy`, following the design note that models
//! actor-exception handling as an enum consulted by a single `catch`
//! boundary in the handler loop.
//!
//! The scheduler runs cooperatively on a single OS thread (spec §5: "no
//! real parallel execution"), so the context handle threaded through
//! `Context` is reference-counted but not `Sync`; the trait is declared
//! `#[async_trait(?Send)]` rather than requiring `Send` futures, the same
//! relaxation `async_trait` documents for single-threaded executors.

use async_trait::async_trait;

use crate::actor::actor_cell::Context;
use crate::actor::actor_ref::Sender;
use crate::event::Event;

/// How a handler exception (a panic caught at the handler-loop boundary)
/// is resolved, consulted once per failed handler invocation (spec §4.3,
/// design note "exceptions as control flow").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionPolicy {
    /// Swallow the exception; the actor keeps running.
    Ignore,
    /// Halt the actor, as if it had processed an `Event::halt()`.
    Halt,
    /// Surface the exception as a recorded failure on the context.
    Propagate,
}

#[async_trait(?Send)]
pub trait Actor: 'static {
    /// Invoked once, before the actor's first inbox dequeue.
    async fn pre_start(&mut self, ctx: &Context) {}

    /// Invoked once, immediately after `pre_start` and the actor's setup
    /// event (if any) have run.
    async fn post_start(&mut self, ctx: &Context) {}

    /// Invoked after the actor halts.
    async fn post_stop(&mut self) {}

    /// Resolved once per failed handler invocation; default matches the
    /// source behavior of surfacing the failure.
    fn exception_policy(&self) -> ExceptionPolicy {
        ExceptionPolicy::Propagate
    }

    /// Invoked once per dequeued (or raised) event; `ctx` exposes the
    /// narrow execution-context interface (create/send/receive/random/
    /// assert/monitor) available to handler bodies.
    async fn recv(&mut self, ctx: &Context, event: Event, sender: Sender);
}

#[async_trait(?Send)]
impl<A: Actor + ?Sized> Actor for Box<A> {
    async fn pre_start(&mut self, ctx: &Context) {
        (**self).pre_start(ctx).await;
    }

    async fn post_start(&mut self, ctx: &Context) {
        (**self).post_start(ctx).await
    }

    async fn post_stop(&mut self) {
        (**self).post_stop().await
    }

    fn exception_policy(&self) -> ExceptionPolicy {
        (**self).exception_policy()
    }

    async fn recv(&mut self, ctx: &Context, event: Event, sender: Sender) {
        (**self).recv(ctx, event, sender).await
    }
}

/// The actor trait object, mirroring the teacher's `BoxActor<Msg>`.
pub type BoxActor = Box<dyn Actor>;
