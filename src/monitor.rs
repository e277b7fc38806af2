//! C6 — safety/liveness monitors: passive state machines that observe
//! events sent to them with `Context::monitor` (spec §4.4) but never
//! reply and are never scheduled as their own operation. A monitor
//! transition runs synchronously, inline with whichever actor raised the
//! event — there is no dequeue, no scheduling point, nothing for the
//! scheduler to interleave.
//!
//! Grounded on `actor::state_machine`: a monitor reuses `StateMachine`
//! verbatim for its handler table and `Push`/`Goto` semantics, driving it
//! through `dispatch_monitor` instead of the `Actor::recv` entry point
//! actors use.

use crate::actor::actor_cell::Context;
use crate::actor::state_machine::{StateMachine, Tag};
use crate::event::Event;

pub use crate::actor::state_machine::{State as MonitorState, Tag as MonitorTag};

/// A registered monitor: same state/handler-table shape as
/// [`StateMachine`], invoked synchronously rather than scheduled.
pub struct Monitor {
    type_tag: &'static str,
    machine: StateMachine,
    started: bool,
}

impl Monitor {
    /// `type_tag` identifies the monitor (spec §4.4's `Monitor<T>` — `T`
    /// names which registered monitor receives the event); callers pass
    /// `std::any::type_name::<T>()` or a stable string constant.
    pub fn new(type_tag: &'static str, states: Vec<MonitorState>) -> Self {
        Monitor {
            type_tag,
            machine: StateMachine::new(states),
            started: false,
        }
    }

    pub fn type_tag(&self) -> &'static str {
        self.type_tag
    }

    pub fn current(&self) -> &'static str {
        self.machine.current()
    }

    pub fn is_hot(&self) -> bool {
        self.machine.is_in_tagged_state(Tag::Hot)
    }

    pub fn is_cold(&self) -> bool {
        self.machine.is_in_tagged_state(Tag::Cold)
    }

    /// Runs the `Start` state's entry action the first time this monitor
    /// is dispatched to, then delivers `event` as usual. A monitor with no
    /// `Actor` lifecycle of its own has no `pre_start` to hook an initial
    /// `on_entry` into (unlike `StateMachine`, spec §4.4), so the first
    /// observed event stands in for it instead.
    pub fn dispatch(&mut self, ctx: &Context, event: &Event) {
        if !self.started {
            self.started = true;
            self.machine.run_start_entry(ctx);
        }
        self.machine.dispatch_monitor(ctx, event);
    }
}

/// Per-monitor bookkeeping kept in [`crate::context::Inner`].
pub struct MonitorSlot {
    monitor: Monitor,
}

impl MonitorSlot {
    pub fn new(monitor: Monitor) -> Self {
        MonitorSlot { monitor }
    }

    pub fn type_tag(&self) -> &'static str {
        self.monitor.type_tag()
    }

    pub fn current_state(&self) -> &'static str {
        self.monitor.current()
    }

    pub fn is_hot(&self) -> bool {
        self.monitor.is_hot()
    }

    pub fn is_cold(&self) -> bool {
        self.monitor.is_cold()
    }

    pub fn dispatch(&mut self, ctx: &Context, event: &Event) {
        self.monitor.dispatch(ctx, event);
    }
}
