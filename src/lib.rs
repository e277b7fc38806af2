#![crate_name = "vigil"]
#![deny(clippy::all)]
#![allow(clippy::new_ret_no_self)]
#![allow(clippy::large_enum_variant)]

//! A controlled actor runtime for systematic concurrency testing.
//!
//! User code only ever calls [`context::ExecutionContext`] primitives
//! (create, send, receive, random, assert, monitor); everything else in
//! this crate exists to make those primitives serialize through a single
//! deterministic [`scheduler`].

mod validate;

pub mod actor;
pub mod config;
pub mod context;
pub mod errors;
pub mod event;
pub mod kernel;
pub mod liveness;
pub mod monitor;
pub mod rewrite;
pub mod scheduler;
pub mod task;
pub mod trace;

pub use crate::config::{load_config, Configuration};
pub use crate::context::ExecutionContext;
pub use crate::errors::RuntimeError;
pub use crate::event::{Event, EventGroupId, EventKind, EventPayload};

/// Commonly imported items for user code defining actors and monitors.
pub mod prelude {
    pub use crate::actor::{
        Actor, ActorId, ActorRef, BasicActorRef, Context, ExceptionPolicy, Props, Sender,
    };
    pub use crate::actor::state_machine::{State, StateMachine, Transition};
    pub use crate::config::{Configuration, SchedulerStrategy};
    pub use crate::context::ExecutionContext;
    pub use crate::errors::RuntimeError;
    pub use crate::event::{Event, EventGroupId, EventKind, EventPayload};
    pub use crate::monitor::{Monitor, MonitorTag};
}
