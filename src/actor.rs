#![allow(unused_variables)]
pub(crate) mod actor_cell;
pub(crate) mod actor_ref;
pub(crate) mod actor_trait;
pub(crate) mod props;
pub mod state_machine;

pub use self::actor_cell::Context;
pub use self::actor_ref::{ActorId, ActorRef, BasicActorRef, Sender};
pub use self::actor_trait::{Actor, BoxActor, ExceptionPolicy};
pub use self::props::{ActorFactory, ActorFactoryArgs, Props};
pub use self::state_machine::{State, StateMachine, Transition};
