//! C2 — actor identity: a stable, comparable handle for an actor.
//!
//! Riker's `ActorRef`/`BasicActorRef` pair addressed actors through a tree
//! of paths (`/user/foo/bar`) maintained by a kernel thread. This runtime
//! has no actor tree and no real threads (design note: avoid cyclic
//! references between actor and context — actors hold only their own id
//! and reach the context through a narrow interface), so `ActorId` here is
//! the flat `{ numeric_id OR stable_name, type_tag, display_name }` tuple
//! spec §3 describes directly, and `ActorRef`/`BasicActorRef` are thin
//! typed/untyped wrappers around it rather than tree-walking handles.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::actor::actor_trait::Actor;

static NEXT_NUMERIC_ID: AtomicU64 = AtomicU64::new(0);

pub fn next_numeric_id() -> u64 {
    NEXT_NUMERIC_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone)]
pub enum ActorIdentity {
    Named(Arc<str>),
    Numeric(u64),
}

/// `{ numeric_id OR stable_name, type_tag, display_name }` (spec §3).
///
/// Equality holds iff the identities agree on (name-mode, id/name); the
/// `type_tag`/`display_name` fields are metadata only and are excluded
/// from `PartialEq`/`Hash` so that two `ActorId`s obtained from different
/// call sites but naming the same actor compare equal.
#[derive(Debug, Clone)]
pub struct ActorId {
    pub identity: ActorIdentity,
    pub type_tag: &'static str,
    pub display_name: String,
}

impl ActorId {
    pub fn named(name: Arc<str>, type_tag: &'static str) -> Self {
        ActorId {
            display_name: name.to_string(),
            identity: ActorIdentity::Named(name),
            type_tag,
        }
    }

    pub fn numeric(type_tag: &'static str) -> Self {
        let id = next_numeric_id();
        ActorId {
            display_name: format!("{}#{}", type_tag, id),
            identity: ActorIdentity::Numeric(id),
            type_tag,
        }
    }
}

impl PartialEq for ActorId {
    fn eq(&self, other: &Self) -> bool {
        match (&self.identity, &other.identity) {
            (ActorIdentity::Named(a), ActorIdentity::Named(b)) => a == b,
            (ActorIdentity::Numeric(a), ActorIdentity::Numeric(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for ActorId {}

impl std::hash::Hash for ActorId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match &self.identity {
            ActorIdentity::Named(n) => {
                0u8.hash(state);
                n.hash(state);
            }
            ActorIdentity::Numeric(n) => {
                1u8.hash(state);
                n.hash(state);
            }
        }
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

/// Untyped handle, stored in `Sender` fields and anywhere the concrete
/// `Actor::Msg` type isn't known (mirrors riker's `BasicActorRef`, minus
/// the tree-walking machinery).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BasicActorRef {
    pub id: ActorId,
}

impl BasicActorRef {
    pub fn new(id: ActorId) -> Self {
        BasicActorRef { id }
    }
}

impl fmt::Display for BasicActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

/// The sender attached to an enqueued event, `None` for events the
/// execution context itself originates.
pub type Sender = Option<BasicActorRef>;

/// Typed handle to an actor of a known type, used by call sites that know
/// `A` and want the compiler to check the event type they send.
pub struct ActorRef<A: Actor> {
    pub id: ActorId,
    _marker: PhantomData<A>,
}

impl<A: Actor> ActorRef<A> {
    pub fn new(id: ActorId) -> Self {
        ActorRef {
            id,
            _marker: PhantomData,
        }
    }

    pub fn basic(&self) -> BasicActorRef {
        BasicActorRef::new(self.id.clone())
    }
}

impl<A: Actor> Clone for ActorRef<A> {
    fn clone(&self) -> Self {
        ActorRef::new(self.id.clone())
    }
}

impl<A: Actor> fmt::Debug for ActorRef<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRef").field("id", &self.id).finish()
    }
}

impl<A: Actor> PartialEq for ActorRef<A> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
