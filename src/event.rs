//! C1 — the immutable payload exchanged between actors.

use std::any::Any;
use std::fmt;

/// A causal identifier copied from a sender to the events it produces.
/// Used to correlate related work across actors; two events with the same
/// group id were caused, transitively, by the same originating send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventGroupId(pub(crate) u64);

/// The tag used for handler-table lookup and deferral/ignore sets.
///
/// Kinds are compared by value, never by the event's payload, so two
/// events of the same kind but different payloads defer/ignore/dispatch
/// identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventKind(pub &'static str);

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Marker for user-defined event payload types, analogous to the teacher's
/// blanket `Message` trait but without `Clone`: events are deeply immutable
/// once sent and are never duplicated, only moved or referenced.
pub trait EventPayload: Any + fmt::Debug + Send + 'static {
    fn kind(&self) -> EventKind;
}

/// An opaque value with equality-free identity (spec §3): two `Event`s are
/// never compared to each other, only matched by `kind()`.
pub struct Event {
    kind: EventKind,
    group: Option<EventGroupId>,
    payload: Box<dyn Any + Send>,
}

impl Event {
    pub fn new<T: EventPayload>(payload: T) -> Self {
        let kind = payload.kind();
        Event {
            kind,
            group: None,
            payload: Box::new(payload),
        }
    }

    pub fn with_group<T: EventPayload>(payload: T, group: EventGroupId) -> Self {
        let mut ev = Event::new(payload);
        ev.group = Some(group);
        ev
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn group(&self) -> Option<EventGroupId> {
        self.group
    }

    /// Tags the event with the sender's current event group if it isn't
    /// already carrying one explicitly (spec §3: "group identifier used
    /// for causal grouping across sends"). Used by `Context::send`.
    pub(crate) fn inherit_group(&mut self, group: Option<EventGroupId>) {
        if self.group.is_none() {
            self.group = group;
        }
    }

    /// Special kind recognized by the handler loop (spec §4.2): terminates
    /// the actor after the current handler runs to completion.
    pub const HALT: EventKind = EventKind("__halt__");

    pub fn halt() -> Self {
        Event {
            kind: Self::HALT,
            group: None,
            payload: Box::new(()),
        }
    }

    /// Downcast the payload, consuming the event. Fails (returns the event
    /// back) if the requested type does not match the stored payload.
    pub fn downcast<T: EventPayload>(self) -> Result<T, Event> {
        if self.payload.is::<T>() {
            Ok(*self.payload.downcast::<T>().unwrap())
        } else {
            Err(self)
        }
    }

    pub fn payload_ref<T: EventPayload>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("group", &self.group)
            .finish()
    }
}

impl EventPayload for () {
    fn kind(&self) -> EventKind {
        Event::HALT
    }
}
