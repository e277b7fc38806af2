//! C3 — per-actor FIFO inbox with deferral and receive-filtering.
//!
//! Grounded on the teacher's `kernel::queue` (an mpsc-backed FIFO) and
//! `kernel::mailbox` (the deferred/suspended-receive bookkeeping), merged
//! into one structure: spec §4.1 describes a single component, and there
//! is no concurrent producer/consumer here to justify splitting a channel
//! from its waiter state — the scheduler is the only caller, one step at a
//! time (G1/G2), so a plain `VecDeque` replaces the teacher's
//! `futures::channel::mpsc::unbounded` + `futures::lock::Mutex`.

use std::collections::{HashSet, VecDeque};

use crate::event::{Event, EventGroupId, EventKind};

/// A one-shot filter installed by `Receive(kinds, predicate?)`, consumed
/// by the next matching enqueue (spec §4.1, open question #1: a second
/// `Receive` while a filter is still pending replaces it rather than
/// stacking).
pub struct ReceiveFilter {
    pub kinds: HashSet<EventKind>,
    pub predicate: Option<Box<dyn Fn(&Event) -> bool>>,
}

impl ReceiveFilter {
    pub fn matches(&self, event: &Event) -> bool {
        self.kinds.contains(&event.kind()) && self.predicate.as_ref().map_or(true, |p| p(event))
    }
}

#[derive(Debug)]
pub enum EnqueueResult {
    Delivered,
    Dropped,
    Halted,
}

pub enum DequeueResult {
    Ready(Event, Option<EventGroupId>),
    /// Every queued event's kind is currently deferred; the handler loop
    /// sleeps until a non-deferred enqueue wakes it.
    Defer,
    Empty,
}

/// Spec §3 `Inbox`: an ordered sequence of events plus a deferred-kind set
/// and an optional one-shot receive filter.
#[derive(Default)]
pub struct Inbox {
    queue: VecDeque<Event>,
    deferred: HashSet<EventKind>,
    filter: Option<ReceiveFilter>,
    halted: bool,
    /// Set when an enqueue satisfies a pending receive filter directly,
    /// bypassing the queue (spec §4.1: "the waiter is woken and the event
    /// is handed to it instead of staying in the queue").
    handed_off: Option<(Event, Option<EventGroupId>)>,
}

impl Inbox {
    pub fn new() -> Self {
        Inbox::default()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// (I1) is enforced by the scheduler (only one Running operation at a
    /// time), not here; this method only implements ordering/filter logic.
    pub fn enqueue(&mut self, event: Event) -> EnqueueResult {
        if self.halted {
            return EnqueueResult::Halted;
        }
        if event.kind() == Event::HALT {
            self.queue.push_back(event);
            return EnqueueResult::Delivered;
        }
        if let Some(filter) = &self.filter {
            if filter.matches(&event) {
                let group = event.group();
                self.handed_off = Some((event, group));
                self.filter = None;
                return EnqueueResult::Delivered;
            }
        }
        self.queue.push_back(event);
        EnqueueResult::Delivered
    }

    /// (I2): an event is dequeued only if its kind is not deferred and
    /// either no filter is active or it matches the filter.
    pub fn dequeue(&mut self) -> DequeueResult {
        if let Some((event, group)) = self.handed_off.take() {
            return DequeueResult::Ready(event, group);
        }
        if self.queue.is_empty() {
            return DequeueResult::Empty;
        }

        let mut scanned = 0;
        let mut stash = VecDeque::new();
        let mut found = None;
        while let Some(event) = self.queue.pop_front() {
            scanned += 1;
            let eligible = !self.deferred.contains(&event.kind())
                && self.filter.as_ref().map_or(true, |f| f.matches(&event));
            if eligible {
                found = Some(event);
                break;
            }
            stash.push_back(event);
        }
        // restore the scanned-but-ineligible prefix ahead of the remainder
        while let Some(event) = stash.pop_back() {
            self.queue.push_front(event);
        }

        match found {
            Some(event) => {
                let group = event.group();
                DequeueResult::Ready(event, group)
            }
            None if scanned > 0 => DequeueResult::Defer,
            None => DequeueResult::Empty,
        }
    }

    pub fn set_receive_filter(&mut self, kinds: HashSet<EventKind>, predicate: Option<Box<dyn Fn(&Event) -> bool>>) {
        self.filter = Some(ReceiveFilter { kinds, predicate });
    }

    pub fn clear_receive_filter(&mut self) {
        self.filter = None;
    }

    pub fn defer(&mut self, kinds: impl IntoIterator<Item = EventKind>) {
        self.deferred.extend(kinds);
    }

    /// Removes `kinds` from the deferred set and re-checks the queue head
    /// so previously deferred events become eligible again in their
    /// original relative order (P4).
    pub fn recall_deferred(&mut self, kinds: impl IntoIterator<Item = EventKind>) {
        for kind in kinds {
            self.deferred.remove(&kind);
        }
    }

    pub fn halt(&mut self) {
        self.halted = true;
        self.queue.clear();
    }

    pub fn count_of(&self, kind: EventKind) -> usize {
        self.queue.iter().filter(|e| e.kind() == kind).count()
    }

    pub fn has_events(&self) -> bool {
        !self.queue.is_empty() || self.handed_off.is_some()
    }
}
