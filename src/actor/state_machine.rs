//! C5 — the state-machine interpreter: hierarchical states, push/pop,
//! entry/exit, raise, goto (spec §4.3). This is the largest component by
//! design budget and has no direct precedent in the teacher, which has no
//! notion of nested/stacked actor states; it is grounded instead on the
//! design note that replaces reflection-based handler lookup with "an
//! explicit table `kind → handler_function` constructed at state-machine
//! build time", built here the same way the teacher constructs its own
//! dispatch tables — a plain `HashMap` populated once and never mutated
//! after construction — and on `actor_trait::Actor`, which `StateMachine`
//! implements exactly like any other actor.

use std::collections::HashSet;
use std::rc::Rc;

use async_trait::async_trait;

use crate::actor::actor_cell::Context;
use crate::actor::actor_ref::Sender;
use crate::actor::actor_trait::{Actor, ExceptionPolicy};
use crate::event::{Event, EventKind};

/// Tags observed only by monitors (spec §4.4); a plain `StateMachine`
/// (as opposed to a `Monitor`) never reads these itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Hot,
    Cold,
    Start,
}

pub type Action = Rc<dyn Fn(&Context, &mut StateMachine, &Event)>;
pub type EntryExit = Rc<dyn Fn(&Context, &mut StateMachine)>;

#[derive(Clone)]
pub enum Transition {
    Do(Action),
    Goto(&'static str),
    Push(&'static str),
}

/// One state in the machine (spec §3 `State`).
pub struct State {
    name: &'static str,
    entry: Option<EntryExit>,
    exit: Option<EntryExit>,
    handlers: std::collections::HashMap<EventKind, Transition>,
    deferred: HashSet<EventKind>,
    ignored: HashSet<EventKind>,
    tags: HashSet<Tag>,
}

impl State {
    pub fn new(name: &'static str) -> Self {
        State {
            name,
            entry: None,
            exit: None,
            handlers: std::collections::HashMap::new(),
            deferred: HashSet::new(),
            ignored: HashSet::new(),
            tags: HashSet::new(),
        }
    }

    pub fn on_entry(mut self, f: impl Fn(&Context, &mut StateMachine) + 'static) -> Self {
        self.entry = Some(Rc::new(f));
        self
    }

    pub fn on_exit(mut self, f: impl Fn(&Context, &mut StateMachine) + 'static) -> Self {
        self.exit = Some(Rc::new(f));
        self
    }

    /// Registers a handler for `kind`. Declaring the same kind twice at
    /// one state is a construction-time error (spec §4.3): panics, the
    /// same way a duplicate `match` arm would be a compile error if this
    /// table were built by the language instead of by hand.
    pub fn on(mut self, kind: EventKind, transition: Transition) -> Self {
        if self.handlers.insert(kind, transition).is_some() {
            panic!(
                "state \"{}\" declares a handler for {} more than once",
                self.name, kind
            );
        }
        self
    }

    pub fn ignore(mut self, kind: EventKind) -> Self {
        self.ignored.insert(kind);
        self
    }

    pub fn defer(mut self, kind: EventKind) -> Self {
        self.deferred.insert(kind);
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.insert(tag);
        self
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

enum Resolution {
    Transition(Transition),
    Ignored,
    Unhandled,
}

/// An actor whose handler table is indexed by a stack of states (spec
/// GLOSSARY). `state_stack` is never empty while live (G4): the bottom
/// frame is the `Start`-tagged initial state.
pub struct StateMachine {
    states: std::collections::HashMap<&'static str, State>,
    stack: Vec<&'static str>,
    pending_raise_during_exit: Option<Event>,
    exception_policy: ExceptionPolicy,
}

impl StateMachine {
    /// Builds a machine from its states. Panics (construction-time error)
    /// if zero or more than one state carries the `Start` tag (spec §4.3:
    /// "exactly one start state per machine is required").
    pub fn new(states: Vec<State>) -> Self {
        let start: Vec<&'static str> = states
            .iter()
            .filter(|s| s.has_tag(Tag::Start))
            .map(|s| s.name)
            .collect();
        if start.len() != 1 {
            panic!(
                "a state machine must have exactly one Start state, found {}",
                start.len()
            );
        }
        let initial = start[0];
        let mut map = std::collections::HashMap::new();
        for s in states {
            map.insert(s.name, s);
        }
        StateMachine {
            states: map,
            stack: vec![initial],
            pending_raise_during_exit: None,
            exception_policy: ExceptionPolicy::Propagate,
        }
    }

    pub fn with_exception_policy(mut self, policy: ExceptionPolicy) -> Self {
        self.exception_policy = policy;
        self
    }

    pub fn current(&self) -> &'static str {
        *self.stack.last().expect("state_stack must never be empty (G4)")
    }

    pub fn hot_states(&self) -> Vec<&'static str> {
        self.stack
            .iter()
            .filter(|name| self.states.get(*name).map_or(false, |s| s.has_tag(Tag::Hot)))
            .copied()
            .collect()
    }

    fn resolve(&self, kind: EventKind) -> Resolution {
        for name in self.stack.iter().rev() {
            let state = self.states.get(name).expect("stack references a known state");
            if let Some(t) = state.handlers.get(&kind) {
                return Resolution::Transition(t.clone());
            }
            if state.ignored.contains(&kind) {
                return Resolution::Ignored;
            }
        }
        Resolution::Unhandled
    }

    /// `Push(target)`: pushes `target` after running *no* exit actions;
    /// `target`'s entry action runs.
    pub fn push(&mut self, ctx: &Context, target: &'static str) {
        self.stack.push(target);
        self.run_entry(ctx, target);
    }

    /// `Pop()`: pops the top, runs its exit, transitions to the new top
    /// *without* running its entry.
    pub fn pop(&mut self, ctx: &Context) {
        if self.stack.len() <= 1 {
            return; // bottom frame is never popped (G4)
        }
        let top = self.stack.pop().unwrap();
        self.run_exit(ctx, top);
    }

    /// `Goto(target)`: pops states until the stack is empty, running their
    /// exit actions top-down, then pushes `target` and runs its entry.
    pub fn goto(&mut self, ctx: &Context, target: &'static str) {
        while let Some(top) = self.stack.pop() {
            self.run_exit(ctx, top);
        }
        self.stack.push(target);
        self.run_entry(ctx, target);
    }

    /// Runs the current state's entry action. Used both by
    /// `Actor::pre_start` (a `StateMachine` running as an actor, before its
    /// first dequeue) and by [`crate::monitor::Monitor`]'s first dispatch
    /// (a monitor has no scheduled lifecycle of its own to hook `pre_start`
    /// into, so it runs its `Start` state's entry the first time it
    /// observes an event instead).
    pub fn run_start_entry(&mut self, ctx: &Context) {
        let initial = self.current();
        self.run_entry(ctx, initial);
    }

    fn run_entry(&mut self, ctx: &Context, name: &'static str) {
        let entry = self.states.get(name).and_then(|s| s.entry.clone());
        let deferred: Vec<EventKind> = self
            .states
            .get(name)
            .map(|s| s.deferred.iter().copied().collect())
            .unwrap_or_default();
        ctx.defer(deferred);
        if let Some(entry) = entry {
            entry(ctx, self);
        }
    }

    fn run_exit(&mut self, ctx: &Context, name: &'static str) {
        let exit = self.states.get(name).and_then(|s| s.exit.clone());
        if let Some(exit) = exit {
            exit(ctx, self);
        }
        let deferred: Vec<EventKind> = self
            .states
            .get(name)
            .map(|s| s.deferred.iter().copied().collect())
            .unwrap_or_default();
        ctx.recall_deferred(deferred);
    }

    /// `Raise(event)` from inside an exit action: buffered until every
    /// exit in the current pop/goto chain has run (design note decision:
    /// "exit completes first"), then delivered as the pending raised
    /// event of the new top-of-stack state.
    pub fn raise_during_exit(&mut self, event: Event) {
        self.pending_raise_during_exit = Some(event);
    }

    pub fn is_in_tagged_state(&self, tag: Tag) -> bool {
        self.states.get(self.current()).map_or(false, |s| s.has_tag(tag))
    }

    /// Monitor-style dispatch (spec §4.4): same handler-table walk as
    /// `recv`, but an unhandled event is silently ignored rather than
    /// recorded as a failure — a monitor only reacts to what it names.
    pub fn dispatch_monitor(&mut self, ctx: &Context, event: &Event) {
        match self.resolve(event.kind()) {
            Resolution::Ignored | Resolution::Unhandled => {}
            Resolution::Transition(Transition::Do(action)) => {
                action(ctx, self, event);
            }
            Resolution::Transition(Transition::Goto(target)) => {
                self.goto(ctx, target);
            }
            Resolution::Transition(Transition::Push(target)) => {
                self.push(ctx, target);
            }
        }
    }
}

#[async_trait(?Send)]
impl Actor for StateMachine {
    fn exception_policy(&self) -> ExceptionPolicy {
        self.exception_policy
    }

    /// Runs the `Start` state's entry action before the first dequeue —
    /// the machine would otherwise sit in its initial state having never
    /// deferred/sent/raised anything an `on_entry` closure set up.
    async fn pre_start(&mut self, ctx: &Context) {
        self.run_start_entry(ctx);
    }

    async fn recv(&mut self, ctx: &Context, event: Event, _sender: Sender) {
        match self.resolve(event.kind()) {
            Resolution::Ignored => {}
            Resolution::Unhandled => {
                ctx.record_error(crate::errors::RuntimeError::UnhandledEvent {
                    actor: ctx.myself().to_string(),
                    state: self.current().to_string(),
                    kind: event.kind(),
                });
            }
            Resolution::Transition(Transition::Do(action)) => {
                action(ctx, self, &event);
            }
            Resolution::Transition(Transition::Goto(target)) => {
                self.goto(ctx, target);
            }
            Resolution::Transition(Transition::Push(target)) => {
                self.push(ctx, target);
            }
        }

        if let Some(raised) = self.pending_raise_during_exit.take() {
            ctx.raise(raised);
        }
    }
}
