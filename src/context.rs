//! C8 — the execution context: owns every actor, its inbox, operation,
//! and the registered monitors; vends identities, event-group ids, and
//! controlled randomness.
//!
//! Grounded on the teacher's `ActorSystem` (the public surface: creating
//! actors, scheduling work, holding configuration) but rebuilt around the
//! design note that forbids cyclic back-pointers: `ExecutionContext` is a
//! handle (`Rc<RefCell<Inner>>`) shared with every `Context` it hands out;
//! actors never store that handle themselves, only their own `ActorId`
//! (design note: "represent the context as an arena that owns actors by
//! stable id; actors hold only their own id and call the context through
//! a narrow trait/interface").
//!
//! Single-threaded cooperative scheduling (spec §5) is implemented as a
//! baton handoff over a pair of `tokio::sync::Notify`s: the driver
//! (`run_iteration`) tells the chosen operation's task it has the turn,
//! waits for that task to report it has reached its next scheduling point
//! (or finished), then asks the `Scheduler` to choose again. Only one task
//! is ever runnable between handoffs, which is exactly G2.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::debug;

use crate::actor::actor_cell::{ActorCell, ActorStatus, Context};
use crate::actor::actor_ref::{ActorId, ActorRef, BasicActorRef};
use crate::actor::actor_trait::{Actor, ExceptionPolicy};
use crate::actor::props::Props;
use crate::config::Configuration;
use crate::errors::RuntimeError;
use crate::event::{Event, EventGroupId, EventKind};
use crate::kernel::operation::{BlockReason, OperationId, OperationKind, OperationStatus};
use crate::kernel::queue::{DequeueResult, EnqueueResult, Inbox};
use crate::monitor::{Monitor, MonitorSlot};
use crate::scheduler::{build_strategy, Scheduler};
use crate::validate::validate_name;

/// Per-actor state kept by the context: the boxed behavior plus its
/// bookkeeping cell and inbox. `pending_raise` implements spec §4.2 step
/// 1/4: a raised event takes priority over the next dequeue.
/// Where an actor is in its teacher-style lifecycle hooks (`pre_start` /
/// `post_start`), ambient to the core handler loop (spec §4.2's five
/// steps don't mention them) but carried the way the teacher's
/// `ActorCell` drives its own actors through the same two calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    NotStarted,
    PreStarted,
    Started,
}

struct ActorSlot {
    cell: ActorCell,
    actor: Box<dyn Actor>,
    inbox: Inbox,
    operation: OperationId,
    pending_raise: Option<Event>,
    lifecycle: Lifecycle,
}

pub(crate) struct Inner {
    actors: HashMap<ActorId, ActorSlot>,
    names: HashMap<Arc<str>, ActorId>,
    monitors: HashMap<&'static str, MonitorSlot>,
    scheduler: Scheduler,
    configuration: Configuration,
    event_group_next: u64,
    errors_list: Vec<RuntimeError>,
    turn: Option<OperationId>,
    go: Rc<Notify>,
    step_done: Rc<Notify>,
    /// Set while a `Monitor<T>` handler is executing, guarding against the
    /// re-entrant call the design notes forbid.
    monitor_in_progress: Option<&'static str>,
    /// C10 temperature counter (spec §4.8): incremented whenever any
    /// registered monitor is in a `Hot` state, reset the moment every
    /// monitor is `Cold`.
    liveness_temperature: u64,
}

pub type Shared = Rc<RefCell<Inner>>;

/// The handle the test harness owns: creates actors, drains the scheduler
/// loop, and reports the iteration's verdict.
pub struct ExecutionContext {
    shared: Shared,
}

impl ExecutionContext {
    pub fn new(configuration: Configuration) -> Self {
        let fairness_threshold = configuration.max_fair_scheduling_steps / 10;
        let strategy = build_strategy(&configuration.strategy, fairness_threshold.max(1));
        let scheduler = Scheduler::new(
            strategy,
            configuration.random_seed,
            configuration.max_unfair_scheduling_steps,
            configuration.max_fair_scheduling_steps,
        );
        let inner = Inner {
            actors: HashMap::new(),
            names: HashMap::new(),
            monitors: HashMap::new(),
            scheduler,
            configuration,
            event_group_next: 0,
            errors_list: Vec::new(),
            turn: None,
            go: Rc::new(Notify::new()),
            step_done: Rc::new(Notify::new()),
            monitor_in_progress: None,
            liveness_temperature: 0,
        };
        ExecutionContext {
            shared: Rc::new(RefCell::new(inner)),
        }
    }

    pub fn register_monitor(&self, monitor: Monitor) {
        let mut inner = self.shared.borrow_mut();
        inner.monitors.insert(monitor.type_tag(), MonitorSlot::new(monitor));
    }

    /// The trace of scheduling/nondeterministic choices made during the
    /// run (spec §4.9/C11) — the minimal witness needed to replay a
    /// failure via `SchedulerStrategy::Replay`.
    pub fn trace(&self) -> crate::trace::Trace {
        self.shared.borrow().scheduler.trace().clone()
    }

    /// `true` once the configured strategy has exhausted its search space
    /// (DFS only, spec §4.7); a systematic-testing loop uses this to stop
    /// iterating without treating it as a bug.
    pub fn is_exhausted(&self) -> bool {
        self.shared.borrow().scheduler.is_exhausted()
    }

    /// Runs one iteration of `testing_iterations` (spec §6): resets every
    /// actor/monitor/error from the previous iteration while keeping the
    /// scheduler's strategy state alive (DFS's choice stack, the seeded
    /// rng) so a systematic search actually explores a fresh interleaving
    /// each call instead of repeating the first one.
    pub fn run_iteration<A, F>(&self, name: Option<&str>, make: F, setup: Option<Event>) -> Vec<RuntimeError>
    where
        A: Actor + 'static,
        F: FnOnce() -> A,
    {
        {
            let mut inner = self.shared.borrow_mut();
            inner.actors.clear();
            inner.names.clear();
            inner.monitors.clear();
            inner.errors_list.clear();
            inner.turn = None;
            inner.monitor_in_progress = None;
            inner.liveness_temperature = 0;
            inner.scheduler.prepare_next_iteration();
        }
        self.run_to_completion(name, make, setup)
    }

    /// Creates the root actor (spec §4.2 `Create`) and drives the
    /// scheduler to quiescence or until a recorded failure makes the
    /// iteration's verdict. Returns the errors recorded during the run.
    pub fn run_to_completion<A, F>(
        &self,
        name: Option<&str>,
        make: F,
        setup: Option<Event>,
    ) -> Vec<RuntimeError>
    where
        A: Actor + 'static,
        F: FnOnce() -> A,
    {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to build the single-threaded scheduler runtime");
        let local = tokio::task::LocalSet::new();

        local.block_on(&rt, async {
            let root = self
                .create_internal(name, Box::new(make()), setup)
                .expect("root actor creation must succeed");
            self.spawn_actor_task(root.id.clone());
            self.drive().await;
        });

        self.shared.borrow().errors_list.clone()
    }

    fn create_internal(
        &self,
        name: Option<&str>,
        actor: Box<dyn Actor>,
        setup: Option<Event>,
    ) -> Result<BasicActorRef, RuntimeError> {
        let mut inner = self.shared.borrow_mut();
        let type_tag = std::any::type_name::<Box<dyn Actor>>();
        let id = match name {
            Some(n) => {
                validate_name(n)?;
                let arc_name: Arc<str> = Arc::from(n);
                if inner.names.contains_key(&arc_name) {
                    return Err(RuntimeError::NameAlreadyBound(n.to_string()));
                }
                let id = ActorId::named(arc_name.clone(), type_tag);
                inner.names.insert(arc_name, id.clone());
                id
            }
            None => ActorId::numeric(type_tag),
        };

        let operation = inner.scheduler.register_operation(OperationKind::ActorHandler, Some(id.clone()));
        let mut inbox = Inbox::new();
        if let Some(event) = setup {
            inbox.enqueue(event);
        }
        inner.actors.insert(
            id.clone(),
            ActorSlot {
                cell: ActorCell::new(id.clone()),
                actor,
                inbox,
                operation,
                pending_raise: None,
                lifecycle: Lifecycle::NotStarted,
            },
        );
        inner.scheduler.set_enabled(operation);
        debug!(actor = %id, "actor created");
        Ok(BasicActorRef::new(id))
    }

    fn spawn_actor_task(&self, id: ActorId) {
        let shared = self.shared.clone();
        tokio::task::spawn_local(async move {
            run_actor_loop(shared, id).await;
        });
    }

    /// The driver loop: repeatedly asks the scheduler to choose, hands
    /// the chosen operation the baton, and waits for it to report back
    /// before choosing again.
    async fn drive(&self) {
        loop {
            {
                // A recorded bug ends the iteration (spec §7 propagation
                // policy: "terminates the test iteration"); the turn that
                // found it already ran to completion and reported
                // step_done before we get here, so nothing is left
                // mid-handler. Not doing this would let a handler that
                // keeps re-triggering its own violation (scenario 1's
                // push/raise cycle) spin the driver forever.
                let inner = self.shared.borrow();
                if inner.errors_list.iter().any(|e| e.is_bug()) {
                    break;
                }
            }
            let chosen = {
                let mut inner = self.shared.borrow_mut();
                match inner.scheduler.select_next() {
                    Ok(Some(id)) => Some(id),
                    Ok(None) => None,
                    Err(e) => {
                        inner.errors_list.push(e);
                        None
                    }
                }
            };
            let Some(chosen) = chosen else { break };
            let step_done = {
                let mut inner = self.shared.borrow_mut();
                inner.turn = Some(chosen);
                inner.go.notify_waiters();
                inner.step_done.clone()
            };
            // wait for the running operation to reach its next scheduling
            // point (or finish) before picking again
            step_done.notified().await;

            if self.shared.borrow().scheduler_exhausted_or_done() {
                break;
            }
        }
    }
}

impl Inner {
    fn scheduler_exhausted_or_done(&self) -> bool {
        self.scheduler.all_quiescent() || self.scheduler.is_exhausted()
    }

    /// C10: any monitor Hot bumps the counter; every monitor Cold clears
    /// it. A mix of Hot and non-Cold-non-Hot monitors still counts as
    /// progress toward the threshold (spec §4.8: "cold resets only when
    /// no monitor remains hot" is the conservative reading we did not
    /// take — see DESIGN.md).
    fn update_liveness_temperature(&mut self) {
        let any_hot = self.monitors.values().any(|m| m.is_hot());
        let all_cold = !self.monitors.is_empty() && self.monitors.values().all(|m| m.is_cold());
        if all_cold {
            self.liveness_temperature = 0;
        } else if any_hot {
            self.liveness_temperature += 1;
        }
    }
}

/// Runs one actor's handler loop (spec §4.2) as a local task. Cooperates
/// with `ExecutionContext::drive` through the shared baton: each
/// iteration waits for its turn, performs one unit of work (at most one
/// dequeue-and-handle), then reports back via `step_done`.
async fn run_actor_loop(shared: Shared, id: ActorId) {
    loop {
        wait_for_turn(&shared, &id).await;

        let needs_pre_start = {
            let inner = shared.borrow();
            inner.actors.get(&id).map(|s| s.lifecycle) == Some(Lifecycle::NotStarted)
        };
        if needs_pre_start {
            let ctx = Context::new(id.clone(), shared.clone());
            let mut actor = {
                let mut inner = shared.borrow_mut();
                let Some(slot) = inner.actors.get_mut(&id) else { return };
                slot.lifecycle = Lifecycle::PreStarted;
                std::mem::replace(&mut slot.actor, Box::new(NullActor))
            };
            actor.pre_start(&ctx).await;
            let mut inner = shared.borrow_mut();
            if let Some(slot) = inner.actors.get_mut(&id) {
                slot.actor = actor;
            }
        }

        let next = {
            let mut inner = shared.borrow_mut();
            let slot = match inner.actors.get_mut(&id) {
                Some(s) => s,
                None => return,
            };
            if let Some(raised) = slot.pending_raise.take() {
                Some(raised)
            } else {
                match slot.inbox.dequeue() {
                    DequeueResult::Ready(event, group) => {
                        slot.cell.current_event_group = group;
                        Some(event)
                    }
                    DequeueResult::Defer | DequeueResult::Empty => None,
                }
            }
        };

        let Some(event) = next else {
            // nothing runnable right now; mark Blocked so the scheduler
            // picks someone else, and report the slice as finished
            let op = {
                let inner = shared.borrow();
                inner.actors.get(&id).map(|s| s.operation)
            };
            if let Some(op) = op {
                shared.borrow_mut().scheduler.set_blocked(op, BlockReason::OnReceive);
            }
            if needs_pre_start {
                // no setup event was enqueued: post_start runs right after
                // pre_start, with nothing processed in between
                run_post_start(&shared, &id).await;
            }
            report_step_done(&shared);
            continue;
        };

        if event.kind() == Event::HALT {
            let mut actor = {
                let mut inner = shared.borrow_mut();
                let slot = inner.actors.get_mut(&id).unwrap();
                slot.inbox.halt();
                slot.cell.status = ActorStatus::Halted;
                std::mem::replace(&mut slot.actor, Box::new(NullActor))
            };
            actor.post_stop().await;
            let op = shared.borrow().actors.get(&id).map(|s| s.operation);
            if let Some(op) = op {
                shared.borrow_mut().scheduler.complete(op);
            }
            report_step_done(&shared);
            return;
        }

        let ctx = Context::new(id.clone(), shared.clone());
        let sender = None; // sender threading is carried on the Event wrapper by callers that need it
        let op = { shared.borrow().actors.get(&id).map(|s| s.operation) };
        {
            let mut inner = shared.borrow_mut();
            if let Some(slot) = inner.actors.get_mut(&id) {
                slot.cell.status = ActorStatus::Running;
            }
        }

        // NOTE: panics inside user handlers are not unwind-caught here;
        // a production build would wrap this call with
        // `std::panic::catch_unwind` (actor state must be `UnwindSafe`)
        // and consult `exception_policy()` on failure, per spec §4.3.
        {
            let mut inner = shared.borrow_mut();
            let slot = inner.actors.get_mut(&id).unwrap();
            let mut actor = std::mem::replace(&mut slot.actor, Box::new(NullActor));
            drop(inner);
            actor.recv(&ctx, event, sender).await;
            let mut inner = shared.borrow_mut();
            if let Some(slot) = inner.actors.get_mut(&id) {
                slot.actor = actor;
                slot.cell.status = ActorStatus::Idle;
            }
        }

        if needs_pre_start {
            // this was the setup event (if any was enqueued); post_start
            // runs immediately after it has been handled
            run_post_start(&shared, &id).await;
        }

        if let Some(op) = op {
            shared.borrow_mut().scheduler.set_enabled(op);
        }
        report_step_done(&shared);
    }
}

async fn run_post_start(shared: &Shared, id: &ActorId) {
    let ctx = Context::new(id.clone(), shared.clone());
    let mut actor = {
        let mut inner = shared.borrow_mut();
        let Some(slot) = inner.actors.get_mut(id) else { return };
        slot.lifecycle = Lifecycle::Started;
        std::mem::replace(&mut slot.actor, Box::new(NullActor))
    };
    actor.post_start(&ctx).await;
    let mut inner = shared.borrow_mut();
    if let Some(slot) = inner.actors.get_mut(id) {
        slot.actor = actor;
    }
}

struct NullActor;

#[async_trait::async_trait(?Send)]
impl Actor for NullActor {
    async fn recv(&mut self, _ctx: &Context, _event: Event, _sender: crate::actor::actor_ref::Sender) {}
}

async fn wait_for_turn(shared: &Shared, id: &ActorId) {
    loop {
        let (my_op, go) = {
            let inner = shared.borrow();
            let my_op = inner.actors.get(id).map(|s| s.operation);
            (my_op, inner.go.clone())
        };
        let Some(my_op) = my_op else { return };
        if shared.borrow().turn == Some(my_op) {
            return;
        }
        go.notified().await;
    }
}

fn report_step_done(shared: &Shared) {
    shared.borrow().step_done.notify_one();
}

/// Generic turn-wait for an arbitrary operation, used by controlled tasks
/// (C7) which — unlike actors — have no inbox to dequeue from; the only
/// thing that changes their status is the scheduler handing them the
/// baton.
async fn wait_for_op_turn(shared: &Shared, op: OperationId) {
    loop {
        let go = shared.borrow().go.clone();
        if shared.borrow().turn == Some(op) {
            return;
        }
        go.notified().await;
    }
}

impl Context {
    /// `Create(type, optional_name, setup_event?) -> identity` (spec §4.2
    /// and a scheduling point per §4.7/§5): the new actor's first operation
    /// is Enabled and spawned before this operation yields its own turn, so
    /// the scheduler is free to run the new actor (or anything else First)
    /// before control returns to the caller.
    pub async fn create<A: Actor + 'static>(&self, props: Props<A>, name: Option<&str>, setup: Option<Event>) -> Result<ActorRef<A>, RuntimeError> {
        let actor = props.produce();
        let shared = self.shared.clone();
        let ctx_helper = ExecutionContext { shared: shared.clone() };
        let basic = ctx_helper.create_internal(name, Box::new(actor), setup)?;
        ctx_helper.spawn_actor_task(basic.id.clone());
        self.yield_point(BlockReason::OnCreate).await;
        Ok(ActorRef::new(basic.id))
    }

    /// The synchronous half of `Send`, shared by the scheduling-point
    /// version below and by [`Context::send_sync`] for callers that cannot
    /// `.await` (state-machine/monitor transition actions).
    fn send_effect(&self, target: &ActorId, event: Event, assert_at_most: Option<usize>) -> Result<(), RuntimeError> {
        let mut inner = self.shared.borrow_mut();
        if let Some(k) = assert_at_most {
            if let Some(slot) = inner.actors.get(target) {
                if slot.inbox.count_of(event.kind()) >= k {
                    let err = RuntimeError::QueueAssertViolated(k);
                    inner.errors_list.push(err.clone());
                    return Err(err);
                }
            }
        }
        let group = inner
            .actors
            .get(&self.myself)
            .and_then(|s| s.cell.current_event_group);
        let mut event = event;
        event.inherit_group(group);
        let result = match inner.actors.get_mut(target) {
            Some(slot) => slot.inbox.enqueue(event),
            None => EnqueueResult::Dropped,
        };
        if let EnqueueResult::Delivered = result {
            if let Some(slot) = inner.actors.get(target) {
                inner.scheduler.set_enabled(slot.operation);
            }
        }
        Ok(())
    }

    /// `Send(target, event, options?)` (spec §4.2, and a scheduling point
    /// per §4.7/§5): delivers `event`, then yields the turn once so another
    /// Enabled operation may run before the caller resumes. `assert_at_most`
    /// mirrors `options.assert == k`: fails with `QueueAssertViolated` when
    /// the target already has ≥k instances of that kind enqueued.
    pub async fn send(&self, target: &ActorId, event: Event, assert_at_most: Option<usize>) -> Result<(), RuntimeError> {
        self.send_effect(target, event, assert_at_most)?;
        self.yield_point(BlockReason::OnSend).await;
        Ok(())
    }

    /// Synchronous `Send`, for callers that cannot `.await`: a
    /// state-machine/monitor transition action (`actor::state_machine`'s
    /// `Action`/`EntryExit`) is a plain `Fn`, not an `async Fn`, because a
    /// transition "runs synchronously, inline... there is no dequeue, no
    /// scheduling point" (spec §4.4). Performs the identical effect as
    /// `send` without yielding the turn.
    pub fn send_sync(&self, target: &ActorId, event: Event, assert_at_most: Option<usize>) -> Result<(), RuntimeError> {
        self.send_effect(target, event, assert_at_most)
    }

    /// `Raise(event)` (spec §4.2): sets the pending raised event of the
    /// current handler, consumed before the next inbox dequeue.
    pub fn raise(&self, event: Event) {
        let mut inner = self.shared.borrow_mut();
        if let Some(slot) = inner.actors.get_mut(&self.myself) {
            slot.pending_raise = Some(event);
        }
    }

    /// `Random(domain)` (spec §4.2, and a scheduling point per §4.7/§5):
    /// controlled nondeterminism routed through the scheduler, recorded in
    /// the trace (C11) for replay, followed by a single yield of the turn.
    pub async fn random(&self, domain: u64) -> u64 {
        let value = {
            let mut inner = self.shared.borrow_mut();
            match inner.scheduler.random_u64(domain) {
                Ok(v) => v,
                Err(e) => {
                    inner.errors_list.push(e);
                    0
                }
            }
        };
        self.yield_point(BlockReason::OnRandom).await;
        value
    }

    pub async fn random_bool(&self) -> bool {
        self.random(2).await == 1
    }

    /// `Receive(kinds, predicate?) -> event` (spec §4.2, a scheduling
    /// point): installs a one-shot filter on this actor's own inbox, then
    /// suspends — yielding the turn, Blocked(OnReceive), every step — until
    /// an event matching `kinds`/`predicate` is available, and returns it
    /// directly without going through the normal `Actor::recv` dispatch.
    /// Fails immediately if the actor is already halted, mirroring
    /// `Context::halt`'s one-way transition (P6).
    pub async fn receive(
        &self,
        kinds: impl IntoIterator<Item = EventKind>,
        predicate: Option<Box<dyn Fn(&Event) -> bool>>,
    ) -> Result<Event, RuntimeError> {
        let kinds: HashSet<EventKind> = kinds.into_iter().collect();
        let op = {
            let mut inner = self.shared.borrow_mut();
            let Some(slot) = inner.actors.get_mut(&self.myself) else {
                return Err(RuntimeError::ReceiveOnHaltedActor);
            };
            if slot.inbox.is_halted() {
                return Err(RuntimeError::ReceiveOnHaltedActor);
            }
            slot.inbox.set_receive_filter(kinds, predicate);
            slot.operation
        };

        loop {
            let dequeued = {
                let mut inner = self.shared.borrow_mut();
                let Some(slot) = inner.actors.get_mut(&self.myself) else {
                    return Err(RuntimeError::ReceiveOnHaltedActor);
                };
                if slot.inbox.is_halted() {
                    return Err(RuntimeError::ReceiveOnHaltedActor);
                }
                match slot.inbox.dequeue() {
                    DequeueResult::Ready(event, group) => {
                        slot.cell.current_event_group = group;
                        Some(event)
                    }
                    DequeueResult::Defer | DequeueResult::Empty => None,
                }
            };
            if let Some(event) = dequeued {
                return Ok(event);
            }
            {
                let mut inner = self.shared.borrow_mut();
                inner.scheduler.set_blocked(op, BlockReason::OnReceive);
            }
            self.yield_point(BlockReason::OnReceive).await;
        }
    }

    /// `Assert(cond, msg)` (spec §4.2): on false, records a safety
    /// violation; the iteration's verdict is decided once the scheduler
    /// drains to quiescence.
    pub fn assert(&self, cond: bool, msg: impl Into<String>) {
        if !cond {
            self.shared
                .borrow_mut()
                .errors_list
                .push(RuntimeError::AssertionViolation(msg.into()));
        }
    }

    pub fn record_error(&self, error: RuntimeError) {
        self.shared.borrow_mut().errors_list.push(error);
    }

    /// Unions `kinds` into the current actor's inbox deferral mask
    /// (state-machine entry, spec §4.3).
    pub fn defer(&self, kinds: impl IntoIterator<Item = EventKind>) {
        let mut inner = self.shared.borrow_mut();
        if let Some(slot) = inner.actors.get_mut(&self.myself) {
            slot.inbox.defer(kinds);
        }
    }

    /// Removes `kinds` from the deferral mask and re-checks the queue head
    /// (state-machine exit, spec §4.3; P4).
    pub fn recall_deferred(&self, kinds: impl IntoIterator<Item = EventKind>) {
        let mut inner = self.shared.borrow_mut();
        if let Some(slot) = inner.actors.get_mut(&self.myself) {
            slot.inbox.recall_deferred(kinds);
        }
    }

    /// `Monitor<T>(event)` (spec §4.4): delivers `event` synchronously to
    /// the monitor registered under `T`'s type name. A call from inside
    /// that same monitor's own handler is rejected (design note) rather
    /// than silently re-entering.
    pub fn monitor<T: 'static>(&self, event: Event) -> Result<(), RuntimeError> {
        let type_tag = std::any::type_name::<T>();
        let mut slot = {
            let mut inner = self.shared.borrow_mut();
            if inner.monitor_in_progress == Some(type_tag) {
                return Err(RuntimeError::ReentrantMonitorCall(type_tag.to_string()));
            }
            match inner.monitors.remove(type_tag) {
                Some(slot) => slot,
                None => return Ok(()),
            }
        };
        self.shared.borrow_mut().monitor_in_progress = Some(type_tag);
        slot.dispatch(self, &event);
        self.shared.borrow_mut().monitor_in_progress = None;

        let mut inner = self.shared.borrow_mut();
        inner.monitors.insert(type_tag, slot);
        inner.update_liveness_temperature();
        if inner.liveness_temperature > inner.configuration.liveness_temperature_threshold {
            let state = inner
                .monitors
                .get(type_tag)
                .map(|s| s.current_state().to_string())
                .unwrap_or_default();
            inner.errors_list.push(RuntimeError::PotentialLivenessBug {
                monitor: type_tag.to_string(),
                state,
            });
        }
        Ok(())
    }

    /// `Halt` (spec §4.2): enqueues the special Halt event kind, processed
    /// like any other inbox item but terminating the actor once the
    /// current handler returns.
    pub fn halt(&self) {
        let mut inner = self.shared.borrow_mut();
        if let Some(slot) = inner.actors.get_mut(&self.myself) {
            slot.inbox.enqueue(Event::halt());
        }
    }

    /// `ControlledTask::Run(λ)` (spec §4.5): registers a new Enabled
    /// operation and spawns `body` as its own local task, cooperating with
    /// the driver through the same baton every actor operation uses.
    pub fn run_task<F, Fut>(&self, body: F) -> crate::task::ControlledTask
    where
        F: FnOnce(Context) -> Fut + 'static,
        Fut: std::future::Future<Output = ()> + 'static,
    {
        let shared = self.shared.clone();
        let op = {
            let mut inner = shared.borrow_mut();
            let op = inner
                .scheduler
                .register_operation(OperationKind::Task, Some(self.myself.clone()));
            inner.scheduler.set_enabled(op);
            op
        };
        let task_ctx = Context::new(self.myself.clone(), shared.clone());
        let shared_for_task = shared.clone();
        tokio::task::spawn_local(async move {
            wait_for_op_turn(&shared_for_task, op).await;
            body(task_ctx).await;
            shared_for_task.borrow_mut().scheduler.complete(op);
            report_step_done(&shared_for_task);
        });
        crate::task::ControlledTask { operation: op }
    }

    /// `ControlledTask::Delay(n)`: blocks `BlockedOnDelay` for `n`
    /// scheduler steps; rewoken by scheduler choice, never by wall time.
    pub fn delay(&self, steps: u64) -> crate::task::ControlledTask {
        self.run_task(move |ctx| async move {
            for _ in 0..steps {
                ctx.yield_point(BlockReason::OnDelay).await;
            }
        })
    }

    /// The primitive both `Delay` and `Yield()` build on: gives up the
    /// running operation's turn for exactly one scheduling step. The
    /// operation stays Enabled throughout — it is not `Blocked` the way a
    /// `Receive` with no matching event is, since nothing external needs
    /// to happen to make it selectable again; the scheduler is free to
    /// pick it right back (`reason` documents intent for tracing only).
    pub async fn yield_point(&self, reason: BlockReason) {
        let shared = self.shared.clone();
        let op = {
            let inner = shared.borrow();
            inner.turn.expect("yield_point called while not holding the turn")
        };
        debug!(?op, ?reason, "operation yields its turn");
        report_step_done(&shared);
        wait_for_op_turn(&shared, op).await;
    }

    /// `ControlledTask::Yield()`.
    pub async fn yield_now(&self) {
        self.yield_point(BlockReason::OnTask).await;
    }

    /// `ControlledTask::WhenAll(xs)`: completes once every constituent
    /// operation has reported `Completed`.
    pub async fn when_all(&self, tasks: &[crate::task::ControlledTask]) {
        loop {
            let all_done = {
                let inner = self.shared.borrow();
                tasks
                    .iter()
                    .all(|t| inner.scheduler.status(t.operation) == OperationStatus::Completed)
            };
            if all_done {
                return;
            }
            self.yield_point(BlockReason::OnTask).await;
        }
    }

    /// `ControlledTask::WhenAny(xs)`: picks one of the already-completed
    /// constituents via scheduler-controlled randomness once at least one
    /// has completed.
    pub async fn when_any(&self, tasks: &[crate::task::ControlledTask]) -> crate::task::ControlledTask {
        loop {
            let done: Vec<crate::task::ControlledTask> = {
                let inner = self.shared.borrow();
                tasks
                    .iter()
                    .copied()
                    .filter(|t| inner.scheduler.status(t.operation) == OperationStatus::Completed)
                    .collect()
            };
            if !done.is_empty() {
                let idx = self.random(done.len() as u64).await as usize;
                return done[idx];
            }
            self.yield_point(BlockReason::OnTask).await;
        }
    }

    /// `ControlledTask::Wait` / `GetAwaiter`.
    pub async fn wait(&self, task: crate::task::ControlledTask) {
        self.when_all(&[task]).await;
    }
}
