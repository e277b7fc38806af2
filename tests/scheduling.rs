//! Scenario 3: two senders racing against a receiver that asserts a bad
//! invariant about interleaving. `Sender1` still routes its two sends
//! through a controlled task with an explicit mid-send yield, exercising
//! C7 alongside `Sender2`'s plain `ctx.send` (itself a scheduling point,
//! spec §4.7/§5); either path gives the DFS strategy (C9) a choice point
//! to find the bad interleaving at.

use vigil::prelude::*;

#[derive(Debug)]
struct E1;
impl EventPayload for E1 {
    fn kind(&self) -> EventKind {
        EventKind("E1")
    }
}

#[derive(Debug)]
struct E2;
impl EventPayload for E2 {
    fn kind(&self) -> EventKind {
        EventKind("E2")
    }
}

struct Receiver {
    count1: u32,
}

#[async_trait::async_trait(?Send)]
impl Actor for Receiver {
    async fn recv(&mut self, ctx: &Context, event: Event, _sender: Sender) {
        match event.downcast::<E1>() {
            Ok(_) => self.count1 += 1,
            Err(event) => {
                if event.downcast::<E2>().is_ok() {
                    // Bug: should hold for any interleaving, but an
                    // interleaving exists where E2 lands strictly between
                    // the two E1 sends.
                    ctx.assert(self.count1 != 1, "E2 observed exactly one E1");
                }
            }
        }
    }
}

struct Sender1 {
    receiver: ActorId,
}

#[async_trait::async_trait(?Send)]
impl Actor for Sender1 {
    async fn pre_start(&mut self, ctx: &Context) {
        let receiver = self.receiver.clone();
        ctx.run_task(move |task_ctx| async move {
            let _ = task_ctx.send(&receiver, Event::new(E1), None).await;
            task_ctx.yield_now().await;
            let _ = task_ctx.send(&receiver, Event::new(E1), None).await;
        });
    }
    async fn recv(&mut self, _ctx: &Context, _event: Event, _sender: Sender) {}
}

struct Sender2 {
    receiver: ActorId,
}

#[async_trait::async_trait(?Send)]
impl Actor for Sender2 {
    async fn pre_start(&mut self, ctx: &Context) {
        let _ = ctx.send(&self.receiver, Event::new(E2), None).await;
    }
    async fn recv(&mut self, _ctx: &Context, _event: Event, _sender: Sender) {}
}

struct Harness;

#[async_trait::async_trait(?Send)]
impl Actor for Harness {
    async fn pre_start(&mut self, ctx: &Context) {
        let receiver = ctx
            .create(Props::new(|| Receiver { count1: 0 }), Some("receiver"), None)
            .await
            .expect("receiver creation must succeed");
        let receiver_id = receiver.id.clone();
        ctx.create(Props::new(move || Sender1 { receiver: receiver_id.clone() }), Some("sender1"), None)
            .await
            .expect("sender1 creation must succeed");
        let receiver_id = receiver.id.clone();
        ctx.create(Props::new(move || Sender2 { receiver: receiver_id.clone() }), Some("sender2"), None)
            .await
            .expect("sender2 creation must succeed");
    }
    async fn recv(&mut self, _ctx: &Context, _event: Event, _sender: Sender) {}
}

fn has_assertion(errors: &[RuntimeError]) -> bool {
    errors.iter().any(|e| matches!(e, RuntimeError::AssertionViolation(_)))
}

#[test]
fn dfs_finds_the_bad_interleaving_within_600_iterations() {
    let cfg = Configuration {
        strategy: SchedulerStrategy::Dfs,
        ..Configuration::default()
    };
    let execution = ExecutionContext::new(cfg);

    let mut errors = execution.run_to_completion(None, || Harness, None);
    let mut found = has_assertion(&errors);
    let mut iterations = 1;

    while !found && !execution.is_exhausted() && iterations < 600 {
        errors = execution.run_iteration(None, || Harness, None);
        iterations += 1;
        found = has_assertion(&errors);
    }

    assert!(
        found,
        "DFS did not find the bad interleaving within {iterations} iterations; last errors: {errors:?}"
    );
}
