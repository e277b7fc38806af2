//! Scenario 5: a Raft-style multi-leader bug. Two candidates broadcast
//! "I won this term" without deduplicating senders; a safety monitor
//! (here, the plain `ctx.assert` primitive — a monitor need not be a
//! registered `Monitor` to be a safety monitor in the spec's sense, it
//! only needs to observe and assert) records which terms already elected
//! a leader and fails the moment a second one shows up.

use vigil::prelude::*;

#[derive(Debug, Clone, Copy)]
struct BecameLeader(u64);
impl EventPayload for BecameLeader {
    fn kind(&self) -> EventKind {
        EventKind("BecameLeader")
    }
}

struct LeaderTracker {
    leaders_by_term: std::collections::HashSet<u64>,
}

#[async_trait::async_trait(?Send)]
impl Actor for LeaderTracker {
    async fn recv(&mut self, ctx: &Context, event: Event, _sender: Sender) {
        if let Ok(BecameLeader(term)) = event.downcast::<BecameLeader>() {
            let first_leader_this_term = self.leaders_by_term.insert(term);
            ctx.assert(first_leader_this_term, "Detected more than one leader.");
        }
    }
}

struct Candidate {
    tracker: ActorId,
    term: u64,
}

#[async_trait::async_trait(?Send)]
impl Actor for Candidate {
    async fn pre_start(&mut self, ctx: &Context) {
        let _ = ctx.send(&self.tracker, Event::new(BecameLeader(self.term)), None).await;
    }
    async fn recv(&mut self, _ctx: &Context, _event: Event, _sender: Sender) {}
}

struct Cluster;

#[async_trait::async_trait(?Send)]
impl Actor for Cluster {
    async fn pre_start(&mut self, ctx: &Context) {
        let tracker = ctx
            .create(
                Props::new(|| LeaderTracker {
                    leaders_by_term: std::collections::HashSet::new(),
                }),
                Some("tracker"),
                None,
            )
            .await
            .expect("tracker creation must succeed");
        let tracker_id = tracker.id.clone();

        ctx.create(
            Props::new(move || Candidate {
                tracker: tracker_id.clone(),
                term: 1,
            }),
            Some("candidate-a"),
            None,
        )
        .await
        .expect("candidate-a creation must succeed");

        let tracker_id = tracker.id.clone();
        ctx.create(
            Props::new(move || Candidate {
                tracker: tracker_id.clone(),
                term: 1,
            }),
            Some("candidate-b"),
            None,
        )
        .await
        .expect("candidate-b creation must succeed");
    }
    async fn recv(&mut self, _ctx: &Context, _event: Event, _sender: Sender) {}
}

#[test]
fn two_candidates_electing_the_same_term_trips_the_safety_monitor() {
    let execution = ExecutionContext::new(Configuration::default());
    let errors = execution.run_to_completion(None, || Cluster, None);

    assert!(
        errors
            .iter()
            .any(|e| matches!(e, RuntimeError::AssertionViolation(msg) if msg == "Detected more than one leader.")),
        "expected AssertionViolation(\"Detected more than one leader.\"), got {errors:?}"
    );
}
