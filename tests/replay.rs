//! Scenario 6: replaying the trace recorded while catching scenario 5's
//! bug reproduces the same assertion; a corrupted trace diverges instead.

use std::path::PathBuf;

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

fn position_of_assertion(errors: &[RuntimeError]) -> Option<usize> {
    errors.iter().position(|e| matches!(e, RuntimeError::AssertionViolation(_)))
}

#[test]
fn replaying_the_recorded_trace_reproduces_the_assertion_at_the_same_step() {
    let original = ExecutionContext::new(Configuration::default());
    let original_errors = original.run_to_completion(None, || Cluster, None);
    let original_index = position_of_assertion(&original_errors).expect("scenario 5 must reproduce its bug");

    let mut trace_path = std::env::temp_dir();
    trace_path.push(format!("vigil-replay-test-{}.json", std::process::id()));
    original.trace().save(&trace_path).expect("trace must save");

    let replay_cfg = Configuration {
        strategy: SchedulerStrategy::Replay { path: trace_path.clone() },
        ..Configuration::default()
    };
    let replayed = ExecutionContext::new(replay_cfg);
    let replayed_errors = replayed.run_to_completion(None, || Cluster, None);
    let replayed_index = position_of_assertion(&replayed_errors).expect("replay must reproduce the same bug");

    assert_eq!(
        original_index, replayed_index,
        "replay should reproduce the assertion at the same step index"
    );

    // Corrupt the trace by dropping its first record; the replay strategy
    // must refuse to silently improvise and report a divergence instead.
    let recorded = std::fs::read_to_string(&trace_path).expect("trace file must be readable");
    let mut json: serde_json::Value = serde_json::from_str(&recorded).expect("trace must be valid JSON");
    let records = json["records"].as_array_mut().expect("trace must have a records array");
    assert!(!records.is_empty());
    records.remove(0);
    let mut corrupted_path = trace_path.clone();
    corrupted_path.set_file_name(format!("vigil-replay-test-corrupted-{}.json", std::process::id()));
    std::fs::write(&corrupted_path, serde_json::to_string_pretty(&json).unwrap()).unwrap();

    let corrupted_cfg = Configuration {
        strategy: SchedulerStrategy::Replay { path: corrupted_path.clone() },
        ..Configuration::default()
    };
    let diverged_execution = ExecutionContext::new(corrupted_cfg);
    let diverged_errors = diverged_execution.run_to_completion(None, || Cluster, None);

    assert!(
        diverged_errors.iter().any(|e| matches!(e, RuntimeError::ReplayDiverged { .. })),
        "expected ReplayDiverged after corrupting the trace, got {diverged_errors:?}"
    );

    let _ = std::fs::remove_file(&trace_path);
    let _ = std::fs::remove_file(&corrupted_path);
    let _: PathBuf = trace_path;
}

struct Roller {
    values: std::rc::Rc<std::cell::RefCell<Vec<u64>>>,
}

#[async_trait::async_trait(?Send)]
impl Actor for Roller {
    async fn pre_start(&mut self, ctx: &Context) {
        for _ in 0..5 {
            let v = ctx.random(1000).await;
            self.values.borrow_mut().push(v);
        }
        let b = ctx.random_bool().await;
        self.values.borrow_mut().push(b as u64);
    }
    async fn recv(&mut self, _ctx: &Context, _event: Event, _sender: Sender) {}
}

/// Regression for the bug where replay only reproduced scheduling choices,
/// never `Random`/`RandomBool` draws: the shared rng stream would desync
/// from the recorded run the moment any actor called either.
#[test]
fn replaying_the_recorded_trace_reproduces_random_draws() {
    let values = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let values_for_actor = values.clone();
    let original = ExecutionContext::new(Configuration::default());
    let errors = original.run_to_completion(None, move || Roller { values: values_for_actor.clone() }, None);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    let original_values = values.borrow().clone();

    let mut trace_path = std::env::temp_dir();
    trace_path.push(format!("vigil-replay-random-test-{}.json", std::process::id()));
    original.trace().save(&trace_path).expect("trace must save");

    let replay_values = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let replay_values_for_actor = replay_values.clone();
    let replay_cfg = Configuration {
        strategy: SchedulerStrategy::Replay { path: trace_path.clone() },
        ..Configuration::default()
    };
    let replayed = ExecutionContext::new(replay_cfg);
    let replayed_errors = replayed.run_to_completion(None, move || Roller { values: replay_values_for_actor.clone() }, None);
    assert!(replayed_errors.is_empty(), "replay should not diverge, got {replayed_errors:?}");

    assert_eq!(
        *replay_values.borrow(),
        original_values,
        "replay must reproduce the exact Random/RandomBool draws"
    );

    let _ = std::fs::remove_file(&trace_path);
}
