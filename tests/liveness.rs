//! Scenario 4: a Chord-style client queries a key no node owns. The
//! liveness monitor goes hot the moment the query is issued and can only
//! go cold on a matching response — which, for an unowned key, never
//! arrives. C10's temperature counter eventually reports the stuck
//! monitor as a `PotentialLivenessBug`.

use vigil::prelude::*;

struct LivenessMonitorTag;

#[derive(Debug)]
struct Requested;
impl EventPayload for Requested {
    fn kind(&self) -> EventKind {
        EventKind("Requested")
    }
}

#[derive(Debug)]
struct Responded;
impl EventPayload for Responded {
    fn kind(&self) -> EventKind {
        EventKind("Responded")
    }
}

fn build_monitor() -> Monitor {
    let cold = State::new("Cold")
        .tag(MonitorTag::Start)
        .tag(MonitorTag::Cold)
        .on(EventKind("Requested"), Transition::Goto("Requested"));
    let requested = State::new("Requested")
        .tag(MonitorTag::Hot)
        .on(EventKind("Responded"), Transition::Goto("Cold"));
    Monitor::new(std::any::type_name::<LivenessMonitorTag>(), vec![cold, requested])
}

struct Client {
    queries: u64,
}

#[async_trait::async_trait(?Send)]
impl Actor for Client {
    async fn pre_start(&mut self, ctx: &Context) {
        // Every query for the unowned key re-raises the hunt; a healthy
        // node would eventually send back a Responded that cools the
        // monitor down. None ever does.
        for _ in 0..self.queries {
            let _ = ctx.monitor::<LivenessMonitorTag>(Event::new(Requested));
        }
    }
    async fn recv(&mut self, _ctx: &Context, _event: Event, _sender: Sender) {}
}

#[test]
fn querying_an_unowned_key_never_cools_the_liveness_monitor() {
    let cfg = Configuration {
        liveness_temperature_threshold: 5,
        ..Configuration::default()
    };
    let execution = ExecutionContext::new(cfg);
    execution.register_monitor(build_monitor());

    let errors = execution.run_to_completion(None, || Client { queries: 8 }, None);

    assert!(
        errors.iter().any(|e| matches!(
            e,
            RuntimeError::PotentialLivenessBug { monitor, state }
                if monitor.contains("LivenessMonitorTag") && state == "Requested"
        )),
        "expected PotentialLivenessBug(LivenessMonitorTag, Requested), got {errors:?}"
    );
}

/// (P5) Monitor liveness soundness: when a response does arrive and the
/// monitor goes back to Cold, no `PotentialLivenessBug` is ever recorded —
/// not even after many request/response round-trips.
struct HealthyClient {
    round_trips: u64,
}

#[async_trait::async_trait(?Send)]
impl Actor for HealthyClient {
    async fn pre_start(&mut self, ctx: &Context) {
        for _ in 0..self.round_trips {
            let _ = ctx.monitor::<LivenessMonitorTag>(Event::new(Requested));
            let _ = ctx.monitor::<LivenessMonitorTag>(Event::new(Responded));
        }
    }
    async fn recv(&mut self, _ctx: &Context, _event: Event, _sender: Sender) {}
}

#[test]
fn a_monitor_that_always_cools_down_never_reports_a_liveness_bug() {
    let cfg = Configuration {
        liveness_temperature_threshold: 5,
        ..Configuration::default()
    };
    let execution = ExecutionContext::new(cfg);
    execution.register_monitor(build_monitor());

    let errors = execution.run_to_completion(None, || HealthyClient { round_trips: 50 }, None);

    assert!(
        !errors.iter().any(|e| matches!(e, RuntimeError::PotentialLivenessBug { .. })),
        "a monitor that always returns to Cold must never trip the liveness check, got {errors:?}"
    );
}
