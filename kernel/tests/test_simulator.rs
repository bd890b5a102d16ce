//! End-to-end driver tests.
//!
//! Run the full macro-step loop over small model trees and check the
//! cycle semantics: tied events execute together, disclosures reach their
//! listeners before the next collection, listener failures never abort a
//! run, and the kernel log reflects what happened.

use multiscale_simulator_core_rs::{
    Action, Actor, ApplyError, Branch, Disclosure, Event, Leaf, Listener, Metrics, ModelNode,
    Request, SimulationError, Simulator, SimulatorConfig, Y0,
};
use std::collections::BTreeMap;

/// Actor firing at a fixed list of times. Each firing increments `stock`
/// and optionally announces a disclosure; `Foreign("boost")` instructions
/// also increment the stock.
struct Ticker {
    name: String,
    times: Vec<f64>,
    cached: Option<Event>,
    announce: Option<String>,
    sibling_scoped: bool,
    stock: String,
    level: f64,
}

impl Ticker {
    fn new(name: &str, times: &[f64], stock: &str) -> Self {
        Self {
            name: name.to_string(),
            times: times.to_vec(),
            cached: None,
            announce: None,
            sibling_scoped: false,
            stock: stock.to_string(),
            level: 0.0,
        }
    }

    fn announcing(mut self, what: &str) -> Self {
        self.announce = Some(what.to_string());
        self
    }

    fn sibling_scoped(mut self) -> Self {
        self.sibling_scoped = true;
        self
    }

    fn boxed(self) -> Box<dyn Actor> {
        Box::new(self)
    }
}

impl Actor for Ticker {
    fn name(&self) -> &str {
        &self.name
    }

    fn next(&mut self) -> Event {
        match &self.cached {
            Some(e) => e.clone(),
            None => self.find_next(),
        }
    }

    fn find_next(&mut self) -> Event {
        let event = match self.times.first() {
            Some(&t) => Event::new("tick", t),
            None => Event::never(),
        };
        self.cached = Some(event.clone());
        event
    }

    fn drop_next(&mut self) {
        self.cached = None;
    }

    fn update_time(&mut self, t: f64) {
        self.times.retain(|&due| due > t);
        self.drop_next();
    }

    fn execute(&mut self, request: &Request) -> Vec<Disclosure> {
        self.level += 1.0;
        match &self.announce {
            Some(what) => {
                let mut d = Disclosure::new(
                    what.clone(),
                    self.name.clone(),
                    request.address().target(),
                );
                if self.sibling_scoped {
                    d.sibling_scale();
                }
                vec![d]
            }
            None => Vec::new(),
        }
    }

    fn apply(&mut self, action: &Action, _t: f64) -> Result<(), ApplyError> {
        match action {
            Action::Foreign { what, .. } if what == "boost" => {
                self.level += 1.0;
                Ok(())
            }
            Action::Foreign { what, .. } => Err(ApplyError::Rejected {
                what: what.clone(),
                reason: "unsupported foreign message".to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn read_y0(&mut self, y0: &Y0, _t0: f64) -> Result<(), multiscale_simulator_core_rs::ConfigError> {
        if let Some(level) = y0.get(&self.stock).and_then(|v| v.as_f64()) {
            self.level = level;
        }
        Ok(())
    }

    fn read_statics(&self, out: &mut BTreeMap<String, f64>) {
        *out.entry(self.stock.clone()).or_insert(0.0) += self.level;
    }
}

fn boost() -> Action {
    Action::Foreign {
        what: "boost".to_string(),
        args: BTreeMap::new(),
    }
}

/// root ── east (emitter, fires at `east_times`)
///      └─ west (counter, dormant)
fn emitter_counter_tree(east_times: &[f64]) -> ModelNode {
    let mut east = Leaf::new("east");
    east.add_actor(
        Ticker::new("emitter", east_times, "east_level")
            .announcing("birth")
            .boxed(),
    )
    .unwrap();

    let mut west = Leaf::new("west");
    west.add_actor(Ticker::new("counter", &[], "west_level").boxed())
        .unwrap();

    let mut root = Branch::new("root");
    root.add_child(east.into()).unwrap();
    root.add_child(west.into()).unwrap();
    root.into()
}

// =============================================================================
// Stepping semantics
// =============================================================================

#[test]
fn test_tied_events_across_leaves_run_in_one_cycle() {
    let mut east = Leaf::new("east");
    east.add_actor(Ticker::new("a", &[1.0], "a_level").boxed())
        .unwrap();
    let mut west = Leaf::new("west");
    west.add_actor(Ticker::new("b", &[1.0], "b_level").boxed())
        .unwrap();
    let mut root = Branch::new("root");
    root.add_child(east.into()).unwrap();
    root.add_child(west.into()).unwrap();

    let mut sim = Simulator::new(root.into());
    let mut metrics = Metrics::new();
    sim.simulate(&serde_json::Value::Null, 0.0, 2.0, 2.0, &mut metrics)
        .unwrap();

    assert_eq!(metrics.cycles, 1);
    assert_eq!(metrics.events_executed, 2);
    assert_eq!(sim.now(), 2.0);
    assert_eq!(sim.steps_taken(), 1);

    let table = sim.observer().table();
    assert_eq!(table.value_at(1, "a_level"), Some(1.0));
    assert_eq!(table.value_at(1, "b_level"), Some(1.0));
}

#[test]
fn test_events_beyond_the_horizon_stay_queued() {
    let mut sim = Simulator::new(emitter_counter_tree(&[5.0]));
    let mut metrics = Metrics::new();
    sim.simulate(&serde_json::Value::Null, 0.0, 2.0, 1.0, &mut metrics)
        .unwrap();

    assert_eq!(metrics.events_executed, 0);
    assert_eq!(sim.now(), 2.0);
    // The snapshot count is steps + 1, all with the level untouched.
    let table = sim.observer().table();
    assert_eq!(table.len(), 3);
    assert_eq!(table.value_at(2, "east_level"), Some(0.0));
}

#[test]
fn test_partial_final_step_lands_exactly_on_the_horizon() {
    let mut sim = Simulator::new(emitter_counter_tree(&[1.0]));
    let mut metrics = Metrics::new();
    sim.simulate(&serde_json::Value::Null, 0.0, 2.5, 1.0, &mut metrics)
        .unwrap();

    assert_eq!(sim.now(), 2.5);
    assert_eq!(sim.observer().table().times(), &[0.0, 1.0, 2.0, 2.5]);
}

#[test]
fn test_from_equals_to_takes_only_the_initial_snapshot() {
    let mut sim = Simulator::new(emitter_counter_tree(&[1.0]));
    let mut metrics = Metrics::new();
    sim.simulate(&serde_json::Value::Null, 1.0, 1.0, 0.5, &mut metrics)
        .unwrap();

    assert_eq!(sim.steps_taken(), 0);
    assert_eq!(metrics.cycles, 0);
    assert_eq!(sim.observer().table().times(), &[1.0]);
}

#[test]
fn test_y0_reaches_every_actor() {
    let mut sim = Simulator::new(emitter_counter_tree(&[]));
    let mut metrics = Metrics::new();
    let y0 = serde_json::json!({ "east_level": 10.0, "west_level": 4.0 });
    sim.simulate(&y0, 0.0, 1.0, 1.0, &mut metrics).unwrap();

    let table = sim.observer().table();
    assert_eq!(table.value_at(0, "east_level"), Some(10.0));
    assert_eq!(table.value_at(0, "west_level"), Some(4.0));
}

// =============================================================================
// Disclosure plumbing
// =============================================================================

#[test]
fn test_disclosure_reaches_foreign_listener_in_the_same_cycle() {
    let mut root = emitter_counter_tree(&[3.0]);
    root.add_listener_at(
        &["root", "west"],
        Listener::on("birth", |_, _| vec![("counter".to_string(), boost())]),
    )
    .unwrap();

    let mut sim = Simulator::new(root);
    let mut metrics = Metrics::new();
    sim.simulate(&serde_json::Value::Null, 0.0, 4.0, 4.0, &mut metrics)
        .unwrap();

    assert_eq!(metrics.events_executed, 1);
    assert_eq!(metrics.disclosures_routed, 1);
    assert_eq!(metrics.listeners_fired, 1);
    assert_eq!(metrics.listener_failures, 0);

    // The boost landed on west's counter.
    let table = sim.observer().table();
    assert_eq!(table.value_at(1, "west_level"), Some(1.0));
}

#[test]
fn test_listener_failure_counted_but_run_completes() {
    let mut root = emitter_counter_tree(&[1.0]);
    root.add_listener_at(
        &["root", "west"],
        Listener::on("birth", |_, _| {
            vec![("nobody".to_string(), Action::Touch)]
        }),
    )
    .unwrap();

    let mut sim = Simulator::new(root);
    let mut metrics = Metrics::new();
    sim.simulate(&serde_json::Value::Null, 0.0, 2.0, 2.0, &mut metrics)
        .unwrap();

    assert_eq!(metrics.listeners_fired, 1);
    assert_eq!(metrics.listener_failures, 1);
}

#[test]
fn test_remove_action_deletes_the_foreign_actor() {
    let mut root = emitter_counter_tree(&[1.0]);
    // A leaf must keep at least one actor to stay collectable; the
    // bystander outlives the removed counter.
    if let Some(ModelNode::Leaf(west)) = root.node_at_mut(&["root", "west"]) {
        west.add_actor(Ticker::new("bystander", &[], "bystander_level").boxed())
            .unwrap();
    } else {
        panic!("west leaf missing");
    }
    root.add_listener_at(
        &["root", "west"],
        Listener::on("birth", |_, _| {
            vec![("counter".to_string(), Action::Remove)]
        }),
    )
    .unwrap();

    let mut sim = Simulator::new(root);
    let mut metrics = Metrics::new();
    sim.simulate(&serde_json::Value::Null, 0.0, 2.0, 2.0, &mut metrics)
        .unwrap();

    assert_eq!(metrics.listener_failures, 0);
    // The counter's stock disappears from the boundary snapshot.
    let table = sim.observer().table();
    assert_eq!(table.value_at(1, "west_level"), None);
}

/// root ── east (emitter announcing "birth" at 1.0)
///      └─ west (counter, dormant; waiter firing at 2.0)
///
/// When the birth fires, west still holds its cached batch with waiter's
/// event at 2.0; the listener's action lands on that leaf mid-cache.
fn cached_batch_tree() -> ModelNode {
    let mut east = Leaf::new("east");
    east.add_actor(
        Ticker::new("emitter", &[1.0], "east_level")
            .announcing("birth")
            .boxed(),
    )
    .unwrap();

    let mut west = Leaf::new("west");
    west.add_actor(Ticker::new("counter", &[], "west_level").boxed())
        .unwrap();
    west.add_actor(Ticker::new("waiter", &[2.0], "waiter_level").boxed())
        .unwrap();

    let mut root = Branch::new("root");
    root.add_child(east.into()).unwrap();
    root.add_child(west.into()).unwrap();
    root.into()
}

#[test]
fn test_touch_on_leaf_with_cached_batch_keeps_its_due_events() {
    let mut root = cached_batch_tree();
    root.add_listener_at(
        &["root", "west"],
        Listener::on("birth", |_, _| {
            vec![("counter".to_string(), Action::Touch)]
        }),
    )
    .unwrap();

    let mut sim = Simulator::new(root);
    let mut metrics = Metrics::new();
    sim.simulate(&serde_json::Value::Null, 0.0, 3.0, 3.0, &mut metrics)
        .unwrap();

    // waiter's event at 2.0 survives the touch and still fires.
    assert_eq!(metrics.events_executed, 2);
    assert_eq!(
        sim.observer().table().value_at(1, "waiter_level"),
        Some(1.0)
    );
}

#[test]
fn test_remove_on_leaf_with_cached_batch_keeps_its_due_events() {
    let mut root = cached_batch_tree();
    root.add_listener_at(
        &["root", "west"],
        Listener::on("birth", |_, _| {
            vec![("counter".to_string(), Action::Remove)]
        }),
    )
    .unwrap();

    let mut sim = Simulator::new(root);
    let mut metrics = Metrics::new();
    sim.simulate(&serde_json::Value::Null, 0.0, 3.0, 3.0, &mut metrics)
        .unwrap();

    assert_eq!(metrics.listener_failures, 0);
    assert_eq!(metrics.events_executed, 2);
    assert_eq!(
        sim.observer().table().value_at(1, "waiter_level"),
        Some(1.0)
    );
}

#[test]
fn test_sibling_scoped_disclosure_skips_distant_subtrees() {
    // root ── region1 (east emits sibling-scoped, west counts)
    //      └─ region2 (far counts)
    let mut east = Leaf::new("east");
    east.add_actor(
        Ticker::new("emitter", &[1.0], "east_level")
            .announcing("birth")
            .sibling_scoped()
            .boxed(),
    )
    .unwrap();
    let mut west = Leaf::new("west");
    west.add_actor(Ticker::new("near", &[], "west_level").boxed())
        .unwrap();
    let mut region1 = Branch::new("region1");
    region1.add_child(east.into()).unwrap();
    region1.add_child(west.into()).unwrap();

    let mut far = Leaf::new("far");
    far.add_actor(Ticker::new("distant", &[], "far_level").boxed())
        .unwrap();
    let mut region2 = Branch::new("region2");
    region2.add_child(far.into()).unwrap();

    let mut root = Branch::new("root");
    root.add_child(region1.into()).unwrap();
    root.add_child(region2.into()).unwrap();
    let mut root: ModelNode = root.into();

    root.add_listener_at(
        &["root", "region1", "west"],
        Listener::on("birth", |_, _| vec![("near".to_string(), boost())]),
    )
    .unwrap();
    root.add_listener_at(
        &["root", "region2", "far"],
        Listener::on("birth", |_, _| vec![("distant".to_string(), boost())]),
    )
    .unwrap();

    let mut sim = Simulator::new(root);
    let mut metrics = Metrics::new();
    sim.simulate(&serde_json::Value::Null, 0.0, 2.0, 2.0, &mut metrics)
        .unwrap();

    assert_eq!(metrics.listeners_fired, 1);
    let table = sim.observer().table();
    assert_eq!(table.value_at(1, "west_level"), Some(1.0));
    assert_eq!(table.value_at(1, "far_level"), Some(0.0));
}

// =============================================================================
// Metrics scoping
// =============================================================================

#[test]
fn test_metrics_cover_only_their_own_run() {
    // The touched "slow" actor leaves one superseded queue entry behind,
    // discarded during the first run. A second run on the same simulator
    // must not re-report that discard.
    let mut east = Leaf::new("east");
    east.add_actor(
        Ticker::new("emitter", &[1.0], "east_level")
            .announcing("birth")
            .boxed(),
    )
    .unwrap();
    let mut west = Leaf::new("west");
    west.add_actor(Ticker::new("waiter", &[2.0], "waiter_level").boxed())
        .unwrap();
    west.add_actor(Ticker::new("slow", &[9.0], "slow_level").boxed())
        .unwrap();
    let mut root = Branch::new("root");
    root.add_child(east.into()).unwrap();
    root.add_child(west.into()).unwrap();
    let mut root: ModelNode = root.into();
    root.add_listener_at(
        &["root", "west"],
        Listener::on("birth", |_, _| vec![("slow".to_string(), Action::Touch)]),
    )
    .unwrap();

    let mut sim = Simulator::new(root);

    let mut first = Metrics::new();
    sim.simulate(&serde_json::Value::Null, 0.0, 3.0, 3.0, &mut first)
        .unwrap();
    assert_eq!(first.stale_discarded, 1);

    // Second run: emitter and waiter are spent, so nothing fires and no
    // entry goes stale.
    let mut second = Metrics::new();
    sim.simulate(&serde_json::Value::Null, 0.0, 3.0, 3.0, &mut second)
        .unwrap();
    assert_eq!(second.events_executed, 0);
    assert_eq!(second.stale_discarded, 0);
}

// =============================================================================
// Configuration validation
// =============================================================================

#[test]
fn test_rejects_nonpositive_dt() {
    let mut sim = Simulator::new(emitter_counter_tree(&[1.0]));
    let mut metrics = Metrics::new();
    for dt in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            sim.simulate(&serde_json::Value::Null, 0.0, 1.0, dt, &mut metrics),
            Err(SimulationError::InvalidConfig(_))
        ));
    }
}

#[test]
fn test_rejects_reversed_horizon() {
    let mut sim = Simulator::new(emitter_counter_tree(&[1.0]));
    let mut metrics = Metrics::new();
    assert!(matches!(
        sim.simulate(&serde_json::Value::Null, 2.0, 1.0, 0.5, &mut metrics),
        Err(SimulationError::InvalidConfig(_))
    ));
}

#[test]
fn test_rejects_infinite_horizon() {
    let mut sim = Simulator::new(emitter_counter_tree(&[1.0]));
    let mut metrics = Metrics::new();
    assert!(matches!(
        sim.simulate(&serde_json::Value::Null, 0.0, f64::INFINITY, 0.5, &mut metrics),
        Err(SimulationError::InvalidConfig(_))
    ));
}

// =============================================================================
// Kernel log
// =============================================================================

#[test]
fn test_log_disabled_by_default() {
    let mut sim = Simulator::new(emitter_counter_tree(&[1.0]));
    let mut metrics = Metrics::new();
    sim.simulate(&serde_json::Value::Null, 0.0, 2.0, 2.0, &mut metrics)
        .unwrap();
    assert!(sim.log().is_empty());
}

#[test]
fn test_log_records_the_cycle_in_order() {
    let mut root = emitter_counter_tree(&[1.0]);
    root.add_listener_at(
        &["root", "west"],
        Listener::on("birth", |_, _| vec![("counter".to_string(), boost())]),
    )
    .unwrap();

    let config = SimulatorConfig {
        log_events: true,
        observe_mid: true,
    };
    let mut sim = Simulator::with_config(root, config);
    let mut metrics = Metrics::new();
    sim.simulate(&serde_json::Value::Null, 0.0, 2.0, 2.0, &mut metrics)
        .unwrap();

    let log = sim.log();
    assert_eq!(log.events_of_type("Collected").len(), 1);
    assert_eq!(log.events_of_type("Executed").len(), 1);
    assert_eq!(log.events_of_type("Disclosed").len(), 1);
    assert_eq!(log.events_of_type("ListenerFired").len(), 1);
    assert_eq!(log.events_of_type("Observed").len(), 2);

    assert_eq!(log.events_for_actor("emitter").len(), 2);

    // Times never move backwards.
    let times: Vec<f64> = log.events().iter().map(|e| e.time()).collect();
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
}
