//! Simulator - the macro-stepping driver.
//!
//! Drives a root model through repeated COLLECT → EXECUTE → DISCLOSE cycles
//! inside fixed macro time-steps:
//!
//! ```text
//! For each macro step [t, t + dt]:
//! 1. While the tree's GloTime <= t + dt/2: run one full cycle
//!    (collect, validate, execute, finish)
//! 2. Take the mid-term observation at t + dt/2
//! 3. While the tree's GloTime <= t + dt: run one full cycle
//! 4. Force every leaf clock to t + dt (queued events beyond stay queued)
//! 5. Take the boundary snapshot (resets flow accumulators)
//! ```
//!
//! Within one cycle, every request tied for the global minimum time is
//! executed before any clock advances; disclosures produced by those
//! executions are distributed across the tree before the next collection,
//! so no event is ever scheduled against a stale state.
//!
//! # Example
//!
//! ```rust,ignore
//! use multiscale_simulator_core_rs::{Metrics, ModelNode, Simulator};
//! use serde_json::json;
//!
//! let root: ModelNode = build_population_tree();
//! let mut sim = Simulator::new(root);
//! let mut metrics = Metrics::new();
//!
//! sim.simulate(&json!({ "population": 1000 }), 0.0, 10.0, 0.5, &mut metrics)?;
//!
//! println!("{} events in {} cycles", metrics.events_executed, metrics.cycles);
//! let table = sim.observer().table();
//! ```

use crate::core::clock::StepClock;
use crate::events::log::{KernelEvent, KernelLog};
use crate::models::actor::{ConfigError, Y0};
use crate::models::node::ModelNode;
use crate::models::ModelError;
use crate::observer::Observer;
use crate::orchestrator::metrics::Metrics;
use thiserror::Error;

/// Simulation-level failures.
///
/// Routing and queue-consistency errors are invariant violations: the
/// simulator propagates them immediately rather than attempting recovery,
/// since continuing with a broken invariant silently corrupts all
/// subsequent event ordering. Listener failures are NOT here — they are
/// logged and counted, never fatal.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Driver configuration.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Record kernel events for replay/debugging.
    pub log_events: bool,
    /// Take the mid-term observation of each macro step.
    pub observe_mid: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            log_events: false,
            observe_mid: true,
        }
    }
}

/// Summary of one macro step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Zero-based step index.
    pub step: usize,
    /// Step start time.
    pub from: f64,
    /// Step boundary time.
    pub to: f64,
    /// Cycles run during the step.
    pub cycles: u64,
    /// Requests executed during the step.
    pub events_executed: u64,
    /// Disclosures distributed during the step.
    pub disclosures_routed: u64,
}

/// The stepping driver. Owns the model tree for the duration of a run.
#[derive(Debug)]
pub struct Simulator {
    root: ModelNode,
    config: SimulatorConfig,
    observer: Observer,
    log: KernelLog,
    /// Driver clock: boundary of the last completed step.
    now: f64,
    steps_taken: usize,
}

impl Simulator {
    /// Create a simulator over `root` with default configuration.
    pub fn new(root: ModelNode) -> Self {
        Self::with_config(root, SimulatorConfig::default())
    }

    /// Create a simulator with an explicit configuration.
    pub fn with_config(root: ModelNode, config: SimulatorConfig) -> Self {
        Self {
            root,
            config,
            observer: Observer::new(),
            log: KernelLog::new(),
            now: 0.0,
            steps_taken: 0,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current driver time.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Completed macro steps.
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// The model tree.
    pub fn root(&self) -> &ModelNode {
        &self.root
    }

    /// Mutable access to the model tree, for setup (listener registration,
    /// actor injection) between runs.
    pub fn root_mut(&mut self) -> &mut ModelNode {
        &mut self.root
    }

    /// The accumulated observations.
    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    /// The kernel log (empty unless `log_events` is set).
    pub fn log(&self) -> &KernelLog {
        &self.log
    }

    // ========================================================================
    // Run driver
    // ========================================================================

    /// Run the simulation from `from` to `to` in macro steps of `dt`.
    ///
    /// Initializes the tree with `y0`, takes the initial snapshot, then
    /// steps until `to` is reached. Calling with `from == to` takes the
    /// initial snapshot and returns — the driver is a no-op at its goal.
    pub fn simulate(
        &mut self,
        y0: &Y0,
        from: f64,
        to: f64,
        dt: f64,
        metrics: &mut Metrics,
    ) -> Result<(), SimulationError> {
        if !from.is_finite() || !to.is_finite() {
            return Err(SimulationError::InvalidConfig(
                "simulation horizon must be finite".to_string(),
            ));
        }
        if from > to {
            return Err(SimulationError::InvalidConfig(format!(
                "from ({from}) must not exceed to ({to})"
            )));
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimulationError::InvalidConfig(
                "dt must be finite and positive".to_string(),
            ));
        }

        // STEP 0: INITIALIZATION
        self.now = from;
        self.steps_taken = 0;
        // Scheduler counters accumulate for the tree's lifetime; snapshot
        // them so this run reports only its own share.
        let stats_at_start = self.root.scheduler_stats();
        self.root.read_y0(y0, from)?;
        self.observer.read_statics(&self.root, from);
        if self.config.log_events {
            self.log.log(KernelEvent::Observed {
                time: from,
                row: self.observer.table().len() - 1,
            });
        }

        // STEP LOOP
        let mut clock = StepClock::new(from, dt);
        while !clock.is_done(to) {
            let boundary = clock.next_boundary(to);
            self.step(boundary, metrics)?;
            clock.advance_to(boundary);
        }

        // Scrape the scheduler counters accumulated during this run.
        let stats = self.root.scheduler_stats();
        metrics.stale_discarded += stats.stale_discarded - stats_at_start.stale_discarded;
        metrics.compactions += stats.compactions - stats_at_start.compactions;
        Ok(())
    }

    /// Advance one macro step from the current time to `boundary`.
    pub fn step(&mut self, boundary: f64, metrics: &mut Metrics) -> Result<StepResult, SimulationError> {
        let from = self.now;
        if boundary < from {
            return Err(SimulationError::InvalidConfig(format!(
                "step boundary ({boundary}) before current time ({from})"
            )));
        }

        let mut result = StepResult {
            step: self.steps_taken,
            from,
            to: boundary,
            cycles: 0,
            events_executed: 0,
            disclosures_routed: 0,
        };

        // STEP 1: first half-interval, then the mid-term observation
        let mid = from + (boundary - from) / 2.0;
        self.advance(mid, metrics, &mut result)?;
        if self.config.observe_mid {
            self.observer.update_dynamic(&self.root, mid);
        }

        // STEP 2: second half-interval
        self.advance(boundary, metrics, &mut result)?;

        // STEP 3: force GloTime to the boundary even if no event fell
        // exactly there; events queued beyond it stay queued.
        self.root.update_time(boundary);
        self.now = boundary;
        self.steps_taken += 1;

        // STEP 4: boundary snapshot; resets the flow accumulators
        self.observer.read_statics(&self.root, boundary);
        if self.config.log_events {
            self.log.log(KernelEvent::Observed {
                time: boundary,
                row: self.observer.table().len() - 1,
            });
        }
        Ok(result)
    }

    /// Run full cycles while the tree's GloTime is within `end`.
    fn advance(
        &mut self,
        end: f64,
        metrics: &mut Metrics,
        result: &mut StepResult,
    ) -> Result<(), SimulationError> {
        loop {
            // COLLECTING
            let (glo_time, requests) = self.root.collect()?;
            if glo_time > end {
                break; // also covers +inf: everything dormant
            }

            // VALIDATING: no default admission rule; an empty batch
            // short-circuits the cycle.
            if requests.is_empty() {
                break;
            }
            if self.config.log_events {
                self.log.log(KernelEvent::Collected {
                    time: glo_time,
                    location: self.root.name().to_string(),
                    batch_size: requests.len(),
                });
            }

            // EXECUTING: the whole batch runs before any clock advances.
            let mut disclosures = Vec::new();
            for request in requests {
                if self.config.log_events {
                    self.log.log(KernelEvent::Executed {
                        time: glo_time,
                        actor: request.who.clone(),
                        action: request.event.action.clone(),
                        location: request.address().target().to_string(),
                    });
                }
                self.observer.count(&request.event.action);
                metrics.events_executed += 1;
                result.events_executed += 1;

                disclosures.extend(self.root.execute(request)?);
            }

            // FINISHING: distribute disclosures before the next collection
            // so every listener-touched actor is re-pended in time.
            for disclosure in disclosures {
                metrics.disclosures_routed += 1;
                result.disclosures_routed += 1;
                if self.config.log_events {
                    self.log.log(KernelEvent::Disclosed {
                        time: glo_time,
                        what: disclosure.what.clone(),
                        who: disclosure.who.clone(),
                        origin: disclosure.address().to_string(),
                    });
                }

                let outcome = self.root.distribute(&disclosure, glo_time);
                metrics.listeners_fired += outcome.fired();
                metrics.listener_failures += outcome.failures.len() as u64;
                if self.config.log_events {
                    for location in &outcome.fired_at {
                        self.log.log(KernelEvent::ListenerFired {
                            time: glo_time,
                            what: disclosure.what.clone(),
                            location: location.clone(),
                        });
                    }
                    for failure in &outcome.failures {
                        self.log.log(KernelEvent::ListenerFailed {
                            time: glo_time,
                            what: failure.what.clone(),
                            location: failure.location.clone(),
                            reason: failure.reason.clone(),
                        });
                    }
                }
            }

            metrics.cycles += 1;
            result.cycles += 1;
        }
        Ok(())
    }
}
