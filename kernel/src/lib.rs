//! Multiscale Simulator Core - Rust Engine
//!
//! Discrete-event simulation kernel for hierarchical multiscale models with
//! deterministic execution.
//!
//! # Architecture
//!
//! - **events**: Value types on the wire (Event, Request, Disclosure, Path)
//!   and the kernel event log
//! - **scheduler**: Lazy per-location priority queue with generation-based
//!   staleness and bounded compaction
//! - **models**: The model tree (Actor, Leaf, Branch, ModelNode) and
//!   cross-model listeners
//! - **core**: Macro-step time management
//! - **observer**: Stock snapshots and flow accumulation into a time series
//! - **orchestrator**: The stepping driver and per-run metrics
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Within one cycle, every request tied for the global minimum time is
//!    executed before any clock advances
//! 2. Disclosures are distributed before the next collection
//! 3. All iteration orders are deterministic (BTreeMap registries, total
//!    ordering on queue entries); all randomness is seeded

// Module declarations
pub mod core;
pub mod events;
pub mod models;
pub mod observer;
pub mod orchestrator;
pub mod rng;
pub mod scheduler;

// Re-exports for convenience
pub use core::clock::StepClock;
pub use events::{
    log::{KernelEvent, KernelLog},
    path::{Path, SIBLING_MARKER},
    types::{Args, Disclosure, Event, Request},
};
pub use models::{
    actor::{Action, Actor, ActorRegistry, ApplyError, ConfigError, Y0},
    branch::Branch,
    leaf::Leaf,
    listener::{Listener, OfferFailure, OfferOutcome},
    node::{ModelNode, SchedulerStats},
    ModelError,
};
pub use observer::{Observer, TimeSeries};
pub use orchestrator::{Metrics, SimulationError, Simulator, SimulatorConfig, StepResult};
pub use rng::RngManager;
pub use scheduler::{Scheduler, SchedulerError, COMPACTION_CAP};
