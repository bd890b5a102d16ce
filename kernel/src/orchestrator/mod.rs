//! Simulation orchestration: the stepping driver and its run metrics.

pub mod engine;
pub mod metrics;

pub use engine::{SimulationError, Simulator, SimulatorConfig, StepResult};
pub use metrics::Metrics;
