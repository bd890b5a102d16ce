//! Per-run kernel metrics.
//!
//! An explicit `Metrics` value is passed `&mut` into `simulate`, scoped to
//! exactly one run. There is no global counter state anywhere in the
//! kernel.

use serde::Serialize;

/// Counters describing one simulation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    /// Completed COLLECT → FINISH cycles.
    pub cycles: u64,
    /// Requests executed.
    pub events_executed: u64,
    /// Disclosures bubbled to the root and distributed.
    pub disclosures_routed: u64,
    /// Listener responses that matched and were applied.
    pub listeners_fired: u64,
    /// Listener responses that failed to apply (logged, not fatal).
    pub listener_failures: u64,
    /// Stale queue entries discarded across all schedulers.
    pub stale_discarded: u64,
    /// Queue compaction sweeps across all schedulers.
    pub compactions: u64,
}

impl Metrics {
    /// Fresh, all-zero metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every counter, reusing the allocation-free value across runs.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
