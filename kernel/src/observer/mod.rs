//! Observation: per-step snapshots and per-interval flows.
//!
//! The observer accumulates two kinds of measurement into one time-indexed
//! table:
//!
//! - **statics** (stocks): levels read from the model tree at each macro
//!   step boundary via `Actor::read_statics`;
//! - **dynamics** (flows): counts of executed events since the previous
//!   snapshot, reset on every push.
//!
//! An optional mid-interval reading (`update_dynamic`, taken at `t + dt/2`)
//! contributes `avg:<stock>` columns: the mean of the mid and boundary
//! levels, a trapezoidal-style average over the interval.
//!
//! Rows are immutable once pushed. The table serializes as-is; writing it
//! to CSV/JSON is the embedding layer's job.

use crate::models::node::ModelNode;
use serde::Serialize;
use std::collections::BTreeMap;

/// Column prefix for flow counters.
const FLOW_PREFIX: &str = "flow:";

/// Column prefix for mid-averaged stock levels.
const AVG_PREFIX: &str = "avg:";

/// Time-indexed observation table: one row per snapshot, one column per
/// stock or flow name. Column order is the BTree order of names.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TimeSeries {
    times: Vec<f64>,
    rows: Vec<BTreeMap<String, f64>>,
}

impl TimeSeries {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True before the first snapshot.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Snapshot times, in push order.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Row by index.
    pub fn row(&self, index: usize) -> Option<&BTreeMap<String, f64>> {
        self.rows.get(index)
    }

    /// A single cell.
    pub fn value_at(&self, index: usize, column: &str) -> Option<f64> {
        self.rows.get(index).and_then(|row| row.get(column)).copied()
    }

    /// One column over all rows; rows without the column yield `None`
    /// (e.g. flow columns before the first matching event).
    pub fn column(&self, name: &str) -> Vec<Option<f64>> {
        self.rows.iter().map(|row| row.get(name).copied()).collect()
    }

    fn push(&mut self, time: f64, row: BTreeMap<String, f64>) {
        self.times.push(time);
        self.rows.push(row);
    }
}

/// Accumulates snapshots and flows for one run.
#[derive(Debug, Clone, Default)]
pub struct Observer {
    table: TimeSeries,
    /// Event counts since the previous snapshot.
    flows: BTreeMap<String, f64>,
    /// Mid-interval stock reading, consumed by the next push.
    mid: Option<BTreeMap<String, f64>>,
}

impl Observer {
    /// Create an empty observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one executed event named `action` into the flow accumulators.
    pub fn count(&mut self, action: &str) {
        *self
            .flows
            .entry(format!("{FLOW_PREFIX}{action}"))
            .or_insert(0.0) += 1.0;
    }

    /// Mid-term reading at `t + dt/2`: remembered and folded into the next
    /// boundary snapshot as `avg:<stock>` columns.
    pub fn update_dynamic(&mut self, model: &ModelNode, _t: f64) {
        let mut reading = BTreeMap::new();
        model.read_statics(&mut reading);
        self.mid = Some(reading);
    }

    /// Boundary snapshot at `t`: read stocks, fold in the mid reading and
    /// the flow accumulators, push one immutable row, reset the flows.
    pub fn read_statics(&mut self, model: &ModelNode, t: f64) {
        let mut row = BTreeMap::new();
        model.read_statics(&mut row);

        if let Some(mid) = self.mid.take() {
            let averages: Vec<(String, f64)> = row
                .iter()
                .filter_map(|(name, boundary)| {
                    mid.get(name)
                        .map(|m| (format!("{AVG_PREFIX}{name}"), (m + boundary) / 2.0))
                })
                .collect();
            row.extend(averages);
        }

        row.append(&mut self.flows);
        self.table.push(t, row);
    }

    /// The accumulated table.
    pub fn table(&self) -> &TimeSeries {
        &self.table
    }

    /// Flow accumulators counted since the last push (mainly for tests).
    pub fn pending_flows(&self) -> &BTreeMap<String, f64> {
        &self.flows
    }
}
