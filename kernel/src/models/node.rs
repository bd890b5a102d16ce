//! The model tree node: a leaf or a branch, behaving as one schedulable
//! unit either way.

use crate::events::types::{Disclosure, Request};
use crate::models::actor::{ConfigError, Y0};
use crate::models::branch::Branch;
use crate::models::leaf::Leaf;
use crate::models::listener::{Listener, OfferOutcome};
use crate::models::ModelError;
use std::collections::BTreeMap;

/// Aggregated scheduler counters for a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Stale queue entries silently discarded.
    pub stale_discarded: u64,
    /// Compaction sweeps performed.
    pub compactions: u64,
}

/// One node of the model composition tree.
#[derive(Debug)]
pub enum ModelNode {
    Leaf(Leaf),
    Branch(Branch),
}

impl ModelNode {
    /// The node's location name.
    pub fn name(&self) -> &str {
        match self {
            ModelNode::Leaf(leaf) => leaf.name(),
            ModelNode::Branch(branch) => branch.name(),
        }
    }

    /// COLLECT: the node's `(glo_time, batch)`.
    pub fn collect(&mut self) -> Result<(f64, Vec<Request>), ModelError> {
        match self {
            ModelNode::Leaf(leaf) => leaf.collect(),
            ModelNode::Branch(branch) => branch.collect(),
        }
    }

    /// EXECUTE: route the request down until it reaches its leaf; returns
    /// the disclosures bubbled back up, re-addressed to this node's level.
    pub fn execute(&mut self, request: Request) -> Result<Vec<Disclosure>, ModelError> {
        match self {
            ModelNode::Leaf(leaf) => leaf.execute(&request),
            ModelNode::Branch(branch) => branch.execute(request),
        }
    }

    /// FINISH: offer a disclosure across this subtree, excluding the
    /// origin path. The origin leaf itself is never offered its own
    /// disclosure.
    pub fn distribute(&mut self, disclosure: &Disclosure, t: f64) -> OfferOutcome {
        match self {
            // A leaf on the distribution path is the origin: skip it.
            ModelNode::Leaf(_) => OfferOutcome::default(),
            ModelNode::Branch(branch) => branch.distribute(disclosure, t),
        }
    }

    /// Offer a disclosure to every listener in this subtree.
    pub fn offer_all(&mut self, disclosure: &Disclosure, t: f64) -> OfferOutcome {
        match self {
            ModelNode::Leaf(leaf) => leaf.offer(disclosure, t),
            ModelNode::Branch(branch) => branch.offer_all(disclosure, t),
        }
    }

    /// Distribute the initial value over the subtree.
    pub fn read_y0(&mut self, y0: &Y0, t0: f64) -> Result<(), ConfigError> {
        match self {
            ModelNode::Leaf(leaf) => leaf.read_y0(y0, t0),
            ModelNode::Branch(branch) => branch.read_y0(y0, t0),
        }
    }

    /// Accumulate stock levels from the subtree.
    pub fn read_statics(&self, out: &mut BTreeMap<String, f64>) {
        match self {
            ModelNode::Leaf(leaf) => leaf.read_statics(out),
            ModelNode::Branch(branch) => branch.read_statics(out),
        }
    }

    /// Force every leaf clock in the subtree to `t`.
    pub fn update_time(&mut self, t: f64) {
        match self {
            ModelNode::Leaf(leaf) => leaf.update_time(t),
            ModelNode::Branch(branch) => branch.update_time(t),
        }
    }

    /// Register a listener on the leaf addressed by `path` (segments from
    /// this node downward, this node's name first).
    pub fn add_listener_at(&mut self, path: &[&str], listener: Listener) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownTarget {
            path: path.join("/"),
        };

        if path.first().copied() != Some(self.name()) {
            return Err(unknown());
        }
        match self {
            ModelNode::Leaf(leaf) => {
                if path.len() != 1 {
                    return Err(unknown());
                }
                leaf.add_listener(listener);
                Ok(())
            }
            ModelNode::Branch(branch) => {
                let child_name = path.get(1).copied().ok_or_else(unknown)?;
                let child = branch.child_mut(child_name).ok_or_else(unknown)?;
                child.add_listener_at(&path[1..], listener)
            }
        }
    }

    /// Locate a node by path (same convention as `add_listener_at`).
    pub fn node_at_mut(&mut self, path: &[&str]) -> Option<&mut ModelNode> {
        if path.first().copied() != Some(self.name()) {
            return None;
        }
        if path.len() == 1 {
            return Some(self);
        }
        match self {
            ModelNode::Leaf(_) => None,
            ModelNode::Branch(branch) => {
                let child = branch.child_mut(path[1])?;
                child.node_at_mut(&path[1..])
            }
        }
    }

    /// Fold scheduler counters over every leaf in the subtree.
    pub fn scheduler_stats(&self) -> SchedulerStats {
        match self {
            ModelNode::Leaf(leaf) => SchedulerStats {
                stale_discarded: leaf.scheduler().stale_discarded(),
                compactions: leaf.scheduler().compactions(),
            },
            ModelNode::Branch(branch) => {
                let mut stats = SchedulerStats::default();
                for child in branch.children() {
                    let below = child.scheduler_stats();
                    stats.stale_discarded += below.stale_discarded;
                    stats.compactions += below.compactions;
                }
                stats
            }
        }
    }
}

impl From<Leaf> for ModelNode {
    fn from(leaf: Leaf) -> Self {
        ModelNode::Leaf(leaf)
    }
}

impl From<Branch> for ModelNode {
    fn from(branch: Branch) -> Self {
        ModelNode::Branch(branch)
    }
}
