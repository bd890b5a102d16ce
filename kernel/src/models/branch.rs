//! Branch model: recursive composition of named child models.
//!
//! A branch owns no scheduler and no actors. Its aggregate next time is the
//! minimum over its children, one path level deeper: collected child
//! requests are re-addressed with `up_scale(self.name)` and only those at
//! the global minimum are promoted. Children whose batches lie later keep
//! them cached (collection is idempotent) until their time comes.

use crate::events::types::{Disclosure, Request};
use crate::models::actor::{ConfigError, Y0};
use crate::models::listener::OfferOutcome;
use crate::models::node::ModelNode;
use crate::models::ModelError;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Internal node of the model tree.
#[derive(Debug)]
pub struct Branch {
    name: String,
    children: BTreeMap<String, ModelNode>,
}

impl Branch {
    /// Create an empty branch named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: BTreeMap::new(),
        }
    }

    /// This branch's location name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach a child model under its own name.
    pub fn add_child(&mut self, child: ModelNode) -> Result<(), ModelError> {
        let name = child.name().to_string();
        if self.children.contains_key(&name) {
            return Err(ModelError::DuplicateChild {
                node: self.name.clone(),
                name,
            });
        }
        self.children.insert(name, child);
        Ok(())
    }

    /// Number of direct children.
    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    /// Shared access to a direct child.
    pub fn child(&self, name: &str) -> Option<&ModelNode> {
        self.children.get(name)
    }

    /// Mutable access to a direct child.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut ModelNode> {
        self.children.get_mut(name)
    }

    /// Iterate the direct children in name order.
    pub fn children(&self) -> impl Iterator<Item = &ModelNode> {
        self.children.values()
    }

    /// COLLECT: gather every child's batch, keep only requests at the
    /// global minimum across children, re-addressed one level up. Children
    /// collecting as `(+inf, [])` (all dormant) never win the minimum.
    pub fn collect(&mut self) -> Result<(f64, Vec<Request>), ModelError> {
        let mut glo_time = f64::INFINITY;
        let mut promoted: Vec<Request> = Vec::new();

        for child in self.children.values_mut() {
            let (time, requests) = child.collect()?;
            match time.total_cmp(&glo_time) {
                Ordering::Less => {
                    glo_time = time;
                    promoted = requests;
                }
                Ordering::Equal => promoted.extend(requests),
                Ordering::Greater => {}
            }
        }

        for request in &mut promoted {
            request.up_scale(&self.name);
        }
        Ok((glo_time, promoted))
    }

    /// EXECUTE: strip the own segment and route the request to the
    /// matching child; disclosures bubble back re-addressed one level up.
    pub fn execute(&mut self, mut request: Request) -> Result<Vec<Disclosure>, ModelError> {
        if request.reached() {
            // Addressed to this branch itself; a branch holds no actors.
            return Err(ModelError::PathExhausted {
                path: request.address().to_string(),
            });
        }
        let own = request
            .down_scale()
            .unwrap_or_default(); // non-reached paths always yield a segment
        if own != self.name {
            return Err(ModelError::UnknownRoute {
                node: self.name.clone(),
                child: own,
            });
        }

        let child_name = request.address().first().to_string();
        let child =
            self.children
                .get_mut(&child_name)
                .ok_or_else(|| ModelError::UnknownRoute {
                    node: self.name.clone(),
                    child: child_name,
                })?;

        let mut disclosures = child.execute(request)?;
        for disclosure in &mut disclosures {
            disclosure.up_scale(&self.name);
        }
        Ok(disclosures)
    }

    /// FINISH: walk the subtree offering `disclosure` to every node off
    /// the origin path. The emitting subtree is skipped by descending along
    /// the path without offering; a sibling-scoped disclosure additionally
    /// confines the offer to the origin leaf's immediate siblings.
    pub fn distribute(&mut self, disclosure: &Disclosure, t: f64) -> OfferOutcome {
        let mut outcome = OfferOutcome::default();

        let segments = disclosure.address().segments();
        let on_path = segments.get(1).cloned();
        let scoped = disclosure.is_sibling_scoped();
        // A scoped path reads [self, origin-leaf, "*"] exactly at the
        // origin's parent.
        let at_origin_parent = scoped && segments.len() == 3;

        for (name, child) in &mut self.children {
            if Some(name) == on_path.as_ref() {
                let mut inner = disclosure.clone();
                inner.down_scale();
                outcome.absorb(child.distribute(&inner, t));
            } else if !scoped || at_origin_parent {
                outcome.absorb(child.offer_all(disclosure, t));
            }
        }
        outcome
    }

    /// Offer a disclosure to every listener in this subtree.
    pub fn offer_all(&mut self, disclosure: &Disclosure, t: f64) -> OfferOutcome {
        let mut outcome = OfferOutcome::default();
        for child in self.children.values_mut() {
            outcome.absorb(child.offer_all(disclosure, t));
        }
        outcome
    }

    /// Distribute the initial value over the whole subtree.
    pub fn read_y0(&mut self, y0: &Y0, t0: f64) -> Result<(), ConfigError> {
        for child in self.children.values_mut() {
            child.read_y0(y0, t0)?;
        }
        Ok(())
    }

    /// Accumulate stock levels from the whole subtree.
    pub fn read_statics(&self, out: &mut BTreeMap<String, f64>) {
        for child in self.children.values() {
            child.read_statics(out);
        }
    }

    /// Force every leaf clock in the subtree to `t`.
    pub fn update_time(&mut self, t: f64) {
        for child in self.children.values_mut() {
            child.update_time(t);
        }
    }
}
