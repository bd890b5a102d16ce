//! Model composition: actors, leaves, branches, and listeners.
//!
//! A `Leaf` wraps one scheduler and a registry of actors; a `Branch` owns
//! named child models and aggregates their requests and disclosures,
//! behaving itself as a schedulable unit one level up. `ModelNode` is the
//! enum the tree is built from.
//!
//! # Critical Invariants
//!
//! 1. Within one location, all actors tied for the minimum time execute
//!    before the clock advances.
//! 2. A branch never advances past its earliest child.
//! 3. Every actor touched by a listener response is marked pending before
//!    the next collection phase.

pub mod actor;
pub mod branch;
pub mod leaf;
pub mod listener;
pub mod node;

pub use actor::{Action, Actor, ActorRegistry, ApplyError, ConfigError, Y0};
pub use branch::Branch;
pub use leaf::Leaf;
pub use listener::{Listener, OfferFailure, OfferOutcome, Predicate, Response};
pub use node::{ModelNode, SchedulerStats};

use crate::scheduler::SchedulerError;
use thiserror::Error;

/// Routing and registry failures. Everything except `Apply` is a
/// programming error: the tree was built or addressed inconsistently, and
/// continuing would corrupt event ordering.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("request path {path:?} exhausted before reaching a leaf")]
    PathExhausted { path: String },

    #[error("no child {child:?} under node {node:?}")]
    UnknownRoute { node: String, child: String },

    #[error("no actor {actor:?} in leaf {leaf:?}")]
    UnknownActor { leaf: String, actor: String },

    #[error("duplicate actor {name:?} in leaf {leaf:?}")]
    DuplicateActor { leaf: String, name: String },

    #[error("duplicate child {name:?} under node {node:?}")]
    DuplicateChild { node: String, name: String },

    #[error("actor {actor:?} in leaf {leaf:?} rejected instruction: {reason}")]
    Apply {
        leaf: String,
        actor: String,
        reason: String,
    },

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}
