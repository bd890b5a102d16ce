//! The Actor role and the instruction set listeners can issue.
//!
//! An actor is anything that exposes a lazily-computed next event: an
//! individual agent, a whole population, or an ODE stock whose integrator
//! decides when the next threshold crossing is due. The kernel never looks
//! inside an actor; it only schedules, executes, and re-schedules it.
//!
//! # Caching contract
//!
//! `next()` returns a cached event, computing it via `find_next()` on a cache
//! miss. `update_time(t)` advances the actor's own clock, resamples any
//! holding times, and MUST invalidate the cache (`drop_next`). Invariant:
//! after `update_time(t)`, `next().time >= t` or `next()` is the never
//! sentinel. The scheduler detects staleness externally with generation
//! counters, so an actor never needs to reason about queue state.

use crate::events::types::{Disclosure, Event, Request};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Opaque, model-specific initial value handed to `read_y0` before the
/// first collection phase.
pub type Y0 = serde_json::Value;

/// Error raised by an actor rejecting a foreign instruction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplyError {
    #[error("instruction {what:?} rejected: {reason}")]
    Rejected { what: String, reason: String },
}

/// Setup-time errors surfaced to the caller before a run starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("initial value rejected by actor {actor:?}: {reason}")]
    Y0Rejected { actor: String, reason: String },

    #[error("no leaf model at path {path:?}")]
    UnknownTarget { path: String },
}

/// An instruction a listener response forwards to a local model.
///
/// One tagged enum, matched in one place, covers the whole family of
/// cross-model effects: pure rescheduling, delivery of a foreign message,
/// and actor removal (e.g. death announced elsewhere).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Reschedule only: the target recomputes its next event against the
    /// state it already has.
    Touch,

    /// Deliver a foreign message to the target actor's `apply`.
    Foreign {
        what: String,
        args: BTreeMap<String, serde_json::Value>,
    },

    /// Remove the target actor from its leaf.
    Remove,
}

/// Anything schedulable and executable by a leaf model.
///
/// The scheduling half (`next`/`find_next`/`drop_next`/`update_time`) and
/// the execution half (`execute`) always travel together: a leaf registers
/// one boxed object per actor name.
pub trait Actor {
    /// Stable identity, unique within the owning leaf.
    fn name(&self) -> &str;

    /// The possibly-cached next event. Computes via [`Actor::find_next`]
    /// when the cache is empty.
    fn next(&mut self) -> Event;

    /// Recompute the next event and cache it.
    fn find_next(&mut self) -> Event;

    /// Invalidate the cached next event.
    fn drop_next(&mut self);

    /// Advance the actor's clock to `t`, resampling holding times as
    /// needed. Must invalidate the cache; afterwards `next().time >= t`
    /// or `next()` is never.
    fn update_time(&mut self, t: f64);

    /// Execute this actor's due event (the request has `reached()` its
    /// leaf). State mutation happens here; announcements of that mutation
    /// are returned as disclosures stamped with the request's location.
    fn execute(&mut self, request: &Request) -> Vec<Disclosure>;

    /// Apply a foreign instruction issued by a listener response. The leaf
    /// marks the actor pending afterwards regardless of outcome.
    fn apply(&mut self, _action: &Action, _t: f64) -> Result<(), ApplyError> {
        Ok(())
    }

    /// Consume the model-specific initial value before the run starts.
    fn read_y0(&mut self, _y0: &Y0, _t0: f64) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Accumulate this actor's stock levels into the shared snapshot map.
    /// Implementations add to existing entries so that several actors can
    /// contribute to one named stock.
    fn read_statics(&self, _out: &mut BTreeMap<String, f64>) {}
}

/// Ordered registry of a leaf's actors. BTree order keeps every kernel
/// iteration deterministic under a fixed seed.
pub type ActorRegistry = BTreeMap<String, Box<dyn Actor>>;
