//! Leaf model: one scheduler plus a registry of actors.
//!
//! The leaf is where state actually lives and mutates. It exposes the
//! scheduler's batch as requests addressed `[self.name]`, executes requests
//! that have reached it, and hosts the listeners through which foreign
//! disclosures act on its actors.

use crate::events::types::{Disclosure, Request};
use crate::models::actor::{Action, Actor, ActorRegistry, ConfigError, Y0};
use crate::models::listener::{Listener, OfferFailure, OfferOutcome};
use crate::models::ModelError;
use crate::scheduler::Scheduler;
use std::collections::BTreeMap;
use std::fmt;

/// Terminal node of the model tree.
pub struct Leaf {
    name: String,
    scheduler: Scheduler,
    actors: ActorRegistry,
    listeners: Vec<Listener>,
    /// Local clock: last executed or forced time.
    now: f64,
}

impl Leaf {
    /// Create an empty leaf named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            scheduler: Scheduler::new(name.clone()),
            name,
            actors: ActorRegistry::new(),
            listeners: Vec::new(),
            now: 0.0,
        }
    }

    /// This leaf's location name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local clock.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Register an actor under its own name and mark it pending.
    pub fn add_actor(&mut self, actor: Box<dyn Actor>) -> Result<(), ModelError> {
        let name = actor.name().to_string();
        if self.actors.contains_key(&name) {
            return Err(ModelError::DuplicateActor {
                leaf: self.name.clone(),
                name,
            });
        }
        self.scheduler.add_actor(&name)?;
        self.actors.insert(name, actor);
        Ok(())
    }

    /// Remove an actor (e.g. agent death). Returns false for unknown names.
    pub fn remove_actor(&mut self, name: &str) -> bool {
        let known = self.actors.remove(name).is_some();
        if known {
            self.scheduler.remove_actor(name);
        }
        known
    }

    /// Register a cross-model listener.
    pub fn add_listener(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    /// Mark an actor's cached next event stale. Returns false for unknown
    /// names.
    pub fn mark_pending(&mut self, name: &str) -> bool {
        self.scheduler.mark_pending(name)
    }

    /// Number of registered actors.
    pub fn num_actors(&self) -> usize {
        self.actors.len()
    }

    /// Shared access to an actor, mainly for assertions in tests.
    pub fn actor(&self, name: &str) -> Option<&dyn Actor> {
        self.actors.get(name).map(Box::as_ref)
    }

    /// The scheduler serving this leaf.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// COLLECT: expose the batch of requests tied for this location's
    /// minimum time, addressed `[self.name]`.
    pub fn collect(&mut self) -> Result<(f64, Vec<Request>), ModelError> {
        Ok(self.scheduler.collect(&mut self.actors)?)
    }

    /// EXECUTE: run a request that has reached this leaf against the
    /// addressed actor. Clears the batch, advances the actor past the
    /// event, and marks it pending so the next collection recomputes it.
    pub fn execute(&mut self, request: &Request) -> Result<Vec<Disclosure>, ModelError> {
        if !request.reached() || request.address().target() != self.name {
            return Err(ModelError::UnknownRoute {
                node: self.name.clone(),
                child: request.address().first().to_string(),
            });
        }
        self.scheduler.clear_batch();

        let t = request.event.time;
        let actor = self
            .actors
            .get_mut(&request.who)
            .ok_or_else(|| ModelError::UnknownActor {
                leaf: self.name.clone(),
                actor: request.who.clone(),
            })?;

        let disclosures = actor.execute(request);
        actor.update_time(t);
        debug_assert!(
            actor.next().time >= t,
            "update_time({t}) left {} scheduled in the past",
            request.who
        );

        self.scheduler.mark_pending(&request.who);
        self.now = t;
        Ok(disclosures)
    }

    /// Offer a foreign disclosure to this leaf's listeners and apply the
    /// resulting actions. A failing action is recorded, not propagated.
    pub fn offer(&mut self, disclosure: &Disclosure, t: f64) -> OfferOutcome {
        let mut outcome = OfferOutcome::default();

        let mut instructions = Vec::new();
        for listener in &mut self.listeners {
            if listener.matches(disclosure) {
                outcome.fired_at.push(self.name.clone());
                instructions.extend(listener.respond(disclosure, t));
            }
        }

        for (actor, action) in instructions {
            if let Err(err) = self.apply(&actor, &action, t) {
                outcome.failures.push(OfferFailure {
                    location: self.name.clone(),
                    what: disclosure.what.clone(),
                    reason: err.to_string(),
                });
            }
        }
        outcome
    }

    /// Apply one instruction to one actor. The actor is marked pending
    /// whenever it still exists afterwards, even if it rejected the
    /// instruction with partial effect.
    pub fn apply(&mut self, actor: &str, action: &Action, t: f64) -> Result<(), ModelError> {
        match action {
            Action::Touch => {
                if !self.mark_pending(actor) {
                    return Err(ModelError::UnknownActor {
                        leaf: self.name.clone(),
                        actor: actor.to_string(),
                    });
                }
                Ok(())
            }
            Action::Foreign { .. } => {
                let target =
                    self.actors
                        .get_mut(actor)
                        .ok_or_else(|| ModelError::UnknownActor {
                            leaf: self.name.clone(),
                            actor: actor.to_string(),
                        })?;
                let applied = target.apply(action, t);
                self.mark_pending(actor);
                applied.map_err(|err| ModelError::Apply {
                    leaf: self.name.clone(),
                    actor: actor.to_string(),
                    reason: err.to_string(),
                })
            }
            Action::Remove => {
                if !self.remove_actor(actor) {
                    return Err(ModelError::UnknownActor {
                        leaf: self.name.clone(),
                        actor: actor.to_string(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Distribute the model-specific initial value to every actor, then
    /// mark the whole leaf pending at `t0`.
    pub fn read_y0(&mut self, y0: &Y0, t0: f64) -> Result<(), ConfigError> {
        let names: Vec<String> = self.actors.keys().cloned().collect();
        for name in &names {
            if let Some(actor) = self.actors.get_mut(name) {
                actor.read_y0(y0, t0)?;
            }
        }
        for name in &names {
            self.scheduler.mark_pending(name);
        }
        self.now = t0;
        Ok(())
    }

    /// Accumulate every actor's stock levels into the snapshot map.
    pub fn read_statics(&self, out: &mut BTreeMap<String, f64>) {
        for actor in self.actors.values() {
            actor.read_statics(out);
        }
    }

    /// Force the local clock to `t` (macro-step boundary). Queued events
    /// beyond `t` stay queued; actor caches are untouched.
    pub fn update_time(&mut self, t: f64) {
        self.now = t;
    }
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leaf")
            .field("name", &self.name)
            .field("actors", &self.actors.keys().collect::<Vec<_>>())
            .field("listeners", &self.listeners.len())
            .field("now", &self.now)
            .finish()
    }
}
