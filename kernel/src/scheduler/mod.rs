//! Per-location lazy event scheduler.
//!
//! Owns a min-heap of `(time, generation, actor)` entries for one location
//! and turns a set of actors into a globally consistent next-event time.
//! Entries are lazy: an actor's state may change after its entry was pushed,
//! in which case the entry is *stale* and silently discarded. Staleness is
//! detected with per-actor generation counters — `mark_pending` bumps the
//! generation, so every previously pushed entry for that actor stops
//! matching and can be dropped on sight.
//!
//! The heap tie-break is `(time, actor name, generation)`; together with the
//! BTree-ordered pending set this makes collection deterministic for a fixed
//! seed and fixed event order.

use crate::events::types::Request;
use crate::models::actor::ActorRegistry;
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap, HashMap};
use thiserror::Error;

/// Queue compaction threshold: once the heap holds more than
/// `COMPACTION_CAP × registered actors` entries, stale entries are swept.
/// Bounds growth from actors that reschedule often without being popped.
pub const COMPACTION_CAP: usize = 4;

/// Scheduler-level failures. `EmptyQueue` is a programming error: the
/// caller must register at least one actor before collecting.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("collect on location {location:?} with no registered actors")]
    EmptyQueue { location: String },

    #[error("actor {name:?} already registered at location {location:?}")]
    DuplicateActor { location: String, name: String },
}

/// One heap entry. `generation` records the actor generation the entry was
/// computed against; a mismatch with the live generation marks it stale.
#[derive(Debug, Clone)]
struct QueueEntry {
    time: f64,
    generation: u64,
    actor: String,
}

// Reversed Ord turns std's max-heap into a deterministic min-heap keyed by
// (time, actor, generation).
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.actor.cmp(&self.actor))
            .then_with(|| other.generation.cmp(&self.generation))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

/// Lazy priority queue for one location.
///
/// # Batch invariant
///
/// `current_batch` is non-empty only immediately after a collect. Every
/// mutation (`add_actor`, `remove_actor`, `mark_pending`) dissolves it back
/// into the pending set — batch entries were popped off the heap, so the
/// cached vector is the only record of those due events and its members
/// must be rescheduled, not dropped. Execution (`clear_batch`) consumes the
/// batch instead. Collecting twice without intervening mutation returns the
/// same batch.
#[derive(Debug)]
pub struct Scheduler {
    /// Location this scheduler serves; collected requests are addressed
    /// `[location]`.
    location: String,

    /// Min-heap of lazily maintained entries.
    queue: BinaryHeap<QueueEntry>,

    /// Actors whose cached next event is known stale and must be
    /// recomputed before their entry can be trusted.
    pending: BTreeSet<String>,

    /// Live generation per registered actor.
    generations: HashMap<String, u64>,

    /// All requests tied for the minimum time at this location.
    current_batch: Vec<Request>,

    /// Time of the current batch; never sentinel when no batch is held.
    batch_time: f64,

    /// Stale entries discarded so far (metrics).
    stale_discarded: u64,

    /// Compaction sweeps performed so far (metrics).
    compactions: u64,
}

impl Scheduler {
    /// Create an empty scheduler for `location`.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            queue: BinaryHeap::new(),
            pending: BTreeSet::new(),
            generations: HashMap::new(),
            current_batch: Vec::new(),
            batch_time: f64::INFINITY,
            stale_discarded: 0,
            compactions: 0,
        }
    }

    /// The location this scheduler serves.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Register an actor and mark it pending.
    pub fn add_actor(&mut self, name: &str) -> Result<(), SchedulerError> {
        if self.generations.contains_key(name) {
            return Err(SchedulerError::DuplicateActor {
                location: self.location.clone(),
                name: name.to_string(),
            });
        }
        self.generations.insert(name.to_string(), 0);
        self.pending.insert(name.to_string());
        self.invalidate_batch();
        Ok(())
    }

    /// Drop an actor from all sets. Queued entries are not physically
    /// removed; their generation lookup now fails, so they are discarded
    /// on sight or at the next compaction. Returns false for unknown names.
    pub fn remove_actor(&mut self, name: &str) -> bool {
        let known = self.generations.remove(name).is_some();
        if known {
            // Dissolve the batch first so the removed actor's re-pend is
            // erased along with its pending flag.
            self.invalidate_batch();
            self.pending.remove(name);
        }
        known
    }

    /// Bump the actor's generation and mark it pending: every queued entry
    /// for it is now stale. Returns false for unknown names.
    pub fn mark_pending(&mut self, name: &str) -> bool {
        match self.generations.get_mut(name) {
            Some(generation) => {
                *generation += 1;
                self.pending.insert(name.to_string());
                self.invalidate_batch();
                true
            }
            None => false,
        }
    }

    /// Recompute and enqueue every pending actor, then compact if the heap
    /// outgrew its cap. Actors whose next event is never go dormant: no
    /// entry is pushed until they are marked pending again.
    pub fn reschedule_pending(&mut self, actors: &mut ActorRegistry) {
        let pending = std::mem::take(&mut self.pending);
        for name in pending {
            let Some(&generation) = self.generations.get(&name) else {
                continue; // removed while pending
            };
            let Some(actor) = actors.get_mut(&name) else {
                continue;
            };
            let event = actor.next();
            if event.is_never() {
                continue;
            }
            self.queue.push(QueueEntry {
                time: event.time,
                generation,
                actor: name,
            });
        }
        self.compact_if_needed();
    }

    /// Collect the batch of requests tied for this location's minimum time.
    ///
    /// Returns `(glo_time, batch)`. A location whose actors are all dormant
    /// collects as `(+inf, [])`; collecting with no registered actors at
    /// all is an [`SchedulerError::EmptyQueue`] programming error.
    ///
    /// Idempotent: a second collect without intervening mutation returns
    /// the cached batch unchanged.
    pub fn collect(&mut self, actors: &mut ActorRegistry) -> Result<(f64, Vec<Request>), SchedulerError> {
        if !self.current_batch.is_empty() {
            return Ok((self.batch_time, self.current_batch.clone()));
        }
        if self.generations.is_empty() {
            return Err(SchedulerError::EmptyQueue {
                location: self.location.clone(),
            });
        }

        self.reschedule_pending(actors);

        // Discard superseded heads until a live minimum remains.
        let glo_time = loop {
            match self.queue.peek() {
                None => return Ok((f64::INFINITY, Vec::new())),
                Some(entry) if self.is_stale(entry) => {
                    self.queue.pop();
                    self.stale_discarded += 1;
                }
                Some(entry) => break entry.time,
            }
        };

        // Pop every live entry tied at the minimum into the batch.
        let mut batch = Vec::new();
        while let Some(head) = self.queue.peek() {
            if head.time.total_cmp(&glo_time) != Ordering::Equal {
                break;
            }
            let Some(entry) = self.queue.pop() else {
                break;
            };
            if self.is_stale(&entry) {
                self.stale_discarded += 1;
                continue;
            }
            let Some(actor) = actors.get_mut(&entry.actor) else {
                self.stale_discarded += 1;
                continue;
            };
            let event = actor.next();
            batch.push(Request::new(event, entry.actor, &self.location));
        }

        self.batch_time = glo_time;
        self.current_batch = batch.clone();
        Ok((glo_time, batch))
    }

    /// Forget the current batch. Called when the batch enters execution.
    pub fn clear_batch(&mut self) {
        self.current_batch.clear();
        self.batch_time = f64::INFINITY;
    }

    /// Number of registered actors (dormant ones included).
    pub fn num_actors(&self) -> usize {
        self.generations.len()
    }

    /// Heap length, stale entries included.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// True while a collected batch is held.
    pub fn has_batch(&self) -> bool {
        !self.current_batch.is_empty()
    }

    /// Stale entries discarded since construction.
    pub fn stale_discarded(&self) -> u64 {
        self.stale_discarded
    }

    /// Compaction sweeps since construction.
    pub fn compactions(&self) -> u64 {
        self.compactions
    }

    fn is_stale(&self, entry: &QueueEntry) -> bool {
        self.generations
            .get(&entry.actor)
            .map_or(true, |generation| *generation != entry.generation)
    }

    /// Dissolve the cached batch back into the pending set. The batch
    /// entries no longer exist in the heap; dropping them without
    /// re-pending their actors would lose those due events.
    fn invalidate_batch(&mut self) {
        for request in self.current_batch.drain(..) {
            self.pending.insert(request.who);
        }
        self.batch_time = f64::INFINITY;
    }

    fn compact_if_needed(&mut self) {
        let cap = COMPACTION_CAP * self.generations.len();
        if self.queue.len() <= cap {
            return;
        }
        let entries = std::mem::take(&mut self.queue).into_vec();
        let before = entries.len();
        let live: Vec<QueueEntry> = entries
            .into_iter()
            .filter(|entry| !self.is_stale(entry))
            .collect();
        self.stale_discarded += (before - live.len()) as u64;
        self.queue = live.into();
        self.compactions += 1;
    }
}
