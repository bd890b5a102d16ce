//! Kernel log for replay and debugging.
//!
//! When enabled, the simulator appends one [`KernelEvent`] per significant
//! kernel happening: batch collection, request execution, disclosure routing,
//! listener dispatch, and observation. The log is append-only and queryable
//! by time, type, and actor.
//!
//! The log records what the *kernel* did, not what the models mean by it;
//! model-level history belongs to the observer table.

use serde::{Deserialize, Serialize};

/// One kernel happening, tagged with the simulation time it occurred at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KernelEvent {
    /// A collection phase produced a batch at a location.
    Collected {
        time: f64,
        location: String,
        batch_size: usize,
    },

    /// A request was executed against an actor.
    Executed {
        time: f64,
        actor: String,
        action: String,
        location: String,
    },

    /// A disclosure reached the root and was distributed.
    Disclosed {
        time: f64,
        what: String,
        who: String,
        origin: String,
    },

    /// A listener matched a disclosure and its response was applied.
    ListenerFired {
        time: f64,
        what: String,
        location: String,
    },

    /// A listener response failed to apply; the cycle continued.
    ListenerFailed {
        time: f64,
        what: String,
        location: String,
        reason: String,
    },

    /// An observer row was pushed.
    Observed { time: f64, row: usize },
}

impl KernelEvent {
    /// The simulation time this event occurred at.
    pub fn time(&self) -> f64 {
        match self {
            KernelEvent::Collected { time, .. }
            | KernelEvent::Executed { time, .. }
            | KernelEvent::Disclosed { time, .. }
            | KernelEvent::ListenerFired { time, .. }
            | KernelEvent::ListenerFailed { time, .. }
            | KernelEvent::Observed { time, .. } => *time,
        }
    }

    /// The variant name, for type queries.
    pub fn event_type(&self) -> &'static str {
        match self {
            KernelEvent::Collected { .. } => "Collected",
            KernelEvent::Executed { .. } => "Executed",
            KernelEvent::Disclosed { .. } => "Disclosed",
            KernelEvent::ListenerFired { .. } => "ListenerFired",
            KernelEvent::ListenerFailed { .. } => "ListenerFailed",
            KernelEvent::Observed { .. } => "Observed",
        }
    }

    /// The actor involved, when the variant names one.
    pub fn actor(&self) -> Option<&str> {
        match self {
            KernelEvent::Executed { actor, .. } => Some(actor),
            KernelEvent::Disclosed { who, .. } => Some(who),
            _ => None,
        }
    }
}

/// Append-only store of kernel events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KernelLog {
    events: Vec<KernelEvent>,
}

impl KernelLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append an event.
    pub fn log(&mut self, event: KernelEvent) {
        self.events.push(event);
    }

    /// Number of events logged.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All events, in the order they were logged.
    pub fn events(&self) -> &[KernelEvent] {
        &self.events
    }

    /// Events at an exact simulation time.
    pub fn events_at_time(&self, time: f64) -> Vec<&KernelEvent> {
        self.events
            .iter()
            .filter(|e| e.time().total_cmp(&time).is_eq())
            .collect()
    }

    /// Events of a given type (variant name).
    pub fn events_of_type(&self, event_type: &str) -> Vec<&KernelEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Events naming a specific actor.
    pub fn events_for_actor(&self, actor: &str) -> Vec<&KernelEvent> {
        self.events
            .iter()
            .filter(|e| e.actor() == Some(actor))
            .collect()
    }

    /// Drop all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
