//! Core message types of the kernel.
//!
//! Three immutable value types describe everything that moves through the
//! model tree:
//!
//! - **Event**: what happens and when. Carries no payload; the meaning of
//!   `action` is model-specific.
//! - **Request**: a directed instruction to execute a specific actor's due
//!   event, routed to exactly one leaf via its [`Path`].
//! - **Disclosure**: a broadcast notification of a state change, bubbled to
//!   the root and redistributed across the tree.
//!
//! Requests and disclosures are created fresh each cycle and discarded after
//! routing; they are cheap to clone and carry no references into the tree.

use crate::events::path::Path;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Opaque argument values attached to a disclosure.
pub type Args = BTreeMap<String, serde_json::Value>;

/// A scheduled happening: an action name and the continuous time at which
/// it is due. Totally ordered by time (`f64::total_cmp`).
///
/// # Example
/// ```
/// use multiscale_simulator_core_rs::Event;
///
/// let due = Event::new("divide", 3.5);
/// let never = Event::never();
///
/// assert!(!due.is_never());
/// assert!(never.is_never());
/// assert!(due.cmp_time(&never).is_lt());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Model-specific action name.
    pub action: String,
    /// Due time. `+inf` is the never sentinel.
    pub time: f64,
}

impl Event {
    /// Create an event due at `time`.
    pub fn new(action: impl Into<String>, time: f64) -> Self {
        Self {
            action: action.into(),
            time,
        }
    }

    /// The sentinel event that never fires (`time = +inf`).
    pub fn never() -> Self {
        Self {
            action: String::new(),
            time: f64::INFINITY,
        }
    }

    /// True for the never sentinel (and any event at infinite time).
    pub fn is_never(&self) -> bool {
        self.time.is_infinite() && self.time > 0.0
    }

    /// Total order on due times.
    pub fn cmp_time(&self, other: &Event) -> Ordering {
        self.time.total_cmp(&other.time)
    }
}

/// A directed instruction to execute `who`'s due event at the leaf addressed
/// by `address`. Ordered by event time; ties keep all requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The due event.
    pub event: Event,
    /// Name of the actor whose event this is.
    pub who: String,
    /// Routing address; the final segment names the owning leaf.
    address: Path,
}

impl Request {
    /// Create a request addressed to a single location.
    pub fn new(event: Event, who: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            event,
            who: who.into(),
            address: Path::new(location),
        }
    }

    /// The routing address.
    pub fn address(&self) -> &Path {
        &self.address
    }

    /// Prepend an ancestor location (bubbling child → parent).
    pub fn up_scale(&mut self, location: impl Into<String>) {
        self.address.up_scale(location);
    }

    /// Strip the outermost location (routing parent → child).
    pub fn down_scale(&mut self) -> Option<String> {
        self.address.down_scale()
    }

    /// True once the request has arrived at its target leaf.
    pub fn reached(&self) -> bool {
        self.address.reached()
    }

    /// Total order on due times.
    pub fn cmp_time(&self, other: &Request) -> Ordering {
        self.event.cmp_time(&other.event)
    }
}

/// A broadcast notification that `who` changed state at the leaf addressed
/// by `address`. The only channel for non-hierarchical coupling: bubbled to
/// the root, then offered to every subtree off the origin path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disclosure {
    /// What was announced (e.g. `"birth"`).
    pub what: String,
    /// Name of the announcing actor.
    pub who: String,
    /// Origin address, extended by `up_scale` while bubbling.
    address: Path,
    /// Opaque arguments for listeners.
    pub args: Args,
}

impl Disclosure {
    /// Announce `what` from `who` at `location`. The location is normally
    /// taken from the request being executed (`request.address().target()`).
    pub fn new(what: impl Into<String>, who: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            what: what.into(),
            who: who.into(),
            address: Path::new(location),
            args: Args::new(),
        }
    }

    /// Attach an argument (builder style).
    pub fn with_arg(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.args.insert(key.into(), value);
        self
    }

    /// The origin address.
    pub fn address(&self) -> &Path {
        &self.address
    }

    /// Prepend an ancestor location (bubbling child → parent).
    pub fn up_scale(&mut self, location: impl Into<String>) {
        self.address.up_scale(location);
    }

    /// Strip the outermost location (descending during distribution).
    pub fn down_scale(&mut self) -> Option<String> {
        self.address.down_scale()
    }

    /// True once only the origin leaf remains on the path.
    pub fn reached(&self) -> bool {
        self.address.reached()
    }

    /// Scope this disclosure to the children of the origin's parent.
    pub fn sibling_scale(&mut self) {
        self.address.sibling_scale();
    }

    /// True if scoped to siblings of the origin.
    pub fn is_sibling_scoped(&self) -> bool {
        self.address.is_sibling_scoped()
    }

    /// Look up an argument.
    pub fn arg(&self, key: &str) -> Option<&serde_json::Value> {
        self.args.get(key)
    }
}
