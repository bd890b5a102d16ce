//! Cross-model listeners.
//!
//! A listener is a predicate over disclosures plus a response that turns a
//! matching disclosure into instructions for the local model. Listeners are
//! registered on leaf nodes; during the Finishing phase the root offers
//! every disclosure to all listeners off the disclosure's origin path.
//!
//! A response names the local actors it wants to affect and the [`Action`]
//! for each; the leaf applies the actions and re-marks the touched actors
//! pending before the next collection, so nothing is ever scheduled against
//! a stale state.

use crate::events::types::Disclosure;
use crate::models::actor::Action;
use std::fmt;

/// Matching test over incoming disclosures.
pub type Predicate = Box<dyn Fn(&Disclosure) -> bool>;

/// Response to a matched disclosure: `(actor name, action)` pairs applied
/// through the local leaf.
pub type Response = Box<dyn FnMut(&Disclosure, f64) -> Vec<(String, Action)>>;

/// Predicate + response pair registered on a leaf model.
pub struct Listener {
    predicate: Predicate,
    response: Response,
}

impl Listener {
    /// Pair a predicate with a response.
    pub fn new<P, R>(predicate: P, response: R) -> Self
    where
        P: Fn(&Disclosure) -> bool + 'static,
        R: FnMut(&Disclosure, f64) -> Vec<(String, Action)> + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            response: Box::new(response),
        }
    }

    /// Convenience constructor matching on the disclosure's `what`.
    pub fn on<R>(what: &str, response: R) -> Self
    where
        R: FnMut(&Disclosure, f64) -> Vec<(String, Action)> + 'static,
    {
        let what = what.to_string();
        Self::new(move |d: &Disclosure| d.what == what, response)
    }

    /// Does this listener match the disclosure?
    pub fn matches(&self, disclosure: &Disclosure) -> bool {
        (self.predicate)(disclosure)
    }

    /// Produce the instructions for a matched disclosure.
    pub fn respond(&mut self, disclosure: &Disclosure, t: f64) -> Vec<(String, Action)> {
        (self.response)(disclosure, t)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Listener")
    }
}

/// A listener response that could not be applied. Collected instead of
/// propagated: one mis-specified coupling must not corrupt the clock state
/// of unrelated subtrees.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferFailure {
    /// Leaf where the failure happened.
    pub location: String,
    /// `what` of the disclosure being handled.
    pub what: String,
    /// Human-readable cause.
    pub reason: String,
}

/// Tally of one disclosure's trip through a subtree's listeners.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferOutcome {
    /// Leaf locations where a listener matched and responded, one entry
    /// per firing.
    pub fired_at: Vec<String>,
    /// Responses that failed to apply.
    pub failures: Vec<OfferFailure>,
}

impl OfferOutcome {
    /// Number of listeners that fired.
    pub fn fired(&self) -> u64 {
        self.fired_at.len() as u64
    }

    /// Fold another outcome into this one.
    pub fn absorb(&mut self, other: OfferOutcome) {
        self.fired_at.extend(other.fired_at);
        self.failures.extend(other.failures);
    }
}
