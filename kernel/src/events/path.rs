//! Hierarchical addressing for requests and disclosures.
//!
//! A `Path` is a non-empty, ordered list of location names read as "which
//! nested model must still forward this". The outermost segment names the
//! node currently holding the message; the final segment names the leaf
//! where the addressed actor lives.
//!
//! Paths are length-checked value types: `down_scale` on a fully resolved
//! path returns `None` instead of panicking, so routing code never has to
//! reason about an empty address.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved trailing segment marking a disclosure as sibling-scoped:
/// deliver to every other child of the origin's parent, not the whole tree.
pub const SIBLING_MARKER: &str = "*";

/// A non-empty hierarchical address.
///
/// # Example
/// ```
/// use multiscale_simulator_core_rs::Path;
///
/// let mut path = Path::new("leaf");
/// assert!(path.reached());
///
/// path.up_scale("root");
/// assert_eq!(path.len(), 2);
/// assert_eq!(path.first(), "root");
/// assert_eq!(path.target(), "leaf");
///
/// assert_eq!(path.down_scale(), Some("root".to_string()));
/// assert!(path.reached());
/// assert_eq!(path.down_scale(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Create a path with a single segment.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            segments: vec![location.into()],
        }
    }

    /// Build a path from explicit segments. Returns `None` when `segments`
    /// is empty (an empty address is unroutable by construction).
    pub fn from_segments(segments: Vec<String>) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Self { segments })
        }
    }

    /// Prepend an ancestor segment. Used when a message bubbles from a
    /// child model to its parent. Length increases by exactly one.
    pub fn up_scale(&mut self, location: impl Into<String>) {
        self.segments.insert(0, location.into());
    }

    /// Remove and return the outermost segment. Used when a parent routes
    /// the message to the matching child. Returns `None` once the path has
    /// `reached()` its target, leaving the path unchanged.
    pub fn down_scale(&mut self) -> Option<String> {
        if self.reached() {
            None
        } else {
            Some(self.segments.remove(0))
        }
    }

    /// True when exactly one segment remains: the message has arrived at
    /// the leaf that owns its target actor.
    pub fn reached(&self) -> bool {
        self.segments.len() == 1
    }

    /// Append the reserved sibling marker, scoping a disclosure to the
    /// children of the origin's immediate parent.
    pub fn sibling_scale(&mut self) {
        self.segments.push(SIBLING_MARKER.to_string());
    }

    /// True if the path carries the sibling marker.
    pub fn is_sibling_scoped(&self) -> bool {
        self.segments.last().map(String::as_str) == Some(SIBLING_MARKER)
    }

    /// The outermost segment: the node currently holding the message.
    pub fn first(&self) -> &str {
        &self.segments[0]
    }

    /// The innermost *location* segment (the sibling marker, when present,
    /// is an annotation, not a location).
    pub fn target(&self) -> &str {
        let mut iter = self.segments.iter().rev();
        match iter.next().map(String::as_str) {
            Some(SIBLING_MARKER) => iter
                .next()
                .map(String::as_str)
                .unwrap_or(SIBLING_MARKER),
            Some(seg) => seg,
            None => unreachable!("path is non-empty by construction"),
        }
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// A path is never empty; provided for completeness.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_path_is_reached() {
        let path = Path::new("leaf");
        assert!(path.reached());
        assert_eq!(path.len(), 1);
        assert_eq!(path.first(), "leaf");
        assert_eq!(path.target(), "leaf");
    }

    #[test]
    fn test_up_scale_then_down_scale_round_trip() {
        let mut path = Path::new("leaf");
        path.up_scale("region");
        path.up_scale("root");

        assert_eq!(path.len(), 3);
        assert_eq!(path.first(), "root");
        assert_eq!(path.target(), "leaf");

        assert_eq!(path.down_scale(), Some("root".to_string()));
        assert_eq!(path.down_scale(), Some("region".to_string()));
        assert!(path.reached());
        assert_eq!(path.down_scale(), None);
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn test_down_scale_is_total_on_reached_path() {
        let mut path = Path::new("leaf");
        assert_eq!(path.down_scale(), None);
        // Unchanged after the no-op.
        assert_eq!(path.first(), "leaf");
    }

    #[test]
    fn test_sibling_scale() {
        let mut path = Path::new("leaf");
        path.sibling_scale();
        path.up_scale("root");

        assert!(path.is_sibling_scoped());
        assert_eq!(path.len(), 3);
        // The marker is not a location.
        assert_eq!(path.target(), "leaf");
    }

    #[test]
    fn test_from_segments_rejects_empty() {
        assert!(Path::from_segments(vec![]).is_none());
        assert!(Path::from_segments(vec!["a".to_string()]).is_some());
    }

    #[test]
    fn test_display() {
        let mut path = Path::new("leaf");
        path.up_scale("root");
        assert_eq!(path.to_string(), "root/leaf");
    }
}
