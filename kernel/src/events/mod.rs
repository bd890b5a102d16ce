//! Event, request, and disclosure types plus hierarchical addressing.
//!
//! - `path`: length-checked hierarchical addresses
//! - `types`: the Event/Request/Disclosure value types
//! - `log`: the optional kernel log

pub mod log;
pub mod path;
pub mod types;

pub use log::{KernelEvent, KernelLog};
pub use path::{Path, SIBLING_MARKER};
pub use types::{Args, Disclosure, Event, Request};
