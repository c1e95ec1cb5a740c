//! Cable topology tracing.
//!
//! | Component | Role |
//! |-----------|------|
//! | [`Termination`] | Classified cable endpoint with a stable identity |
//! | [`CableGraph`] | Cable and patch-panel pairing edges |
//! | [`PathTracer`] | Shortest device-to-device path, searched from both ends |
//! | [`TreeTracer`] | Everything reachable from one interface, as a tree |
//!
//! All state (frontiers, visited sets, memoized cables) lives for one call
//! and is dropped with the tracer. Nothing here writes to the inventory.

mod graph;
mod path;
mod termination;
mod tree;

pub use graph::{CableGraph, Expansion};
pub use path::{MeetingPoint, PathHop, PathOutcome, PathTracer};
pub use termination::{Termination, TerminationKind};
pub use tree::{TreeMetadata, TreeNode, TreeOutcome, TreeTracer};
