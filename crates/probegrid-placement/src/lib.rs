//! probegrid-placement — probe-based task placement.
//!
//! A placer owns the placement plan for exactly one scheduling request. It
//! decides which workers receive reservation credits, then serves the
//! late-binding pulls: a worker that drains its queue calls back, and the
//! placer hands it the next unbound task (or nothing, once all tasks are
//! bound).
//!
//! # Components
//!
//! - **`placer`** — the `TaskPlacer` contract shared by both variants
//! - **`unconstrained`** — uniform random probing over the worker set
//! - **`constrained`** — per-task placement preferences with random fallback

pub mod constrained;
pub mod placer;
pub mod unconstrained;

pub use constrained::ConstrainedPlacer;
pub use placer::{probe_count, TaskPlacer};
pub use unconstrained::UnconstrainedPlacer;
