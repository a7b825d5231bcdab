//! Task placer contract.
//!
//! A placer is created per request, asked once for its reservation plan,
//! then consulted by zero or more task pulls until every credit it issued
//! has been answered.

use std::collections::HashMap;

use probe_core::{HostPort, LaunchSpec, ReservationBatch, SchedulingRequest};

/// Per-request placement state machine.
///
/// `plan` is called exactly once, before any `assign_task`. Concurrent
/// callers must serialize access externally; the placer itself is a plain
/// state machine.
pub trait TaskPlacer: Send {
    /// Compute one reservation batch per probed worker.
    ///
    /// The returned map is also retained internally so later `assign_task`
    /// calls can be answered consistently.
    fn plan(
        &mut self,
        request: &SchedulingRequest,
        request_id: &str,
        workers: &[HostPort],
        scheduler: &HostPort,
    ) -> HashMap<HostPort, ReservationBatch>;

    /// Answer one reservation credit from `worker`.
    ///
    /// Returns at most one launch spec. A given task is returned at most
    /// once across all calls; a worker holding no remaining credits gets an
    /// empty reply that does not count as a response.
    fn assign_task(&mut self, worker: &HostPort) -> Vec<LaunchSpec>;

    /// True once every issued credit has been answered (with a task or an
    /// empty reply). The retirement signal: after this, the placer never
    /// produces another launch spec.
    fn all_responses_received(&self) -> bool;
}

/// Number of reservations for a request: `ceil(probe_ratio × task_count)`.
pub fn probe_count(probe_ratio: f64, task_count: usize) -> u32 {
    (probe_ratio * task_count as f64).ceil() as u32
}
