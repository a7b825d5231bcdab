//! Audit log — one structured event per request lifecycle step.
//!
//! Events carry the request ID and, where it applies, the worker address
//! and task ID. They are emitted on a dedicated tracing target so operators
//! can route them to their own sink. For one request, `arrived` precedes
//! any `node_monitor_launch_enqueue_task`; `assigned_task` and
//! `get_task_no_task` follow. No ordering holds across requests.

use probe_core::HostPort;
use tracing::{debug, info};

/// Tracing target for all audit events.
pub const AUDIT_TARGET: &str = "audit";

/// A request was admitted and assigned its ID.
pub fn arrived(request_id: &str, task_count: usize, scheduler: &HostPort) {
    info!(
        target: AUDIT_TARGET,
        event = "arrived",
        %request_id,
        task_count,
        host = %scheduler.host,
        port = scheduler.port,
    );
}

/// A reservation batch is about to be dispatched to a worker.
pub fn launch_enqueue_task(request_id: &str, worker: &HostPort) {
    debug!(
        target: AUDIT_TARGET,
        event = "node_monitor_launch_enqueue_task",
        %request_id,
        worker = %worker,
    );
}

/// A worker acknowledged its reservation batch.
pub fn complete_enqueue_task(request_id: &str, worker: &HostPort) {
    debug!(
        target: AUDIT_TARGET,
        event = "node_monitor_complete_enqueue_task",
        %request_id,
        worker = %worker,
    );
}

/// A task pull bound a task to a worker.
pub fn assigned_task(request_id: &str, task_id: &str, worker: &HostPort) {
    info!(
        target: AUDIT_TARGET,
        event = "assigned_task",
        %request_id,
        %task_id,
        worker = %worker,
    );
}

/// A task pull was answered with an empty reply.
pub fn get_task_no_task(request_id: &str) {
    info!(
        target: AUDIT_TARGET,
        event = "get_task_no_task",
        %request_id,
    );
}
