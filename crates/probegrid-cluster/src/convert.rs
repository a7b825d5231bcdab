//! Conversions between wire types and domain types.

use probe_core::{FullTaskId, HostPort, LaunchSpec, ReservationBatch, SchedulingRequest, TaskSpec};

use crate::proto;

impl From<HostPort> for proto::HostPort {
    fn from(hp: HostPort) -> Self {
        Self {
            host: hp.host,
            port: u32::from(hp.port),
        }
    }
}

impl From<proto::HostPort> for HostPort {
    fn from(hp: proto::HostPort) -> Self {
        Self {
            host: hp.host,
            port: hp.port as u16,
        }
    }
}

impl From<TaskSpec> for proto::TaskSpec {
    fn from(task: TaskSpec) -> Self {
        Self {
            task_id: task.task_id,
            payload: task.payload,
            preference: if task.preference.is_empty() {
                None
            } else {
                Some(proto::TaskPreference {
                    nodes: task.preference,
                })
            },
        }
    }
}

impl From<proto::TaskSpec> for TaskSpec {
    fn from(task: proto::TaskSpec) -> Self {
        Self {
            task_id: task.task_id,
            payload: task.payload,
            preference: task.preference.map(|p| p.nodes).unwrap_or_default(),
        }
    }
}

impl From<proto::SchedulingRequest> for SchedulingRequest {
    fn from(req: proto::SchedulingRequest) -> Self {
        Self {
            app: req.app,
            tasks: req.tasks.into_iter().map(TaskSpec::from).collect(),
            probe_ratio: req.probe_ratio,
        }
    }
}

impl From<SchedulingRequest> for proto::SchedulingRequest {
    fn from(req: SchedulingRequest) -> Self {
        Self {
            app: req.app,
            tasks: req.tasks.into_iter().map(proto::TaskSpec::from).collect(),
            probe_ratio: req.probe_ratio,
        }
    }
}

impl From<ReservationBatch> for proto::ReservationBatch {
    fn from(batch: ReservationBatch) -> Self {
        Self {
            request_id: batch.request_id,
            app: batch.app,
            scheduler: Some(batch.scheduler.into()),
            num_reservations: batch.num_reservations,
            tasks: batch.tasks.into_iter().map(proto::TaskSpec::from).collect(),
        }
    }
}

impl From<LaunchSpec> for proto::LaunchSpec {
    fn from(spec: LaunchSpec) -> Self {
        Self {
            task_id: spec.task_id,
            payload: spec.payload,
        }
    }
}

impl From<proto::LaunchSpec> for LaunchSpec {
    fn from(spec: proto::LaunchSpec) -> Self {
        Self {
            task_id: spec.task_id,
            payload: spec.payload,
        }
    }
}

impl From<FullTaskId> for proto::FullTaskId {
    fn from(id: FullTaskId) -> Self {
        Self {
            request_id: id.request_id,
            task_id: id.task_id,
            app: id.app,
        }
    }
}

impl From<proto::FullTaskId> for FullTaskId {
    fn from(id: proto::FullTaskId) -> Self {
        Self {
            request_id: id.request_id,
            task_id: id.task_id,
            app: id.app,
        }
    }
}
